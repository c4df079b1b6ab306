//! Error types for casseq
//!
//! Provides a unified error type for all operations.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using CasseqError
pub type Result<T> = std::result::Result<T, CasseqError>;

/// Unified error type for casseq operations
#[derive(Debug, Error)]
pub enum CasseqError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Row Store Errors
    // -------------------------------------------------------------------------
    #[error("Store is closed")]
    Closed,

    #[error("Entry id {id} out of bounds (count = {count})")]
    OutOfBounds { id: u64, count: u64 },

    #[error("Entry size mismatch: want size={expected}, have size={actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    // -------------------------------------------------------------------------
    // Index Store Errors
    // -------------------------------------------------------------------------
    #[error("Index not initialized")]
    NotInitialized,

    #[error("Unknown entry")]
    UnknownEntry,

    #[error("Index engine error: {0}")]
    Index(#[from] redb::Error),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Entry id {0} exceeds the encodable range")]
    IdOverflow(u64),

    #[error("Malformed entry id: {0}")]
    Codec(String),

    // -------------------------------------------------------------------------
    // Sequence Store Errors
    // -------------------------------------------------------------------------
    #[error("Entry already exists in store")]
    Duplicate,

    #[error("Store directory is locked by another opener: {}", .0.display())]
    LockHeld(PathBuf),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Aggregated Errors
    // -------------------------------------------------------------------------
    #[error("{}", ErrorList(.0))]
    Multiple(Vec<CasseqError>),
}

impl CasseqError {
    /// Fold a list of collected failures into a result.
    ///
    /// An empty list is success; anything else becomes `Multiple`.
    pub fn collect(errors: Vec<CasseqError>) -> Result<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CasseqError::Multiple(errors))
        }
    }

    /// The individual failures carried by this error.
    ///
    /// A single error yields a one-element slice.
    pub fn errors(&self) -> &[CasseqError] {
        match self {
            CasseqError::Multiple(errors) => errors,
            other => std::slice::from_ref(other),
        }
    }
}

/// Display adapter: `2 errors: [first; second]`
struct ErrorList<'a>(&'a [CasseqError]);

impl fmt::Display for ErrorList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s): [", self.0.len())?;
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        f.write_str("]")
    }
}

// =============================================================================
// redb conversions
// =============================================================================

macro_rules! impl_from_redb {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CasseqError {
                fn from(err: $ty) -> Self {
                    CasseqError::Index(err.into())
                }
            }
        )*
    };
}

impl_from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);
