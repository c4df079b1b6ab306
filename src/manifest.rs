//! Store Manifest
//!
//! The persisted configuration record at `<store>/manifest.json`.
//!
//! ## Format
//! ```json
//! { "stride": 32 }
//! ```
//!
//! Keys other than `stride` are preserved verbatim across opens, so a
//! manifest shared with other tooling is never stripped.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::{CasseqError, Result};

/// Persisted store configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Bytes per entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stride: Option<u64>,

    /// Keys this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    /// Read a manifest from disk; a missing file is an empty manifest.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_json::from_str(&content)?)
    }

    /// Overlay the persisted fields of `config`. Values present in `config`
    /// win; absent ones keep what was stored.
    ///
    /// Returns whether anything changed.
    pub fn merge(&mut self, config: &Config) -> bool {
        match config.stride {
            Some(stride) if self.stride != Some(stride) => {
                self.stride = Some(stride);
                true
            }
            _ => false,
        }
    }

    /// The configured stride, validated.
    pub fn require_stride(&self) -> Result<u64> {
        match self.stride {
            None => Err(CasseqError::MissingConfig(
                "a nonzero \"stride\" is required for a new store".to_string(),
            )),
            Some(0) => Err(CasseqError::Config("stride must be nonzero".to_string())),
            Some(stride) => Ok(stride),
        }
    }

    /// Write via a temp file and rename so a crash never leaves a torn manifest.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp_path = path.with_extension("json.tmp");

        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}
