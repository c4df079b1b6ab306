//! # casseq
//!
//! An embedded, append-only sequence store with:
//! - Fixed-stride records addressed by dense, zero-based ids
//! - Content-addressed deduplication (the same entry is stored once)
//! - Crash repair of a torn trailing record
//! - Truncation that keeps rows and index in agreement
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                              │
//! │        (dir lock, manifest, serialized insert/truncate)     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  RowStore   │          │ IndexStore  │
//!   │ id → entry  │          │ entry → id  │
//!   │  (rows)     │          │  (redb)     │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   codec     │
//!                           │ (id varint) │
//!                           └─────────────┘
//! ```
//!
//! ## On-disk Layout
//!
//! ```text
//! {data_dir}/{name}/
//!   ├── LOCK            (directory lock)
//!   ├── manifest.json   (stride + retained keys)
//!   ├── rows            (entry_count * stride bytes)
//!   └── index           (redb database)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use casseq::{Config, Store};
//!
//! let store = Store::open("/tmp/seqs", "hashes", Config::with_stride(4)).unwrap();
//! assert!(store.try_insert(&[1, 2, 3, 4]).unwrap());
//! assert!(!store.try_insert(&[1, 2, 3, 4]).unwrap());
//! assert_eq!(store.get_id(&[1, 2, 3, 4]).unwrap(), 0);
//! store.close().unwrap();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod manifest;
pub mod lock;

pub mod codec;
pub mod rows;
pub mod index;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CasseqError, Result};
pub use config::{Config, SyncStrategy};
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of casseq
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
