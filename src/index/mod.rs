//! Index Store Module
//!
//! Persistent mapping from entry content to entry id.
//!
//! ## Responsibilities
//! - Existence checks for deduplicated insert
//! - Reverse lookup (content → id)
//! - Eviction of truncated entries
//!
//! Backed by a single redb file holding one table, `entryIdByValue`.
//! Keys are the full entry bytes; values are ids in the
//! [`codec`](crate::codec) format.

mod store;

pub use store::IndexStore;
