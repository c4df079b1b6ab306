//! Row Store Module
//!
//! Append-only table of fixed-stride records in a single file.
//!
//! ## Responsibilities
//! - Assign dense, zero-based entry ids in append order
//! - Point reads by id
//! - Physical truncation of the highest ids
//! - Crash repair of a torn trailing record
//!
//! ## File Format
//! ```text
//! ┌──────────────┬──────────────┬──────────────┬─────┐
//! │ Entry 0      │ Entry 1      │ Entry 2      │ ... │
//! │ stride bytes │ stride bytes │ stride bytes │     │
//! └──────────────┴──────────────┴──────────────┴─────┘
//! offset(id) = id * stride      (no header, no checksums)
//! ```

mod repair;
mod store;

pub use repair::RepairReport;
pub use store::RowStore;
