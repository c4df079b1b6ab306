//! Row file repair
//!
//! A crash in the middle of an append leaves a partial record at the end of
//! the file. Repair cuts it off so the file is an exact multiple of the
//! stride again.

use std::fs::File;

use tracing::warn;

use crate::error::Result;

/// Outcome of repairing a row file at open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairReport {
    /// Whole records present after repair
    pub entries: u64,

    /// Bytes of a torn trailing record that were discarded
    pub bytes_discarded: u64,
}

impl RepairReport {
    /// Whether repair had to modify the file
    pub fn was_truncated(&self) -> bool {
        self.bytes_discarded > 0
    }
}

/// Truncate a trailing partial record and recompute the entry count.
///
/// The truncation is fsynced before returning.
pub(super) fn repair(file: &File, stride: u64) -> Result<RepairReport> {
    let size = file.metadata()?.len();
    let overflow = size % stride;

    if overflow != 0 {
        warn!(
            size,
            stride,
            discarded = overflow,
            "row file ends in a partial record, truncating"
        );
        file.set_len(size - overflow)?;
        file.sync_all()?;
    }

    let size = file.metadata()?.len();

    Ok(RepairReport {
        entries: size / stride,
        bytes_discarded: overflow,
    })
}
