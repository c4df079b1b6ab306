//! Row Store implementation
//!
//! Fixed-stride records in one append-mode file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::SyncStrategy;
use crate::error::{CasseqError, Result};

use super::repair::{repair, RepairReport};

/// Append-only fixed-stride table
///
/// ## Concurrency:
/// - `file`: RwLock. Append, retrieve, size and sync take it shared;
///   truncate and close take it exclusive, so nobody observes a file
///   mid-truncation. `None` once closed.
/// - `append_lock`: serializes appenders. The id is read, the bytes are
///   written and the new count is published under this one lock, so id
///   order is always byte order.
/// - `entry_count`: published after the bytes are on the file; any id
///   below it is readable.
pub struct RowStore {
    /// Backing file path
    path: PathBuf,

    /// Bytes per record
    stride: u64,

    /// When to fsync after appends
    sync_strategy: SyncStrategy,

    /// Open file handle (shared: append/read, exclusive: truncate/close)
    file: RwLock<Option<File>>,

    /// Serializes id assignment together with the write
    append_lock: Mutex<()>,

    /// Number of whole records in the file
    entry_count: AtomicU64,

    /// What repair did at open
    repair_report: RepairReport,
}

impl RowStore {
    /// Open or create a row file, repairing a torn tail.
    pub fn open(path: &Path, stride: u64) -> Result<Self> {
        Self::open_with(path, stride, SyncStrategy::Manual)
    }

    /// Open with an explicit sync strategy
    pub fn open_with(path: &Path, stride: u64, sync_strategy: SyncStrategy) -> Result<Self> {
        if stride == 0 {
            return Err(CasseqError::Config("stride must be nonzero".to_string()));
        }

        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let repair_report = repair(&file, stride)?;

        info!(
            path = %path.display(),
            entries = repair_report.entries,
            "row store opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            stride,
            sync_strategy,
            file: RwLock::new(Some(file)),
            append_lock: Mutex::new(()),
            entry_count: AtomicU64::new(repair_report.entries),
            repair_report,
        })
    }

    /// Append a record and return its id.
    ///
    /// Only flushes to stable storage under `SyncStrategy::EveryAppend`;
    /// otherwise call `sync()` before relying on durability.
    pub fn append(&self, blob: &[u8]) -> Result<u64> {
        if blob.len() as u64 != self.stride {
            return Err(CasseqError::SizeMismatch {
                expected: self.stride,
                actual: blob.len() as u64,
            });
        }

        // Shared lock keeps truncate out
        let guard = self.file.read();
        let file = guard.as_ref().ok_or(CasseqError::Closed)?;

        let _append = self.append_lock.lock();
        let entry_id = self.entry_count.load(Ordering::Acquire);

        if let Err(e) = self.write_record(file, blob) {
            self.cut_back(file, entry_id);
            return Err(e.into());
        }

        self.entry_count.store(entry_id + 1, Ordering::Release);
        Ok(entry_id)
    }

    /// Read the record stored under `entry_id`
    pub fn retrieve(&self, entry_id: u64) -> Result<Vec<u8>> {
        let guard = self.file.read();
        let file = guard.as_ref().ok_or(CasseqError::Closed)?;

        let count = self.entry_count.load(Ordering::Acquire);
        if entry_id >= count {
            return Err(CasseqError::OutOfBounds {
                id: entry_id,
                count,
            });
        }

        let mut blob = vec![0u8; self.stride as usize];
        read_at(file, &mut blob, entry_id * self.stride)?;

        Ok(blob)
    }

    /// Whether `entry_id` currently exists
    pub fn has(&self, entry_id: u64) -> bool {
        entry_id < self.entry_count()
    }

    /// Number of records
    pub fn entry_count(&self) -> u64 {
        self.entry_count.load(Ordering::Acquire)
    }

    /// Drop every record with id >= `new_count`.
    ///
    /// Returns the removed records in ascending id order. A `new_count` at or
    /// beyond the current count is a no-op. The shrink is not fsynced.
    pub fn truncate(&self, new_count: u64) -> Result<Vec<Vec<u8>>> {
        let guard = self.file.write();
        let file = guard.as_ref().ok_or(CasseqError::Closed)?;

        let old_count = self.entry_count.load(Ordering::Acquire);
        if old_count <= new_count {
            return Ok(Vec::new());
        }

        debug!(old_count, new_count, "truncating row store");

        // Records [new_count, old_count) are contiguous: one read, then split
        // at each id's own offset
        let start = new_count * self.stride;
        let mut removed = vec![0u8; ((old_count - new_count) * self.stride) as usize];
        read_at(file, &mut removed, start)?;

        file.set_len(start)?;
        self.entry_count.store(new_count, Ordering::Release);

        Ok(removed
            .chunks_exact(self.stride as usize)
            .map(<[u8]>::to_vec)
            .collect())
    }

    /// Current file size in bytes
    pub fn size(&self) -> Result<u64> {
        let guard = self.file.read();
        let file = guard.as_ref().ok_or(CasseqError::Closed)?;

        Ok(file.metadata()?.len())
    }

    /// Flush all written records to stable storage
    pub fn sync(&self) -> Result<()> {
        let guard = self.file.read();
        let file = guard.as_ref().ok_or(CasseqError::Closed)?;

        file.sync_all()?;
        Ok(())
    }

    /// Release the file handle. Later calls fail with `Closed`.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.file.write();
        match guard.take() {
            Some(file) => {
                drop(file);
                Ok(())
            }
            None => Err(CasseqError::Closed),
        }
    }

    /// Whether `close()` has been called
    pub fn is_closed(&self) -> bool {
        self.file.read().is_none()
    }

    /// Write every record as `| entryId | hex(bytes)` lines
    pub fn dump<W: Write>(&self, out: &mut W) -> Result<()> {
        let guard = self.file.read();
        let file = guard.as_ref().ok_or(CasseqError::Closed)?;

        writeln!(out, "|  entryId | hex(bytes)")?;
        writeln!(
            out,
            "|----------|-{}",
            "-".repeat(self.stride as usize * 2 + 2)
        )?;

        let mut blob = vec![0u8; self.stride as usize];
        for entry_id in 0..self.entry_count() {
            read_at(file, &mut blob, entry_id * self.stride)?;
            writeln!(out, "| {:08} | 0x{}", entry_id, to_hex(&blob))?;
        }

        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Path of the row file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes per record
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// What repair did when the file was opened
    pub fn repair_report(&self) -> RepairReport {
        self.repair_report
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn write_record(&self, file: &File, blob: &[u8]) -> io::Result<()> {
        let mut writer = file;
        writer.write_all(blob)?;

        if self.sync_strategy == SyncStrategy::EveryAppend {
            file.sync_data()?;
        }

        Ok(())
    }

    /// Drop any bytes a failed append left past the last whole record
    fn cut_back(&self, file: &File, entry_count: u64) {
        if let Err(e) = file.set_len(entry_count * self.stride) {
            warn!(error = %e, entry_count, "failed to discard partial append");
        }
    }
}

#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;

    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ))
            }
            Ok(n) => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{:02x}", b);
        s
    })
}
