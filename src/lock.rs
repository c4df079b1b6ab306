//! Directory Lock
//!
//! Exclusive advisory lock on `<store>/LOCK`, held for the lifetime of an
//! open store. This is the only cross-process exclusion; it says nothing
//! about races between threads sharing one `Store`.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{CasseqError, Result};

/// Held lock on a store directory. Released on `release()` or drop.
#[derive(Debug)]
pub struct DirLock {
    path: PathBuf,
    file: Option<File>,
}

impl DirLock {
    pub const FILENAME: &'static str = "LOCK";

    /// Acquire the lock without blocking.
    ///
    /// Fails with `LockHeld` if another handle (in this or another process)
    /// already holds it.
    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(Self::FILENAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        if let Err(e) = file.try_lock_exclusive() {
            return Err(if is_contended(&e) {
                CasseqError::LockHeld(path)
            } else {
                CasseqError::Io(e)
            });
        }

        debug!(path = %path.display(), "acquired store lock");
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock. Calling it twice is a no-op.
    pub fn release(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            FileExt::unlock(&file)?;
            debug!(path = %self.path.display(), "released store lock");
        }
        Ok(())
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        // Closing the descriptor drops the lock as well
        let _ = self.release();
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
