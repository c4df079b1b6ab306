//! Index Store implementation

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use redb::{Database, ReadableDatabase, ReadableTableMetadata, TableDefinition, TableError};
use tracing::debug;

use crate::codec::{decode_entry_id, encode_entry_id};
use crate::error::{CasseqError, Result};

/// Entry content → encoded entry id
const ID_BY_VALUE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("entryIdByValue");

/// Content-addressed index over a redb database
///
/// ## Concurrency:
/// - redb serializes write transactions and lets readers run alongside them
/// - `db` RwLock only guards the handle against `close()`
pub struct IndexStore {
    /// Database file path
    path: PathBuf,

    /// redb handle, `None` once closed
    db: RwLock<Option<Database>>,
}

impl IndexStore {
    /// Open or create the index file
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)?;

        debug!(path = %path.display(), "index store opened");

        Ok(Self {
            path: path.to_path_buf(),
            db: RwLock::new(Some(db)),
        })
    }

    /// Look up the id stored for `key`.
    ///
    /// Fails with `NotInitialized` before the first write and with
    /// `UnknownEntry` when the key is absent.
    pub fn retrieve(&self, key: &[u8]) -> Result<u64> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(CasseqError::Closed)?;

        let txn = db.begin_read()?;
        let table = match txn.open_table(ID_BY_VALUE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Err(CasseqError::NotInitialized),
            Err(e) => return Err(e.into()),
        };

        let value = table.get(key)?.ok_or(CasseqError::UnknownEntry)?;
        let (entry_id, _) = decode_entry_id(value.value())?;

        Ok(entry_id)
    }

    /// Whether `key` has a mapping. A never-written index has none.
    pub fn has(&self, key: &[u8]) -> Result<bool> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(CasseqError::Closed)?;

        let txn = db.begin_read()?;
        let table = match txn.open_table(ID_BY_VALUE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        Ok(table.get(key)?.is_some())
    }

    /// Map `key` to `entry_id`, replacing any previous mapping.
    ///
    /// Durable once this returns.
    pub fn put(&self, key: &[u8], entry_id: u64) -> Result<()> {
        let value = encode_entry_id(entry_id)?;

        let guard = self.db.read();
        let db = guard.as_ref().ok_or(CasseqError::Closed)?;

        let txn = db.begin_write()?;
        {
            let mut table = txn.open_table(ID_BY_VALUE)?;
            table.insert(key, value.as_slice())?;
        }
        txn.commit()?;

        Ok(())
    }

    /// Remove every key in one transaction. Absent keys are skipped.
    pub fn delete_all<I, K>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(CasseqError::Closed)?;

        let txn = db.begin_write()?;
        {
            let mut table = txn.open_table(ID_BY_VALUE)?;
            for key in keys {
                table.remove(key.as_ref())?;
            }
        }
        txn.commit()?;

        Ok(())
    }

    /// Number of mappings
    pub fn len(&self) -> Result<u64> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(CasseqError::Closed)?;

        let txn = db.begin_read()?;
        match txn.open_table(ID_BY_VALUE) {
            Ok(table) => Ok(table.len()?),
            Err(TableError::TableDoesNotExist(_)) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the index holds no mappings
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// On-disk footprint in bytes
    pub fn size(&self) -> Result<u64> {
        let guard = self.db.read();
        guard.as_ref().ok_or(CasseqError::Closed)?;

        Ok(fs::metadata(&self.path)?.len())
    }

    /// Close the database. Later calls fail with `Closed`.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.db.write();
        match guard.take() {
            Some(db) => {
                drop(db);
                Ok(())
            }
            None => Err(CasseqError::Closed),
        }
    }

    /// Path of the index file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
