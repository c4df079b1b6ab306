//! Store Module
//!
//! The sequence store that coordinates the row and index stores.
//!
//! ## Responsibilities
//! - Own the store directory, its lock and its manifest
//! - Deduplicated insert (index check → row append → index put)
//! - Consistent truncate (row truncate → index eviction)
//! - Aggregate size, sync and close

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{CasseqError, Result};
use crate::index::IndexStore;
use crate::lock::DirLock;
use crate::manifest::Manifest;
use crate::rows::RowStore;

/// An open sequence store
///
/// ## Concurrency Model: serialized writers, concurrent readers
///
/// - **Writes** (try_insert/insert/truncate): serialized by `write_lock`
///   - The duplicate check, the row append and the index put form one
///     critical section, so identical content can never claim two rows
///   - Truncate evicts index entries before any insert can run, so the
///     index never refers to an id >= count
///
/// - **Reads** (get_entry/get_id/has_*/count/size): no write_lock
///   - RowStore readers share its RwLock with appenders
///   - IndexStore readers run in redb read transactions
///
/// Share across threads with `Arc<Store>`.
pub struct Store {
    /// Store directory (`<data_dir>/<name>`)
    dir: PathBuf,

    /// Merged manifest as persisted on open
    manifest: Manifest,

    /// id → entry
    rows: RowStore,

    /// entry → id
    index: IndexStore,

    /// Serializes write operations (insert/truncate)
    write_lock: Mutex<()>,

    /// Exclusive directory lock (declared last: released after the files on drop)
    lock: DirLock,
}

impl Store {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const MANIFEST_FILENAME: &'static str = "manifest.json";
    const ROWS_FILENAME: &'static str = "rows";
    const INDEX_FILENAME: &'static str = "index";

    /// Open or create the store `<data_dir>/<name>`
    ///
    /// On startup:
    /// 1. Create the store directory
    /// 2. Lock it against other openers
    /// 3. Merge `config` into the manifest and validate the stride
    /// 4. Open (and repair) the row store
    /// 5. Open the index store
    pub fn open(data_dir: impl AsRef<Path>, name: &str, config: Config) -> Result<Self> {
        let dir = data_dir.as_ref().join(name);

        // Step 1: Create store directory if it doesn't exist
        fs::create_dir_all(&dir)?;

        // Step 2: Lock it (dropped, and so released, on any later failure)
        let lock = DirLock::acquire(&dir)?;

        // Step 3: Manifest
        let rows_path = dir.join(Self::ROWS_FILENAME);
        let (manifest, stride) = Self::load_manifest(&dir, &rows_path, &config)?;

        // Step 4: Row store
        let rows = RowStore::open_with(&rows_path, stride, config.sync_strategy)?;

        // Step 5: Index store
        let index = IndexStore::open(&dir.join(Self::INDEX_FILENAME))?;

        info!(
            dir = %dir.display(),
            stride,
            entries = rows.entry_count(),
            "store opened"
        );

        Ok(Self {
            dir,
            manifest,
            rows,
            index,
            write_lock: Mutex::new(()),
            lock,
        })
    }

    /// Close the store, releasing file handles and the directory lock
    ///
    /// Every step runs even if an earlier one fails; all failures are
    /// returned together as `CasseqError::Multiple`.
    pub fn close(mut self) -> Result<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.rows.close() {
            errors.push(e);
        }

        if let Err(e) = self.index.close() {
            errors.push(e);
        }

        if let Err(e) = self.lock.release() {
            errors.push(e);
        }

        info!(dir = %self.dir.display(), failures = errors.len(), "store closed");
        CasseqError::collect(errors)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Whether an entry with this id exists
    pub fn has_id(&self, entry_id: u64) -> bool {
        self.rows.has(entry_id)
    }

    /// Whether this exact content is stored
    pub fn has_entry(&self, entry: &[u8]) -> Result<bool> {
        self.index.has(entry)
    }

    /// The entry stored under `entry_id`
    pub fn get_entry(&self, entry_id: u64) -> Result<Vec<u8>> {
        self.rows.retrieve(entry_id)
    }

    /// The id this content was stored under
    pub fn get_id(&self, entry: &[u8]) -> Result<u64> {
        self.index.retrieve(entry)
    }

    /// Number of entries
    pub fn count(&self) -> u64 {
        self.rows.entry_count()
    }

    /// Bytes on disk across the row and index files
    pub fn size(&self) -> Result<u64> {
        Ok(self.rows.size()? + self.index.size()?)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert `entry` unless identical content is already stored.
    ///
    /// Returns `Ok(true)` if a new row was created, `Ok(false)` for a
    /// duplicate.
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Check the index for the content
    /// 3. Append to the row store (assigns the id)
    /// 4. Record content → id in the index, undoing the append on failure
    pub fn try_insert(&self, entry: &[u8]) -> Result<bool> {
        let _write_guard = self.write_lock.lock();

        if self.index.has(entry)? {
            return Ok(false);
        }

        let entry_id = self.rows.append(entry)?;

        if let Err(e) = self.index.put(entry, entry_id) {
            // Still under the write lock, so the new row is the last one
            warn!(entry_id, error = %e, "index put failed, rolling back row append");
            if let Err(rollback) = self.rows.truncate(entry_id) {
                return Err(CasseqError::Multiple(vec![e, rollback]));
            }
            return Err(e);
        }

        Ok(true)
    }

    /// Insert `entry`, failing with `Duplicate` if it is already stored
    pub fn insert(&self, entry: &[u8]) -> Result<()> {
        if self.try_insert(entry)? {
            Ok(())
        } else {
            Err(CasseqError::Duplicate)
        }
    }

    /// Remove every entry with id >= `new_count`, rows and index alike
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Truncate the row store, collecting the removed entries
    /// 3. fsync the row file
    /// 4. Evict the removed entries from the index
    ///
    /// The row file is synced before the eviction commits, so a crash cannot
    /// bring back rows the index no longer knows. Eviction still runs if the
    /// sync fails; the sync error is then returned.
    pub fn truncate(&self, new_count: u64) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        let removed = self.rows.truncate(new_count)?;
        if removed.is_empty() {
            return Ok(());
        }

        let synced = self.rows.sync();
        self.index.delete_all(&removed)?;

        synced
    }

    /// Flush the row file to stable storage
    ///
    /// Index writes are durable at commit and need no flush.
    pub fn sync(&self) -> Result<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.rows.sync() {
            errors.push(e);
        }

        CasseqError::collect(errors)
    }

    /// Write the row table (`| entryId | hex(bytes)`) to `out`
    pub fn dump_rows<W: Write>(&self, out: &mut W) -> Result<()> {
        self.rows.dump(out)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Bytes per entry
    pub fn stride(&self) -> u64 {
        self.rows.stride()
    }

    /// Manifest as merged on open
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// The underlying row store
    pub fn rows(&self) -> &RowStore {
        &self.rows
    }

    /// The underlying index store
    pub fn index(&self) -> &IndexStore {
        &self.index
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Merge `config` into the manifest, refusing to restride existing rows.
    /// Nothing is written unless the merged manifest is valid.
    fn load_manifest(dir: &Path, rows_path: &Path, config: &Config) -> Result<(Manifest, u64)> {
        let manifest_path = dir.join(Self::MANIFEST_FILENAME);
        let existed = manifest_path.exists();
        let mut manifest = Manifest::load(&manifest_path)?;

        // Checked before merging so a rejected stride is never persisted
        if let (Some(old), Some(new)) = (manifest.stride, config.stride) {
            let has_rows = fs::metadata(rows_path).map(|m| m.len() > 0).unwrap_or(false);
            if old != new && has_rows {
                return Err(CasseqError::Config(format!(
                    "stride is {} for existing rows, cannot change it to {}",
                    old, new
                )));
            }
        }

        let changed = manifest.merge(config);
        let stride = manifest.require_stride()?;

        if changed || !existed {
            manifest.save(&manifest_path)?;
        }

        Ok((manifest, stride))
    }
}
