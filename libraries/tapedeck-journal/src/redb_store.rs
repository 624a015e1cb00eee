//! File-backed durable store using redb

use crate::error::{JournalError, Result};
use crate::store::DurableStore;
use redb::{Database, ReadableTable, TableDefinition, TableError};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

const BLOBS: TableDefinition<&str, &[u8]> = TableDefinition::new("blobs");

/// redb-backed blob store
///
/// Staged blobs live in memory until `commit`, which writes all of them in a
/// single write transaction. A failed commit keeps the staged blobs so the
/// next commit retries them.
pub struct RedbStore {
    db: Database,
    staged: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl RedbStore {
    /// Open (or create) a store at `path`
    ///
    /// Parent directories are created if missing.
    ///
    /// # Errors
    /// Returns an error if the directory or database file cannot be created
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| JournalError::store(format!("{}: {e}", parent.display())))?;
        }

        let db = Database::create(path).map_err(|e| JournalError::store(e.to_string()))?;
        tracing::debug!(path = %path.display(), "Opened journal store");

        Ok(Self {
            db,
            staged: Mutex::new(BTreeMap::new()),
        })
    }

    fn read_committed(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| JournalError::store(e.to_string()))?;

        let table = match txn.open_table(BLOBS) {
            Ok(table) => table,
            // Nothing has ever been committed
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(JournalError::store(e.to_string())),
        };

        let value = table
            .get(key)
            .map_err(|e| JournalError::store(e.to_string()))?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }
}

impl DurableStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(blob) = self
            .staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Ok(Some(blob.clone()));
        }
        self.read_committed(key)
    }

    fn set_blob(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let mut staged = self.staged.lock().unwrap_or_else(PoisonError::into_inner);
        if staged.is_empty() {
            return Ok(());
        }

        let txn = self
            .db
            .begin_write()
            .map_err(|e| JournalError::store(e.to_string()))?;
        {
            let mut table = txn
                .open_table(BLOBS)
                .map_err(|e| JournalError::store(e.to_string()))?;
            for (key, bytes) in staged.iter() {
                table
                    .insert(key.as_str(), bytes.as_slice())
                    .map_err(|e| JournalError::store(e.to_string()))?;
            }
        }
        txn.commit().map_err(|e| JournalError::store(e.to_string()))?;

        staged.clear();
        Ok(())
    }
}
