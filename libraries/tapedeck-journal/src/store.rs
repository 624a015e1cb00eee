//! Durable key-value store contract
//!
//! Mirrors the shape of a flash key-value store: blobs are staged with
//! `set_blob` and only become durable after `commit`. The journal always
//! calls both back to back while holding its own lock.

use crate::error::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Durable blob store
pub trait DurableStore: Send + Sync {
    /// Read a blob (staged value wins over the committed one)
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stage a blob under `key`
    fn set_blob(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Make every staged blob durable
    fn commit(&self) -> Result<()>;
}

impl<T: DurableStore + ?Sized> DurableStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set_blob(&self, key: &str, bytes: &[u8]) -> Result<()> {
        (**self).set_blob(key, bytes)
    }

    fn commit(&self) -> Result<()> {
        (**self).commit()
    }
}

/// In-memory store
///
/// Keeps staged and committed blobs apart so tests can observe exactly what
/// would survive a power cut.
#[derive(Debug, Default)]
pub struct MemoryStore {
    staged: Mutex<HashMap<String, Vec<u8>>>,
    committed: Mutex<HashMap<String, Vec<u8>>>,
    commits: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Blob that would survive a restart
    pub fn committed_blob(&self, key: &str) -> Option<Vec<u8>> {
        self.committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Number of successful commits so far
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(blob) = self
            .staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Ok(Some(blob.clone()));
        }
        Ok(self.committed_blob(key))
    }

    fn set_blob(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let staged: Vec<(String, Vec<u8>)> = self
            .staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();
        self.committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(staged);
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
