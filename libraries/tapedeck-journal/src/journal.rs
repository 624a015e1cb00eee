//! Persistent circular journal

use crate::clock::Clock;
use crate::entry::{ExportedEntry, JournalEntry};
use crate::error::{JournalError, Result};
use crate::ring::RingState;
use crate::store::DurableStore;
use chrono::Local;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tapedeck_core::{Command, TrackId};

/// Key the ring is stored under
const STORE_KEY: &str = "journal.ring";

/// Durable, bounded, FIFO log of accepted commands
///
/// Every operation runs under one mutex. Mutations write the whole ring
/// through to the store and commit before the lock is released.
pub struct CircularJournal {
    ring: Mutex<RingState>,
    store: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
}

impl CircularJournal {
    /// Load the journal from `store`, or create an empty one
    ///
    /// A persisted ring with a different capacity is re-laid out to
    /// `capacity`. A blob that cannot be decoded is logged and replaced by an
    /// empty ring.
    ///
    /// # Errors
    /// Returns an error for a zero capacity or if the store cannot be read.
    /// Failing to persist the freshly initialised ring is only logged.
    pub fn open(
        store: Arc<dyn DurableStore>,
        capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let fresh = RingState::new(capacity)?;

        let (ring, dirty) = match store.get(STORE_KEY)? {
            None => {
                tracing::info!(capacity, "No journal found, starting empty");
                (fresh, true)
            }
            Some(blob) => match RingState::from_blob(&blob) {
                Ok(ring) if ring.capacity() == capacity => (ring, false),
                Ok(ring) => {
                    tracing::warn!(
                        from = ring.capacity(),
                        to = capacity,
                        "Journal capacity changed, keeping newest entries"
                    );
                    (ring.relayout(capacity)?, true)
                }
                Err(e) => {
                    tracing::error!("Discarding unreadable journal: {}", e);
                    (fresh, true)
                }
            },
        };

        let journal = Self {
            ring: Mutex::new(ring),
            store,
            clock,
        };

        if dirty {
            let ring = journal.lock();
            if let Err(e) = journal.persist(&ring) {
                tracing::warn!("Initial journal state not persisted: {}", e);
            }
        }

        match journal.to_json() {
            Ok(json) => tracing::info!(entries = journal.len(), "Journal loaded: {}", json),
            Err(e) => tracing::warn!("Journal export failed: {}", e),
        }

        Ok(journal)
    }

    fn lock(&self) -> MutexGuard<'_, RingState> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, ring: &RingState) -> Result<()> {
        let blob = ring.to_blob()?;
        self.store
            .set_blob(STORE_KEY, &blob)
            .and_then(|()| self.store.commit())
            .map_err(|e| JournalError::Persistence(e.to_string()))
    }

    /// Record `event` against `song_id`, stamped with the current time
    ///
    /// When full, the oldest entry is overwritten.
    ///
    /// # Errors
    /// Returns `Persistence` if the commit fails. The entry is still in the
    /// in-memory ring.
    pub fn append(&self, event: Command, song_id: TrackId) -> Result<()> {
        let entry = JournalEntry::new(event, song_id, self.clock.now());
        let mut ring = self.lock();
        ring.push(entry);
        self.persist(&ring)
    }

    /// Pop the oldest entry
    ///
    /// A failed commit is logged and the entry is still returned.
    pub fn read_oldest(&self) -> Result<Option<JournalEntry>> {
        let mut ring = self.lock();
        let Some(entry) = ring.pop_front() else {
            return Ok(None);
        };
        if let Err(e) = self.persist(&ring) {
            tracing::warn!("Journal pop not persisted: {}", e);
        }
        Ok(Some(entry))
    }

    /// Most recent entry, without removing it
    pub fn peek_latest(&self) -> Option<JournalEntry> {
        self.lock().latest()
    }

    /// Live entries, oldest first
    pub fn snapshot(&self) -> Vec<JournalEntry> {
        self.lock().iter().copied().collect()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the journal is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Slot count
    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Copy of the full ring, stale slots included
    pub fn ring_state(&self) -> RingState {
        self.lock().clone()
    }

    /// Erase every entry and persist the empty ring
    ///
    /// # Errors
    /// Returns `Persistence` if the commit fails
    pub fn clear(&self) -> Result<()> {
        let mut ring = self.lock();
        ring.clear();
        self.persist(&ring)
    }

    /// Pop every entry, oldest first, committing once at the end
    ///
    /// # Errors
    /// Returns `Persistence` if the commit fails. The ring is empty either way.
    pub fn drain(&self) -> Result<Vec<JournalEntry>> {
        let mut ring = self.lock();
        let entries: Vec<JournalEntry> = std::iter::from_fn(|| ring.pop_front()).collect();
        if !entries.is_empty() {
            self.persist(&ring)?;
        }
        Ok(entries)
    }

    /// Export view in local time, oldest first
    pub fn export(&self) -> Vec<ExportedEntry> {
        self.lock().iter().map(|e| e.export_in(&Local)).collect()
    }

    /// Export as a JSON array
    ///
    /// # Errors
    /// Returns a serialization error if encoding fails
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.export())?)
    }
}

impl std::fmt::Debug for CircularJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ring = self.lock();
        f.debug_struct("CircularJournal")
            .field("capacity", &ring.capacity())
            .field("len", &ring.len())
            .finish_non_exhaustive()
    }
}
