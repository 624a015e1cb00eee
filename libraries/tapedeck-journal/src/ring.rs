//! Fixed-capacity ring state
//!
//! This is the exact value written to the durable store: head, tail, count and
//! every slot, including stale ones. Reloading it reproduces the ring as it was.

use crate::entry::JournalEntry;
use crate::error::{JournalError, Result};
use serde::{Deserialize, Serialize};

/// Ring of journal slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingState {
    head: usize,
    tail: usize,
    count: usize,
    slots: Vec<JournalEntry>,
}

impl RingState {
    /// Zero-initialised ring with `capacity` slots
    ///
    /// # Errors
    /// Returns `InvalidCapacity` for a zero capacity
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(JournalError::InvalidCapacity(capacity));
        }
        Ok(Self {
            head: 0,
            tail: 0,
            count: 0,
            slots: vec![JournalEntry::default(); capacity],
        })
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the ring holds no entries
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Next write position
    pub fn head(&self) -> usize {
        self.head
    }

    /// Oldest live position
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Write at head, overwriting the oldest entry when full
    pub fn push(&mut self, entry: JournalEntry) {
        let capacity = self.capacity();
        self.slots[self.head] = entry;
        self.head = (self.head + 1) % capacity;

        if self.count == capacity {
            self.tail = (self.tail + 1) % capacity;
        } else {
            self.count += 1;
        }
    }

    /// Remove and return the oldest entry
    pub fn pop_front(&mut self) -> Option<JournalEntry> {
        if self.count == 0 {
            return None;
        }
        let entry = self.slots[self.tail];
        self.tail = (self.tail + 1) % self.capacity();
        self.count -= 1;
        Some(entry)
    }

    /// Most recently written entry
    pub fn latest(&self) -> Option<JournalEntry> {
        if self.count == 0 {
            return None;
        }
        let capacity = self.capacity();
        Some(self.slots[(self.head + capacity - 1) % capacity])
    }

    /// Live entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &JournalEntry> + '_ {
        let capacity = self.capacity();
        (0..self.count).map(move |offset| &self.slots[(self.tail + offset) % capacity])
    }

    /// Drop every entry and zero the slots
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.count = 0;
        self.slots.fill(JournalEntry::default());
    }

    /// Check that a decoded ring is internally consistent
    ///
    /// # Errors
    /// Returns `Corrupt` when a position or the count is out of range, or the
    /// head does not follow from tail and count
    pub fn validate(&self) -> Result<()> {
        let capacity = self.capacity();
        if capacity == 0 {
            return Err(JournalError::Corrupt("ring has no slots".to_string()));
        }
        if self.head >= capacity || self.tail >= capacity || self.count > capacity {
            return Err(JournalError::Corrupt(format!(
                "head {} tail {} count {} out of range for capacity {capacity}",
                self.head, self.tail, self.count
            )));
        }
        if (self.tail + self.count) % capacity != self.head {
            return Err(JournalError::Corrupt(format!(
                "head {} does not follow tail {} and count {}",
                self.head, self.tail, self.count
            )));
        }
        Ok(())
    }

    /// Copy into a ring of a different capacity
    ///
    /// Keeps the newest `min(len, capacity)` entries in their original order.
    ///
    /// # Errors
    /// Returns `InvalidCapacity` for a zero capacity
    pub fn relayout(&self, capacity: usize) -> Result<Self> {
        let mut ring = Self::new(capacity)?;
        let skip = self.count.saturating_sub(capacity);
        for entry in self.iter().skip(skip) {
            ring.push(*entry);
        }
        Ok(ring)
    }

    /// Serialize to the blob stored under the journal key
    ///
    /// # Errors
    /// Returns a serialization error if encoding fails
    pub fn to_blob(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode and validate a stored blob
    ///
    /// # Errors
    /// Returns `Corrupt` if the blob cannot be decoded or is inconsistent
    pub fn from_blob(bytes: &[u8]) -> Result<Self> {
        let ring: Self =
            serde_json::from_slice(bytes).map_err(|e| JournalError::Corrupt(e.to_string()))?;
        ring.validate()?;
        Ok(ring)
    }
}
