//! Shared playback state register
//!
//! One atomic word holds the playback state, the current track index and a
//! generation counter. Every write goes through compare-and-swap, so a write
//! computed from a stale read fails instead of clobbering a newer one.
//!
//! Layout: `generation << 32 | index << 8 | state`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tapedeck_core::{PlaybackState, TrackId};

/// One consistent reading of the register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Playback state
    pub state: PlaybackState,
    /// Current track index
    pub index: TrackId,
    /// Bumped on every successful write
    pub generation: u32,
}

impl Snapshot {
    fn pack(self) -> u64 {
        (u64::from(self.generation) << 32)
            | (u64::from(self.index) << 8)
            | u64::from(self.state.code())
    }

    fn unpack(word: u64) -> Self {
        Self {
            // Only valid codes are ever packed
            state: PlaybackState::from_code((word & 0xFF) as u8).unwrap_or_default(),
            index: ((word >> 8) & 0xFFFF) as TrackId,
            generation: (word >> 32) as u32,
        }
    }
}

/// Playback state shared between the controller and the decode loop
#[derive(Debug)]
pub struct StateRegister {
    word: AtomicU64,
    gate: Mutex<()>,
    changed: Condvar,
    shutdown: AtomicBool,
}

impl StateRegister {
    /// Create a register at generation 0
    pub fn new(state: PlaybackState, index: TrackId) -> Self {
        let initial = Snapshot {
            state,
            index,
            generation: 0,
        };
        Self {
            word: AtomicU64::new(initial.pack()),
            gate: Mutex::new(()),
            changed: Condvar::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Current value
    pub fn load(&self) -> Snapshot {
        Snapshot::unpack(self.word.load(Ordering::Acquire))
    }

    /// Replace `expected` with `(state, index)` if nothing changed in between
    ///
    /// Returns the new snapshot, or the current one if `expected` is stale.
    pub fn compare_and_set(
        &self,
        expected: Snapshot,
        state: PlaybackState,
        index: TrackId,
    ) -> Result<Snapshot, Snapshot> {
        let next = Snapshot {
            state,
            index,
            generation: expected.generation.wrapping_add(1),
        };
        match self.word.compare_exchange(
            expected.pack(),
            next.pack(),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                self.notify();
                Ok(next)
            }
            Err(current) => Err(Snapshot::unpack(current)),
        }
    }

    /// Apply `f` to the current value until it sticks
    ///
    /// Returns `(before, after)`.
    pub fn update(
        &self,
        mut f: impl FnMut(Snapshot) -> (PlaybackState, TrackId),
    ) -> (Snapshot, Snapshot) {
        let mut current = self.load();
        loop {
            let (state, index) = f(current);
            match self.compare_and_set(current, state, index) {
                Ok(next) => return (current, next),
                Err(actual) => current = actual,
            }
        }
    }

    /// Block until the generation moves past `since`, shutdown, or `timeout`
    pub fn wait_for_change(&self, since: u32, timeout: Duration) -> Snapshot {
        let deadline = Instant::now() + timeout;
        let mut guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            let current = self.load();
            if current.generation != since || self.is_shutdown() {
                return current;
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return current;
            };
            guard = self
                .changed
                .wait_timeout(guard, remaining)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
    }

    /// Ask the decode loop to exit and wake it
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.notify();
    }

    /// Whether shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    fn notify(&self) {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        self.changed.notify_all();
    }
}

impl Default for StateRegister {
    fn default() -> Self {
        Self::new(PlaybackState::Stopped, 0)
    }
}
