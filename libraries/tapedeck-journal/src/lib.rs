//! Tapedeck Journal
//!
//! Durable, fixed-capacity circular log of every accepted playback command.
//!
//! This crate provides:
//! - The `DurableStore` contract (`get` / `set_blob` / `commit`) with an
//!   in-memory implementation and a `redb` file-backed implementation
//! - `CircularJournal`: a mutex-guarded ring that overwrites its oldest entry
//!   when full and writes the whole ring through to the store on every change
//! - JSON export of the journal for status reporting
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tapedeck_core::Command;
//! use tapedeck_journal::{CircularJournal, FixedClock, MemoryStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let journal = CircularJournal::open(store, 3, Arc::new(FixedClock::unset()))?;
//!
//! for (event, song) in [(Command::ToggleAudio, 1), (Command::Stop, 2), (Command::Next, 3), (Command::Previous, 4)] {
//!     journal.append(event, song)?;
//! }
//!
//! assert_eq!(journal.len(), 3);
//! assert_eq!(journal.peek_latest().map(|e| e.song_id), Some(4));
//! assert_eq!(journal.read_oldest()?.map(|e| e.song_id), Some(2));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod entry;
mod error;
mod journal;
mod redb_store;
mod ring;
mod store;

pub use clock::{Clock, FixedClock, SystemClock, CLOCK_VALID_AFTER};
pub use entry::{format_timestamp, ExportedEntry, JournalEntry, TIMESTAMP_FORMAT};
pub use error::{JournalError, Result};
pub use journal::CircularJournal;
pub use redb_store::RedbStore;
pub use ring::RingState;
pub use store::{DurableStore, MemoryStore};

/// Default ring capacity (matches the device's 20-slot journal)
pub const DEFAULT_CAPACITY: usize = 20;
