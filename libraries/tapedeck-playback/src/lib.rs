//! Tapedeck Playback
//!
//! Command-driven playback for a fixed track list.
//!
//! This crate provides:
//! - `CommandChannel`: bounded FIFO from any number of producers to the controller
//! - `StateRegister`: the playback state and track index in one atomic word
//! - `PlaybackController`: turns commands into state changes, journal entries
//!   and volume steps
//! - `DecodeLoop`: plays the selected track frame by frame and reacts to the
//!   register at every frame boundary
//!
//! # Architecture
//!
//! ```text
//! producers --enqueue--> CommandChannel --dequeue--> PlaybackController
//!                                                     |  |  |
//!                                  StateRegister <----+  |  +--> VolumeControl
//!                                       |                v
//!                                       |          CircularJournal
//!                                       v
//!                                  DecodeLoop --> DecoderFactory / OutputSink
//! ```
//!
//! The controller and the decode loop each run on their own thread.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tapedeck_core::{Command, PlaybackState, TrackList, VolumeControl};
//! use tapedeck_journal::{CircularJournal, FixedClock, MemoryStore};
//! use tapedeck_playback::{CommandChannel, ControllerConfig, PlaybackController, StateRegister};
//!
//! struct NoVolume;
//! impl VolumeControl for NoVolume {
//!     fn set_volume(&mut self, _level: u8) -> tapedeck_core::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tracks = Arc::new(TrackList::new(vec!["a.mp3".into(), "b.mp3".into()])?);
//! let journal = Arc::new(CircularJournal::open(
//!     Arc::new(MemoryStore::new()),
//!     20,
//!     Arc::new(FixedClock::unset()),
//! )?);
//! let register = Arc::new(StateRegister::default());
//!
//! let controller = PlaybackController::new(
//!     Arc::clone(&register),
//!     tracks,
//!     Arc::clone(&journal),
//!     Box::new(NoVolume),
//!     ControllerConfig::default(),
//! );
//!
//! let (tx, rx) = CommandChannel::bounded(20);
//! tx.enqueue(Command::Next)?;
//! drop(tx);
//! controller.run(rx);
//!
//! assert_eq!(register.load().state, PlaybackState::AdvanceNext);
//! assert_eq!(register.load().index, 1);
//! assert_eq!(journal.len(), 1);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod channel;
pub mod config;
pub mod controller;
pub mod decode_loop;
pub mod error;
pub mod register;

pub use channel::{CommandChannel, CommandReceiver, CommandSender, DEFAULT_QUEUE_CAPACITY};
pub use config::{ControllerConfig, DecodeLoopConfig, EndOfTrack};
pub use controller::{next_position, PlaybackController, Transition};
pub use decode_loop::{DecodeLoop, FrameOutcome, LoopStats};
pub use error::{PlaybackError, Result};
pub use register::{Snapshot, StateRegister};
