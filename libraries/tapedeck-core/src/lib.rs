//! Tapedeck Core
//!
//! Platform-agnostic types shared by every tapedeck crate.
//!
//! The core crate defines:
//! - **Domain Types**: `Command`, `PlaybackState`, `TrackList`
//! - **Collaborator Traits**: `VolumeControl`
//! - **Error Handling**: Unified `DeckError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use tapedeck_core::{Command, PlaybackState, TrackList};
//!
//! let tracks = TrackList::new(vec!["a.mp3".into(), "b.mp3".into(), "c.mp3".into()]).unwrap();
//! assert_eq!(tracks.next_index(2), 0);
//! assert_eq!(tracks.previous_index(0), 2);
//!
//! let command: Command = "next".parse().unwrap();
//! assert_eq!(command, Command::Next);
//! assert_eq!(PlaybackState::Stopped.toggled(), PlaybackState::Playing);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod state;
pub mod tracks;
pub mod traits;

pub use command::Command;
pub use error::{DeckError, Result};
pub use state::PlaybackState;
pub use tracks::{TrackId, TrackList};
pub use traits::VolumeControl;
