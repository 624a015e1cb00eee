//! Playback controller
//!
//! Sole consumer of the command channel and sole source of command-driven
//! state changes. For each command it moves the state register, appends a
//! journal entry and, for volume commands, steps the volume collaborator.

use crate::channel::CommandReceiver;
use crate::config::ControllerConfig;
use crate::error::PlaybackError;
use crate::register::{Snapshot, StateRegister};
use std::sync::Arc;
use std::time::Duration;
use tapedeck_core::{Command, PlaybackState, TrackId, TrackList, VolumeControl};
use tapedeck_journal::CircularJournal;

/// How often an idle controller checks for shutdown
const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

/// Register values before and after one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// The command applied
    pub command: Command,
    /// Register before
    pub before: Snapshot,
    /// Register after (equal to `before` for volume commands)
    pub after: Snapshot,
}

/// State and index a command leads to
///
/// The index moves here, at command time: `Next`/`Previous` wrap around the
/// list and `Stop` rewinds to the first track.
pub fn next_position(
    state: PlaybackState,
    index: TrackId,
    command: Command,
    tracks: &TrackList,
) -> (PlaybackState, TrackId) {
    let index = match command {
        Command::Next => tracks.next_index(index),
        Command::Previous => tracks.previous_index(index),
        Command::Stop => 0,
        Command::ToggleAudio | Command::VolumeUp | Command::VolumeDown => index,
    };
    (state.after(command), index)
}

/// Consumes commands and drives playback state
pub struct PlaybackController {
    register: Arc<StateRegister>,
    tracks: Arc<TrackList>,
    journal: Arc<CircularJournal>,
    volume: Box<dyn VolumeControl>,
    level: u8,
    config: ControllerConfig,
}

impl PlaybackController {
    /// Create a controller
    pub fn new(
        register: Arc<StateRegister>,
        tracks: Arc<TrackList>,
        journal: Arc<CircularJournal>,
        volume: Box<dyn VolumeControl>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            register,
            tracks,
            journal,
            volume,
            level: config.initial_volume.min(config.max_volume),
            config,
        }
    }

    /// Current volume level
    pub fn volume_level(&self) -> u8 {
        self.level
    }

    /// Push the current level to the volume collaborator
    pub fn apply_initial_volume(&mut self) {
        if let Err(e) = self.volume.set_volume(self.level) {
            tracing::warn!(level = self.level, "Initial volume not applied: {}", e);
        }
    }

    /// Apply one command
    ///
    /// State first, then the journal (failure is logged and otherwise
    /// ignored), then the volume step for volume commands.
    pub fn apply(&mut self, command: Command) -> Transition {
        let (before, after) = if command.is_volume() {
            let current = self.register.load();
            (current, current)
        } else {
            let tracks = &self.tracks;
            self.register
                .update(|snap| next_position(snap.state, snap.index, command, tracks))
        };

        if let Err(e) = self.journal.append(command, before.index) {
            tracing::warn!(command = %command, song_id = before.index, "Journal append failed: {}", e);
        }

        match command {
            Command::VolumeUp => self.step_volume(i16::from(self.config.volume_step)),
            Command::VolumeDown => self.step_volume(-i16::from(self.config.volume_step)),
            _ => {}
        }

        tracing::info!(
            command = %command,
            song_id = before.index,
            state = %after.state,
            index = after.index,
            "Command accepted"
        );

        Transition {
            command,
            before,
            after,
        }
    }

    fn step_volume(&mut self, delta: i16) {
        let max = i16::from(self.config.max_volume);
        let level = (i16::from(self.level) + delta).clamp(0, max);
        self.level = u8::try_from(level).unwrap_or(self.config.max_volume);

        if let Err(e) = self.volume.set_volume(self.level) {
            tracing::warn!(level = self.level, "Volume change failed: {}", e);
        }
    }

    /// Consume commands until every producer is gone or the register is
    /// shut down
    ///
    /// Applies the initial volume first. Commands already queued are still
    /// applied when the last producer goes away.
    pub fn run(mut self, commands: CommandReceiver) {
        self.apply_initial_volume();
        tracing::debug!(level = self.level, "Controller started");

        loop {
            match commands.dequeue_timeout(SHUTDOWN_POLL) {
                Ok(command) => {
                    self.apply(command);
                }
                Err(PlaybackError::Timeout) if self.register.is_shutdown() => {
                    tracing::info!("Shutdown requested, controller exiting");
                    return;
                }
                Err(PlaybackError::Timeout) => {}
                Err(_) => break,
            }
        }

        tracing::info!("Command channel closed, controller exiting");
    }
}
