//! Process wiring
//!
//! Builds the journal, output and volume from configuration and runs the
//! controller and the decode loop on their own threads.

use crate::config::{DaemonConfig, OutputBackend};
use crate::error::{DaemonError, Result};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tapedeck_audio::{DecoderFactory, NullSink, OutputSink, SoftwareVolume};
use tapedeck_core::{PlaybackState, VolumeControl};
use tapedeck_journal::{CircularJournal, RedbStore, SystemClock};
use tapedeck_playback::{
    CommandChannel, CommandSender, DecodeLoop, LoopStats, PlaybackController, StateRegister,
};

/// Open the journal at the configured path with the system clock
pub fn open_journal(config: &DaemonConfig) -> Result<Arc<CircularJournal>> {
    let store = RedbStore::open(&config.journal.path)?;
    let journal = CircularJournal::open(
        Arc::new(store),
        config.journal.capacity,
        Arc::new(SystemClock),
    )?;
    tracing::info!(
        path = %config.journal.path.display(),
        entries = journal.len(),
        capacity = journal.capacity(),
        "Journal opened"
    );
    Ok(Arc::new(journal))
}

/// Output sink and the volume control feeding it
pub fn open_output(
    config: &DaemonConfig,
) -> Result<(Box<dyn OutputSink>, Box<dyn VolumeControl>)> {
    let volume = SoftwareVolume::new(config.volume.initial);

    match config.output.backend {
        OutputBackend::Null => {
            tracing::info!("Using null output");
            Ok((Box::new(NullSink::new()), Box::new(volume)))
        }
        #[cfg(feature = "desktop")]
        OutputBackend::Cpal => {
            let sink = tapedeck_audio::CpalSink::open(volume.gain())?;
            tracing::info!("Using default output device");
            Ok((Box::new(sink), Box::new(volume)))
        }
        #[cfg(not(feature = "desktop"))]
        OutputBackend::Cpal => Err(DaemonError::Config(
            "output.backend = \"cpal\" needs the desktop feature".to_string(),
        )),
    }
}

/// Running controller and decode loop
pub struct Engine {
    commands: CommandSender,
    register: Arc<StateRegister>,
    journal: Arc<CircularJournal>,
    controller: JoinHandle<()>,
    player: JoinHandle<LoopStats>,
}

impl Engine {
    /// Start both threads
    ///
    /// The deck starts on the first track, `Playing` when autoplay is set.
    pub fn start(
        config: &DaemonConfig,
        journal: Arc<CircularJournal>,
        decoders: Arc<dyn DecoderFactory>,
        sink: Box<dyn OutputSink>,
        volume: Box<dyn VolumeControl>,
    ) -> Result<Self> {
        let tracks = Arc::new(config.track_list()?);
        let initial = if config.playback.autoplay {
            PlaybackState::Playing
        } else {
            PlaybackState::Stopped
        };
        let register = Arc::new(StateRegister::new(initial, 0));
        let (commands, receiver) = CommandChannel::bounded(config.playback.queue_capacity);

        let controller = PlaybackController::new(
            Arc::clone(&register),
            Arc::clone(&tracks),
            Arc::clone(&journal),
            volume,
            config.controller_config(),
        );
        let decode_loop = DecodeLoop::new(
            Arc::clone(&register),
            Arc::clone(&tracks),
            decoders,
            sink,
            config.decode_loop_config(),
        );

        let controller = thread::Builder::new()
            .name("tapedeck-control".to_string())
            .spawn(move || controller.run(receiver))?;
        let player = thread::Builder::new()
            .name("tapedeck-decode".to_string())
            .spawn(move || decode_loop.run())?;

        tracing::info!(
            tracks = tracks.len(),
            state = %initial,
            end_of_track = ?config.playback.end_of_track,
            "Engine started"
        );

        Ok(Self {
            commands,
            register,
            journal,
            controller,
            player,
        })
    }

    /// A producer handle for the command channel
    pub fn sender(&self) -> CommandSender {
        self.commands.clone()
    }

    pub fn register(&self) -> &Arc<StateRegister> {
        &self.register
    }

    pub fn journal(&self) -> &Arc<CircularJournal> {
        &self.journal
    }

    /// Stop both threads and return the decode loop counters
    ///
    /// Producers still holding senders see `ChannelClosed` afterwards.
    pub fn shutdown(self) -> Result<LoopStats> {
        tracing::info!("Engine shutting down");
        drop(self.commands);
        self.register.shutdown();

        self.controller
            .join()
            .map_err(|_| DaemonError::Thread("controller"))?;
        let stats = self
            .player
            .join()
            .map_err(|_| DaemonError::Thread("decode loop"))?;

        tracing::info!(
            tracks_started = stats.tracks_started,
            frames = stats.frames_decoded,
            "Engine stopped"
        );
        Ok(stats)
    }
}
