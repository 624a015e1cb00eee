//! Decode loop
//!
//! Reads the current track frame by frame, hands each frame to the decoder
//! and writes the PCM to the sink. The state register is checked before
//! every frame; commands therefore take effect at the next frame boundary.
//!
//! The only register writes made here are conditional:
//! - settling `AdvanceNext`/`AdvancePrevious` into `Playing` when a track starts
//! - the end-of-track move
//! - `Playing -> Stopped` when a track cannot be started
//!
//! Each fails if a command got in first, and the command wins.

use crate::config::{DecodeLoopConfig, EndOfTrack};
use crate::error::{PlaybackError, Result};
use crate::register::{Snapshot, StateRegister};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use tapedeck_audio::frame::HEADER_BYTES;
use tapedeck_audio::id3::skip_tag;
use tapedeck_audio::{
    AudioError, DecodeError, DecoderFactory, FrameDecoder, FrameInfo, OutputSink, SinkError,
    MAX_FRAME_BYTES,
};
use tapedeck_core::{PlaybackState, TrackId, TrackList};

/// Result of one frame-processing step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Keep decoding the current track
    Continue,
    /// Release the track and start whatever the register now selects
    RestartTrack,
    /// Release the track and wait for a command
    GoIdle,
    /// Release the track and exit the loop
    Shutdown,
}

/// Counters returned when the loop exits
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    /// Tracks opened successfully
    pub tracks_started: u64,
    /// Frames decoded
    pub frames_decoded: u64,
    /// PCM blocks the sink did not accept
    pub blocks_dropped: u64,
    /// Tracks that could not be started or decoded
    pub track_failures: u64,
}

/// Read buffer that keeps at least one maximal frame while input lasts
struct FrameBuffer {
    data: Box<[u8]>,
    start: usize,
    end: usize,
    eof: bool,
}

impl FrameBuffer {
    fn new() -> Self {
        Self {
            data: vec![0; MAX_FRAME_BYTES * 2].into_boxed_slice(),
            start: 0,
            end: 0,
            eof: false,
        }
    }

    fn available(&self) -> &[u8] {
        &self.data[self.start..self.end]
    }

    fn len(&self) -> usize {
        self.end - self.start
    }

    fn needs_refill(&self) -> bool {
        !self.eof && self.len() < MAX_FRAME_BYTES
    }

    fn consume(&mut self, n: usize) {
        self.start = (self.start + n).min(self.end);
    }

    /// Drop everything but a possible partial header at the tail
    fn discard(&mut self) {
        let keep = self.len().min(HEADER_BYTES - 1);
        self.start = self.end - keep;
    }

    fn refill<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        self.data.copy_within(self.start..self.end, 0);
        self.end -= self.start;
        self.start = 0;

        while self.end < self.data.len() {
            match reader.read(&mut self.data[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => self.end += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Everything held for the track being played
///
/// Dropping it closes the file and releases the decoder.
struct TrackSession {
    index: TrackId,
    reader: File,
    decoder: Box<dyn FrameDecoder>,
    buf: FrameBuffer,
    seen: Snapshot,
    frames: u64,
}

/// Frame-by-frame player driven by the state register
pub struct DecodeLoop {
    register: Arc<StateRegister>,
    tracks: Arc<TrackList>,
    decoders: Arc<dyn DecoderFactory>,
    sink: Box<dyn OutputSink>,
    config: DecodeLoopConfig,
    format: Option<(u32, u16)>,
    pcm: Vec<i16>,
    stats: LoopStats,
}

impl DecodeLoop {
    /// Create a decode loop
    pub fn new(
        register: Arc<StateRegister>,
        tracks: Arc<TrackList>,
        decoders: Arc<dyn DecoderFactory>,
        sink: Box<dyn OutputSink>,
        config: DecodeLoopConfig,
    ) -> Self {
        Self {
            register,
            tracks,
            decoders,
            sink,
            config,
            format: None,
            pcm: Vec::with_capacity(1152 * 2),
            stats: LoopStats::default(),
        }
    }

    /// Run until the register is shut down
    pub fn run(mut self) -> LoopStats {
        tracing::info!(tracks = self.tracks.len(), "Decode loop started");

        loop {
            if self.register.is_shutdown() {
                break;
            }
            let snap = self.register.load();
            let outcome = if snap.state.is_idle() {
                match self.wait_while_idle(snap) {
                    Some(_) => FrameOutcome::Continue,
                    None => FrameOutcome::Shutdown,
                }
            } else {
                self.play(snap)
            };
            if outcome == FrameOutcome::Shutdown {
                break;
            }
        }

        self.silence();
        tracing::info!(
            tracks_started = self.stats.tracks_started,
            frames = self.stats.frames_decoded,
            dropped = self.stats.blocks_dropped,
            failures = self.stats.track_failures,
            "Decode loop stopped"
        );
        self.stats
    }

    fn silence(&mut self) {
        if let Err(e) = self.sink.flush() {
            tracing::warn!("Sink flush failed: {}", e);
        }
    }

    /// Silence the sink and sleep until the register changes
    ///
    /// Re-silences every idle poll. Returns `None` on shutdown.
    fn wait_while_idle(&mut self, snap: Snapshot) -> Option<Snapshot> {
        self.silence();
        loop {
            let current = self
                .register
                .wait_for_change(snap.generation, self.config.idle_poll);
            if self.register.is_shutdown() {
                return None;
            }
            if current.generation != snap.generation {
                return Some(current);
            }
            self.silence();
        }
    }

    /// Play the track `snap` selects, start to finish or until interrupted
    fn play(&mut self, snap: Snapshot) -> FrameOutcome {
        let snap = match snap.state {
            PlaybackState::AdvanceNext | PlaybackState::AdvancePrevious => {
                match self
                    .register
                    .compare_and_set(snap, PlaybackState::Playing, snap.index)
                {
                    Ok(settled) => settled,
                    Err(_) => return FrameOutcome::RestartTrack,
                }
            }
            _ => snap,
        };

        let mut session = match self.open_track(snap) {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(index = snap.index, "Cannot start track: {}", e);
                self.stats.track_failures += 1;
                if self
                    .register
                    .compare_and_set(snap, PlaybackState::Stopped, snap.index)
                    .is_err()
                {
                    tracing::debug!("Command arrived while starting track");
                }
                return FrameOutcome::GoIdle;
            }
        };

        self.stats.tracks_started += 1;
        // Every track start configures the sink afresh
        self.format = None;
        self.silence();

        let outcome = loop {
            match self.process_frame(&mut session) {
                FrameOutcome::Continue => {}
                other => break other,
            }
        };

        let index = session.index;
        let frames = session.frames;
        drop(session);
        self.silence();
        tracing::debug!(index, frames, ?outcome, "Track released");

        outcome
    }

    fn open_track(&self, snap: Snapshot) -> Result<TrackSession> {
        let path = self
            .tracks
            .get(snap.index)
            .ok_or(PlaybackError::NoSuchTrack(snap.index))?;

        let mut reader = File::open(path).map_err(|e| Self::open_error(path, e))?;
        let audio_start = skip_tag(&mut reader).map_err(AudioError::Io)?;
        let decoder = self.decoders.create()?;

        tracing::info!(index = snap.index, path = %path.display(), audio_start, "Track started");

        Ok(TrackSession {
            index: snap.index,
            reader,
            decoder,
            buf: FrameBuffer::new(),
            seen: snap,
            frames: 0,
        })
    }

    fn open_error(path: &Path, err: io::Error) -> PlaybackError {
        if err.kind() == io::ErrorKind::NotFound {
            AudioError::FileNotFound(path.display().to_string()).into()
        } else {
            AudioError::Io(err).into()
        }
    }

    /// One step: check the register, then refill, sync, decode and write
    fn process_frame(&mut self, session: &mut TrackSession) -> FrameOutcome {
        match self.check_state(session) {
            FrameOutcome::Continue => {}
            other => return other,
        }

        if session.buf.needs_refill() {
            if let Err(e) = session.buf.refill(&mut session.reader) {
                // Play out what is already buffered
                tracing::warn!(index = session.index, "Track read failed: {}", e);
                session.buf.eof = true;
            }
        }

        if session.buf.len() == 0 && session.buf.eof {
            return self.end_of_track(session, None);
        }

        match session.decoder.find_sync(session.buf.available()) {
            Some(offset) => session.buf.consume(offset),
            None if session.buf.eof => return self.end_of_track(session, None),
            None => {
                tracing::trace!(index = session.index, "No sync in buffer, discarding");
                session.buf.discard();
                return FrameOutcome::Continue;
            }
        }

        match session
            .decoder
            .decode_frame(session.buf.available(), &mut self.pcm)
        {
            Ok(frame) => {
                session.buf.consume(frame.consumed.max(1));
                session.frames += 1;
                self.stats.frames_decoded += 1;
                self.output(frame.info);
                FrameOutcome::Continue
            }
            Err(DecodeError::Truncated { .. }) if session.buf.eof => {
                self.end_of_track(session, None)
            }
            Err(DecodeError::Truncated { .. }) if session.buf.needs_refill() => {
                FrameOutcome::Continue
            }
            Err(e) => self.end_of_track(session, Some(e)),
        }
    }

    /// Map the register onto what to do with the open track
    ///
    /// A pause (`Stopped` on this track) blocks here and resumes in place.
    fn check_state(&mut self, session: &mut TrackSession) -> FrameOutcome {
        loop {
            if self.register.is_shutdown() {
                return FrameOutcome::Shutdown;
            }

            let snap = self.register.load();
            match snap.state {
                PlaybackState::Playing if snap.index == session.index => {
                    session.seen = snap;
                    return FrameOutcome::Continue;
                }
                PlaybackState::Stopped if snap.index == session.index => {
                    tracing::debug!(index = session.index, "Paused");
                    if self.wait_while_idle(snap).is_none() {
                        return FrameOutcome::Shutdown;
                    }
                }
                PlaybackState::Stopped | PlaybackState::HardStopped => {
                    return FrameOutcome::GoIdle;
                }
                PlaybackState::Playing
                | PlaybackState::AdvanceNext
                | PlaybackState::AdvancePrevious => return FrameOutcome::RestartTrack,
            }
        }
    }

    /// Apply the end-of-track policy after the stream ended or broke
    fn end_of_track(
        &mut self,
        session: &TrackSession,
        failure: Option<DecodeError>,
    ) -> FrameOutcome {
        let seen = session.seen;

        let (state, index) = if let Some(e) = &failure {
            tracing::error!(index = seen.index, "Decode failed, abandoning track: {}", e);
            self.stats.track_failures += 1;
            // A track that never played stops the deck under every policy
            if session.frames == 0 {
                (PlaybackState::Stopped, seen.index)
            } else {
                match self.config.end_of_track {
                    EndOfTrack::Advance => {
                        (PlaybackState::Playing, self.tracks.next_index(seen.index))
                    }
                    EndOfTrack::Repeat | EndOfTrack::Stop => {
                        (PlaybackState::Stopped, seen.index)
                    }
                }
            }
        } else if session.frames == 0 {
            tracing::error!(index = seen.index, "Track has no playable frames");
            self.stats.track_failures += 1;
            (PlaybackState::Stopped, seen.index)
        } else {
            tracing::info!(index = seen.index, frames = session.frames, "Track finished");
            match self.config.end_of_track {
                EndOfTrack::Advance => (PlaybackState::Playing, self.tracks.next_index(seen.index)),
                EndOfTrack::Repeat => (PlaybackState::Playing, seen.index),
                EndOfTrack::Stop => (PlaybackState::Stopped, seen.index),
            }
        };

        if (state, index) != (seen.state, seen.index)
            && self.register.compare_and_set(seen, state, index).is_err()
        {
            tracing::debug!("Command arrived at end of track, keeping it");
        }

        if state.is_idle() {
            FrameOutcome::GoIdle
        } else {
            FrameOutcome::RestartTrack
        }
    }

    fn output(&mut self, info: FrameInfo) {
        let format = (info.sample_rate, info.channels);
        if self.format != Some(format) {
            match self
                .sink
                .configure(info.sample_rate, info.bits_per_sample, info.channels)
            {
                Ok(()) => {
                    tracing::info!(
                        sample_rate = info.sample_rate,
                        channels = info.channels,
                        "Output format changed"
                    );
                    self.format = Some(format);
                }
                // Retried on the next frame
                Err(e) => tracing::error!(
                    sample_rate = info.sample_rate,
                    "Sink reconfiguration failed: {}",
                    e
                ),
            }
        }

        if self.pcm.is_empty() {
            return;
        }

        match self.sink.write(&self.pcm, self.config.write_timeout) {
            Ok(_) => {}
            Err(SinkError::Timeout) => {
                tracing::warn!("Sink write timed out, block dropped");
                self.stats.blocks_dropped += 1;
            }
            Err(e) => {
                tracing::warn!("Sink write failed, block dropped: {}", e);
                self.stats.blocks_dropped += 1;
            }
        }
    }
}
