//! Output sink contract and in-process sinks

use crate::error::SinkError;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// PCM output device
///
/// Blocks are interleaved signed 16-bit samples in the last configured
/// format.
pub trait OutputSink: Send {
    /// Set the device clock and sample layout
    ///
    /// # Errors
    /// Returns an error if the device cannot run in this format
    fn configure(
        &mut self,
        sample_rate: u32,
        bits_per_sample: u16,
        channels: u16,
    ) -> Result<(), SinkError>;

    /// Queue a block, waiting at most `timeout` for room
    ///
    /// Returns the number of bytes accepted.
    ///
    /// # Errors
    /// `Timeout` if the device did not take the block in time
    fn write(&mut self, samples: &[i16], timeout: Duration) -> Result<usize, SinkError>;

    /// Discard anything queued and output silence
    ///
    /// # Errors
    /// Returns an error if the device is gone
    fn flush(&mut self) -> Result<(), SinkError>;
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn configure(
        &mut self,
        sample_rate: u32,
        bits_per_sample: u16,
        channels: u16,
    ) -> Result<(), SinkError> {
        (**self).configure(sample_rate, bits_per_sample, channels)
    }

    fn write(&mut self, samples: &[i16], timeout: Duration) -> Result<usize, SinkError> {
        (**self).write(samples, timeout)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

/// Byte length of a 16-bit block
pub fn block_bytes(samples: &[i16]) -> usize {
    std::mem::size_of_val(samples)
}

/// Sink that accepts and discards everything
#[derive(Debug, Default)]
pub struct NullSink {
    bytes_written: u64,
}

impl NullSink {
    /// Create a null sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes accepted
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl OutputSink for NullSink {
    fn configure(
        &mut self,
        sample_rate: u32,
        bits_per_sample: u16,
        channels: u16,
    ) -> Result<(), SinkError> {
        tracing::debug!(sample_rate, bits_per_sample, channels, "Null sink configured");
        Ok(())
    }

    fn write(&mut self, samples: &[i16], _timeout: Duration) -> Result<usize, SinkError> {
        let bytes = block_bytes(samples);
        self.bytes_written += bytes as u64;
        Ok(bytes)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Everything a [`MemorySink`] has seen
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Recording {
    /// `(sample_rate, bits_per_sample, channels)` per `configure` call
    pub configs: Vec<(u32, u16, u16)>,
    /// Accepted blocks in order
    pub blocks: Vec<Vec<i16>>,
    /// Number of `flush` calls
    pub flushes: usize,
    /// Blocks rejected with a timeout
    pub timeouts: usize,
}

#[derive(Debug, Default)]
struct MemoryState {
    recording: Recording,
    reject_writes: bool,
}

/// Sink that records every call
///
/// Clones share the same recording, so a test can keep one handle while the
/// decode loop owns another.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySink {
    /// Create an empty recording sink
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the recording so far
    pub fn recording(&self) -> Recording {
        self.lock().recording.clone()
    }

    /// Make subsequent writes time out
    pub fn reject_writes(&self, reject: bool) {
        self.lock().reject_writes = reject;
    }

    /// Total samples accepted
    pub fn samples_written(&self) -> usize {
        self.lock().recording.blocks.iter().map(Vec::len).sum()
    }
}

impl OutputSink for MemorySink {
    fn configure(
        &mut self,
        sample_rate: u32,
        bits_per_sample: u16,
        channels: u16,
    ) -> Result<(), SinkError> {
        self.lock()
            .recording
            .configs
            .push((sample_rate, bits_per_sample, channels));
        Ok(())
    }

    fn write(&mut self, samples: &[i16], _timeout: Duration) -> Result<usize, SinkError> {
        let mut state = self.lock();
        if state.reject_writes {
            state.recording.timeouts += 1;
            return Err(SinkError::Timeout);
        }
        state.recording.blocks.push(samples.to_vec());
        Ok(block_bytes(samples))
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.lock().recording.flushes += 1;
        Ok(())
    }
}
