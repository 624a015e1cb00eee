/// CPAL-backed output sink
use crate::error::{AudioError, SinkError};
use crate::sink::{block_bytes, OutputSink};
use crate::volume::SharedGain;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Blocks queued between the decode loop and the device callback
const QUEUE_BLOCKS: usize = 8;

/// How long `configure` waits for the audio thread to rebuild the stream
const CONFIGURE_TIMEOUT: Duration = Duration::from_secs(2);

/// Commands sent to the audio thread
enum SinkCommand {
    /// Rebuild the stream for a new format
    Configure {
        sample_rate: u32,
        channels: u16,
        reply: Sender<Result<(), SinkError>>,
    },
    /// Drop the stream and exit
    Shutdown,
}

/// Callback-side playout state
struct Playout {
    blocks: Receiver<Vec<f32>>,
    current: Vec<f32>,
    pos: usize,
    flush: Arc<AtomicBool>,
}

impl Playout {
    fn fill(&mut self, output: &mut [f32]) {
        if self.flush.swap(false, Ordering::AcqRel) {
            self.current.clear();
            self.pos = 0;
        }

        for out in output.iter_mut() {
            if self.pos >= self.current.len() {
                match self.blocks.try_recv() {
                    Ok(block) => {
                        self.current = block;
                        self.pos = 0;
                    }
                    // Underrun plays silence
                    Err(_) => {
                        *out = 0.0;
                        continue;
                    }
                }
                if self.current.is_empty() {
                    *out = 0.0;
                    continue;
                }
            }
            *out = self.current[self.pos];
            self.pos += 1;
        }
    }
}

/// CPAL audio output
///
/// A dedicated audio thread owns the CPAL `Stream`, so the sink itself stays
/// `Send`. PCM blocks travel to the device callback over a bounded channel;
/// `write` blocks on that channel up to its timeout.
pub struct CpalSink {
    command_tx: Sender<SinkCommand>,
    block_tx: Sender<Vec<f32>>,
    block_rx: Receiver<Vec<f32>>,
    flush: Arc<AtomicBool>,
    gain: SharedGain,
    format: Option<(u32, u16)>,
    audio_thread: Option<JoinHandle<()>>,
}

impl CpalSink {
    /// Open the default output device
    ///
    /// # Errors
    /// Returns `DeviceNotFound` if the host has no output device
    pub fn open(gain: SharedGain) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::DeviceNotFound)?;

        if let Ok(name) = device.name() {
            tracing::info!(device = %name, "Using output device");
        }

        Ok(Self::with_device(device, gain))
    }

    fn with_device(device: Device, gain: SharedGain) -> Self {
        let (command_tx, command_rx) = bounded::<SinkCommand>(4);
        let (block_tx, block_rx) = bounded::<Vec<f32>>(QUEUE_BLOCKS);
        let flush = Arc::new(AtomicBool::new(false));

        let playout_rx = block_rx.clone();
        let playout_flush = Arc::clone(&flush);
        let audio_thread = thread::Builder::new()
            .name("tapedeck-audio-out".to_string())
            .spawn(move || Self::audio_thread_run(device, command_rx, playout_rx, playout_flush))
            .ok();

        Self {
            command_tx,
            block_tx,
            block_rx,
            flush,
            gain,
            format: None,
            audio_thread,
        }
    }

    /// Audio thread main loop
    ///
    /// Owns the stream and rebuilds it whenever the format changes.
    fn audio_thread_run(
        device: Device,
        command_rx: Receiver<SinkCommand>,
        blocks: Receiver<Vec<f32>>,
        flush: Arc<AtomicBool>,
    ) {
        let mut stream: Option<Stream> = None;

        while let Ok(cmd) = command_rx.recv() {
            match cmd {
                SinkCommand::Configure {
                    sample_rate,
                    channels,
                    reply,
                } => {
                    drop(stream.take());

                    let config = StreamConfig {
                        channels,
                        sample_rate,
                        buffer_size: BufferSize::Default,
                    };
                    let mut playout = Playout {
                        blocks: blocks.clone(),
                        current: Vec::new(),
                        pos: 0,
                        flush: Arc::clone(&flush),
                    };

                    let result = device
                        .build_output_stream(
                            &config,
                            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                                playout.fill(data);
                            },
                            |err| tracing::error!("Audio stream error: {}", err),
                            None,
                        )
                        .map_err(|e| SinkError::Device(e.to_string()))
                        .and_then(|s| {
                            s.play().map_err(|e| SinkError::Device(e.to_string()))?;
                            Ok(s)
                        });

                    let reply_result = match result {
                        Ok(s) => {
                            stream = Some(s);
                            Ok(())
                        }
                        Err(e) => Err(e),
                    };
                    // The caller may have given up waiting
                    let _ = reply.send(reply_result);
                }
                SinkCommand::Shutdown => break,
            }
        }

        drop(stream);
    }

    fn to_float(&self, samples: &[i16]) -> Vec<f32> {
        let mut block: Vec<f32> = samples.iter().map(|&s| f32::from(s) / 32768.0).collect();
        self.gain.apply_f32(&mut block);
        block
    }
}

impl OutputSink for CpalSink {
    fn configure(
        &mut self,
        sample_rate: u32,
        bits_per_sample: u16,
        channels: u16,
    ) -> Result<(), SinkError> {
        if bits_per_sample != 16 {
            return Err(SinkError::UnsupportedFormat(format!(
                "{bits_per_sample}-bit samples"
            )));
        }
        if self.format == Some((sample_rate, channels)) {
            return Ok(());
        }

        let (reply_tx, reply_rx) = bounded(1);
        self.command_tx
            .send(SinkCommand::Configure {
                sample_rate,
                channels,
                reply: reply_tx,
            })
            .map_err(|_| SinkError::Disconnected)?;

        reply_rx
            .recv_timeout(CONFIGURE_TIMEOUT)
            .map_err(|_| SinkError::Device("audio thread did not answer".to_string()))??;

        self.format = Some((sample_rate, channels));
        tracing::debug!(sample_rate, channels, "Output stream configured");
        Ok(())
    }

    fn write(&mut self, samples: &[i16], timeout: Duration) -> Result<usize, SinkError> {
        let block = self.to_float(samples);
        match self.block_tx.send_timeout(block, timeout) {
            Ok(()) => Ok(block_bytes(samples)),
            Err(SendTimeoutError::Timeout(_)) => Err(SinkError::Timeout),
            Err(SendTimeoutError::Disconnected(_)) => Err(SinkError::Disconnected),
        }
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        while self.block_rx.try_recv().is_ok() {}
        self.flush.store(true, Ordering::Release);
        Ok(())
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        let _ = self.command_tx.send(SinkCommand::Shutdown);
        if let Some(handle) = self.audio_thread.take() {
            let _ = handle.join();
        }
    }
}
