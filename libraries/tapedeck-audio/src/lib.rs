//! Tapedeck Audio
//!
//! The audio edge of the engine: turning compressed bytes into PCM and PCM
//! into sound.
//!
//! This crate provides:
//! - **Frame parsing**: MPEG audio header parsing, sync search and leading
//!   ID3v2 tag skipping
//! - **Decoder adapter**: `FrameDecoder` / `DecoderFactory`, with a
//!   Symphonia-backed MP3 implementation
//! - **Output sinks**: the `OutputSink` contract, a null sink, a recording
//!   sink for tests and (with the `desktop` feature) a CPAL sink
//! - **Software volume**: a `VolumeControl` implementation with a
//!   logarithmic curve
//!
//! # Example
//!
//! ```rust
//! use tapedeck_audio::{DecoderFactory, FrameHeader, Mp3DecoderFactory};
//!
//! let header = FrameHeader::parse(&[0xFF, 0xFB, 0x90, 0x64]).unwrap();
//! assert_eq!(header.frame_len(), 417);
//!
//! let decoder = Mp3DecoderFactory.create().unwrap();
//! assert_eq!(decoder.find_sync(&[0x00, 0xFF, 0xFB, 0x90, 0x64]), Some(1));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod decoder;
pub mod error;
pub mod frame;
pub mod id3;
pub mod sink;
pub mod volume;

#[cfg(feature = "desktop")]
pub mod cpal_sink;

pub use decoder::{
    DecodedFrame, DecoderFactory, FrameDecoder, FrameInfo, Mp3DecoderFactory, Mp3FrameDecoder,
};
pub use error::{AudioError, DecodeError, Result, SinkError};
pub use frame::{FrameHeader, Layer, MpegVersion, MAX_FRAME_BYTES};
pub use sink::{MemorySink, NullSink, OutputSink, Recording};
pub use volume::{SharedGain, SoftwareVolume};

#[cfg(feature = "desktop")]
pub use cpal_sink::CpalSink;
