/// Frame decoder adapter and its Symphonia-backed MP3 implementation
use crate::error::{AudioError, DecodeError, Result};
use crate::frame::{self, FrameHeader, Layer};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions, CODEC_TYPE_MP3};
use symphonia::core::formats::Packet;

/// Format of one decoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
    /// Bits per PCM sample
    pub bits_per_sample: u16,
    /// Samples per channel
    pub samples: usize,
}

/// Result of a successful `decode_frame`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Input bytes consumed, header included
    pub consumed: usize,
    /// Format of the PCM written to the output buffer
    pub info: FrameInfo,
}

/// Decoder handle for one track
///
/// Holds the codec state for a single stream. Dropping the handle releases it.
pub trait FrameDecoder: Send {
    /// Offset of the next frame header in `buf`
    fn find_sync(&self, buf: &[u8]) -> Option<usize>;

    /// Decode the frame at the start of `buf` into `pcm` (interleaved, replaced)
    ///
    /// # Errors
    /// `Truncated` if `buf` ends before the frame does; any other variant
    /// means the stream cannot be continued from here.
    fn decode_frame(
        &mut self,
        buf: &[u8],
        pcm: &mut Vec<i16>,
    ) -> std::result::Result<DecodedFrame, DecodeError>;
}

/// Creates a fresh decoder handle per track
pub trait DecoderFactory: Send + Sync {
    /// Create a decoder handle
    ///
    /// # Errors
    /// Returns `DecoderInit` if the codec cannot be instantiated
    fn create(&self) -> Result<Box<dyn FrameDecoder>>;
}

/// MPEG-1/2/2.5 Layer III decoder
///
/// Frames are located with the local header parser and handed to Symphonia's
/// MP3 codec one packet at a time, so the bit reservoir carries across frames.
pub struct Mp3FrameDecoder {
    decoder: Box<dyn Decoder>,
    sample_buf: Option<SampleBuffer<i16>>,
    ts: u64,
}

impl Mp3FrameDecoder {
    /// Create a decoder
    ///
    /// # Errors
    /// Returns `DecoderInit` if Symphonia has no MP3 codec registered
    pub fn new() -> Result<Self> {
        let mut params = CodecParameters::new();
        params.for_codec(CODEC_TYPE_MP3);

        let decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|e| AudioError::DecoderInit(e.to_string()))?;

        Ok(Self {
            decoder,
            sample_buf: None,
            ts: 0,
        })
    }

    fn is_layer3(header: &FrameHeader) -> bool {
        header.layer == Layer::Layer3
    }
}

impl FrameDecoder for Mp3FrameDecoder {
    fn find_sync(&self, buf: &[u8]) -> Option<usize> {
        frame::find_sync_where(buf, Self::is_layer3)
    }

    fn decode_frame(
        &mut self,
        buf: &[u8],
        pcm: &mut Vec<i16>,
    ) -> std::result::Result<DecodedFrame, DecodeError> {
        let header = FrameHeader::parse(buf).ok_or(DecodeError::NoSync)?;
        if !Self::is_layer3(&header) {
            return Err(DecodeError::Unsupported(format!("{:?}", header.layer)));
        }

        let frame_len = header.frame_len();
        if buf.len() < frame_len {
            return Err(DecodeError::Truncated {
                needed: frame_len,
                available: buf.len(),
            });
        }

        let duration = header.samples_per_frame() as u64;
        let packet = Packet::new_from_slice(0, self.ts, duration, &buf[..frame_len]);
        self.ts += duration;

        let decoded = self
            .decoder
            .decode(&packet)
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let spec = *decoded.spec();
        let frames = decoded.frames();
        let needs_alloc = self
            .sample_buf
            .as_ref()
            .map_or(true, |sb| sb.capacity() < decoded.capacity());
        if needs_alloc {
            self.sample_buf = Some(SampleBuffer::<i16>::new(decoded.capacity() as u64, spec));
        }

        pcm.clear();
        if let Some(sb) = self.sample_buf.as_mut() {
            sb.copy_interleaved_ref(decoded);
            pcm.extend_from_slice(sb.samples());
        }

        Ok(DecodedFrame {
            consumed: frame_len,
            info: FrameInfo {
                sample_rate: spec.rate,
                channels: spec.channels.count() as u16,
                bits_per_sample: 16,
                samples: frames,
            },
        })
    }
}

/// Factory for [`Mp3FrameDecoder`]
#[derive(Debug, Default, Clone, Copy)]
pub struct Mp3DecoderFactory;

impl DecoderFactory for Mp3DecoderFactory {
    fn create(&self) -> Result<Box<dyn FrameDecoder>> {
        Ok(Box::new(Mp3FrameDecoder::new()?))
    }
}
