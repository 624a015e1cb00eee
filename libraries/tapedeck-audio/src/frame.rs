//! MPEG audio frame headers
//!
//! Enough of the 4-byte header to find frame boundaries and size frames
//! without decoding them.

/// Largest frame the read buffer must hold
///
/// Layer II at 384 kbit/s and 32 kHz with padding is 1729 bytes; the
/// remainder is headroom for a partially consumed leading frame.
pub const MAX_FRAME_BYTES: usize = 1940;

/// Header length in bytes
pub const HEADER_BYTES: usize = 4;

/// MPEG version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    /// MPEG-1
    Mpeg1,
    /// MPEG-2 LSF
    Mpeg2,
    /// MPEG-2.5
    Mpeg25,
}

/// MPEG audio layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Layer I
    Layer1,
    /// Layer II
    Layer2,
    /// Layer III (MP3)
    Layer3,
}

/// Parsed frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Version
    pub version: MpegVersion,
    /// Layer
    pub layer: Layer,
    /// Bitrate in kbit/s
    pub bitrate_kbps: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Padding slot present
    pub padding: bool,
    /// Channel count (1 for mono, 2 otherwise)
    pub channels: u16,
}

const BITRATES_V1_L1: [u32; 15] = [
    0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448,
];
const BITRATES_V1_L2: [u32; 15] = [
    0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384,
];
const BITRATES_V1_L3: [u32; 15] = [
    0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];
const BITRATES_V2_L1: [u32; 15] = [
    0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256,
];
const BITRATES_V2_L23: [u32; 15] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];

impl FrameHeader {
    /// Parse the header at the start of `bytes`
    ///
    /// Rejects reserved fields, free-format and the "bad" bitrate index.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let &[b0, b1, b2, b3] = bytes.get(..HEADER_BYTES)? else {
            return None;
        };
        if b0 != 0xFF || b1 & 0xE0 != 0xE0 {
            return None;
        }

        let version = match (b1 >> 3) & 0b11 {
            0b00 => MpegVersion::Mpeg25,
            0b10 => MpegVersion::Mpeg2,
            0b11 => MpegVersion::Mpeg1,
            _ => return None,
        };
        let layer = match (b1 >> 1) & 0b11 {
            0b01 => Layer::Layer3,
            0b10 => Layer::Layer2,
            0b11 => Layer::Layer1,
            _ => return None,
        };

        let bitrate_index = usize::from(b2 >> 4);
        if bitrate_index == 0 || bitrate_index == 15 {
            return None;
        }
        let table = match (version, layer) {
            (MpegVersion::Mpeg1, Layer::Layer1) => &BITRATES_V1_L1,
            (MpegVersion::Mpeg1, Layer::Layer2) => &BITRATES_V1_L2,
            (MpegVersion::Mpeg1, Layer::Layer3) => &BITRATES_V1_L3,
            (_, Layer::Layer1) => &BITRATES_V2_L1,
            (_, _) => &BITRATES_V2_L23,
        };

        let base_rate = match (b2 >> 2) & 0b11 {
            0 => 44_100,
            1 => 48_000,
            2 => 32_000,
            _ => return None,
        };
        let sample_rate = match version {
            MpegVersion::Mpeg1 => base_rate,
            MpegVersion::Mpeg2 => base_rate / 2,
            MpegVersion::Mpeg25 => base_rate / 4,
        };

        Some(Self {
            version,
            layer,
            bitrate_kbps: table[bitrate_index],
            sample_rate,
            padding: (b2 >> 1) & 1 == 1,
            channels: if b3 >> 6 == 0b11 { 1 } else { 2 },
        })
    }

    /// Frame length in bytes, header included
    pub fn frame_len(&self) -> usize {
        let bitrate = self.bitrate_kbps as usize * 1000;
        let rate = self.sample_rate as usize;
        let pad = usize::from(self.padding);

        match (self.layer, self.version) {
            (Layer::Layer1, _) => (12 * bitrate / rate + pad) * 4,
            (Layer::Layer2, _) | (Layer::Layer3, MpegVersion::Mpeg1) => 144 * bitrate / rate + pad,
            (Layer::Layer3, _) => 72 * bitrate / rate + pad,
        }
    }

    /// PCM samples per channel in one frame
    pub fn samples_per_frame(&self) -> usize {
        match (self.layer, self.version) {
            (Layer::Layer1, _) => 384,
            (Layer::Layer2, _) | (Layer::Layer3, MpegVersion::Mpeg1) => 1152,
            (Layer::Layer3, _) => 576,
        }
    }
}

/// Offset of the first valid header in `buf` accepted by `accept`
pub fn find_sync_where(buf: &[u8], accept: impl Fn(&FrameHeader) -> bool) -> Option<usize> {
    buf.windows(HEADER_BYTES).position(|window| {
        window[0] == 0xFF && FrameHeader::parse(window).is_some_and(|header| accept(&header))
    })
}

/// Offset of the first valid header of any layer
pub fn find_sync(buf: &[u8]) -> Option<usize> {
    find_sync_where(buf, |_| true)
}
