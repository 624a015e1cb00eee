//! Decoder adapter integration tests
//!
//! Builds small MP3 files on disk and runs them through tag skipping, sync
//! search and frame decoding the way a track is played.

use proptest::prelude::*;
use std::fs::File;
use std::io::{Read, Write};
use tapedeck_audio::id3::skip_tag;
use tapedeck_audio::{DecodeError, DecoderFactory, FrameHeader, Mp3DecoderFactory};

// ===== Test Helpers =====

/// Silent MPEG-1 Layer III frame, 128 kbit/s, 44.1 kHz
fn silent_frame() -> Vec<u8> {
    let mut frame = vec![0xFF, 0xFB, 0x90, 0x64];
    frame.resize(417, 0);
    frame
}

fn id3_tag(body: usize) -> Vec<u8> {
    let size = u32::try_from(body).unwrap();
    let mut tag = b"ID3\x03\x00\x00".to_vec();
    for shift in [21, 14, 7, 0] {
        tag.push(((size >> shift) & 0x7F) as u8);
    }
    tag.resize(tag.len() + body, 0xAA);
    tag
}

// ===== Tests =====

#[test]
fn tagged_file_decodes_every_frame() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&id3_tag(300)).unwrap();
    // Junk between tag and first frame
    file.write_all(&[0x00, 0x11, 0x22]).unwrap();
    for _ in 0..4 {
        file.write_all(&silent_frame()).unwrap();
    }
    file.flush().unwrap();

    let mut reader = File::open(file.path()).unwrap();
    assert_eq!(skip_tag(&mut reader).unwrap(), 310);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).unwrap();

    let mut decoder = Mp3DecoderFactory.create().unwrap();
    let mut offset = decoder.find_sync(&bytes).unwrap();
    assert_eq!(offset, 3);

    let mut pcm = Vec::new();
    let mut frames = 0;
    while offset < bytes.len() {
        let frame = decoder.decode_frame(&bytes[offset..], &mut pcm).unwrap();
        assert_eq!(frame.info.sample_rate, 44_100);
        assert_eq!(pcm.len(), frame.info.samples * usize::from(frame.info.channels));
        offset += frame.consumed;
        frames += 1;
    }
    assert_eq!(frames, 4);
}

#[test]
fn trailing_partial_frame_reports_truncation() {
    let mut bytes = silent_frame();
    bytes.extend_from_slice(&silent_frame()[..100]);

    let mut decoder = Mp3DecoderFactory.create().unwrap();
    let mut pcm = Vec::new();
    let first = decoder.decode_frame(&bytes, &mut pcm).unwrap();

    let rest = &bytes[first.consumed..];
    assert!(matches!(
        decoder.decode_frame(rest, &mut pcm),
        Err(DecodeError::Truncated { needed: 417, available: 100 })
    ));
}

#[test]
fn each_factory_call_is_independent() {
    let factory = Mp3DecoderFactory;
    let mut a = factory.create().unwrap();
    let mut b = factory.create().unwrap();
    let mut pcm = Vec::new();

    a.decode_frame(&silent_frame(), &mut pcm).unwrap();
    drop(a);
    b.decode_frame(&silent_frame(), &mut pcm).unwrap();
}

proptest! {
    /// Property: any offset reported by sync search starts a parseable header
    #[test]
    fn sync_offset_starts_a_header(bytes in prop::collection::vec(any::<u8>(), 0..2048)) {
        let decoder = Mp3DecoderFactory.create().unwrap();
        if let Some(offset) = decoder.find_sync(&bytes) {
            let header = FrameHeader::parse(&bytes[offset..]);
            prop_assert!(header.is_some());
        }
    }
}
