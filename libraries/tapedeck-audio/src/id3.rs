//! Leading ID3v2 tag detection

use std::io::{self, Read, Seek, SeekFrom};

/// Fixed ID3v2 header length
pub const ID3_HEADER_BYTES: usize = 10;

/// Bytes to skip for a tag whose header is `header`, or `None` if there is no tag
///
/// The size field is four bytes of 7 significant bits each, big-endian, and
/// counts the bytes after the header. A v2.4 footer adds another 10 bytes.
pub fn tag_len(header: &[u8; ID3_HEADER_BYTES]) -> Option<u64> {
    if &header[..3] != b"ID3" {
        return None;
    }

    let size = header[6..10]
        .iter()
        .fold(0u64, |acc, byte| (acc << 7) | u64::from(byte & 0x7F));
    let footer = if header[5] & 0x10 != 0 {
        ID3_HEADER_BYTES as u64
    } else {
        0
    };

    Some(ID3_HEADER_BYTES as u64 + size + footer)
}

/// Position `reader` at the first audio byte
///
/// Skips a leading tag if one is present, otherwise rewinds to the start.
/// Returns the offset of the first audio byte.
///
/// # Errors
/// Returns an I/O error if the reader cannot be read or seeked
pub fn skip_tag<R: Read + Seek>(reader: &mut R) -> io::Result<u64> {
    let mut header = [0u8; ID3_HEADER_BYTES];
    let start = match reader.read_exact(&mut header) {
        Ok(()) => tag_len(&header).unwrap_or(0),
        // Shorter than a tag header; play whatever is there
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => 0,
        Err(e) => return Err(e),
    };

    reader.seek(SeekFrom::Start(start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tag(size: [u8; 4], flags: u8, body: usize) -> Vec<u8> {
        let mut bytes = b"ID3\x04\x00".to_vec();
        bytes.push(flags);
        bytes.extend_from_slice(&size);
        bytes.resize(bytes.len() + body, 0);
        bytes
    }

    #[test]
    fn decodes_synchsafe_size() {
        let mut header = [0u8; ID3_HEADER_BYTES];
        header.copy_from_slice(&tag([0x00, 0x00, 0x02, 0x01], 0, 0));
        assert_eq!(tag_len(&header), Some(10 + 257));

        // High bits are masked off
        header.copy_from_slice(&tag([0x80, 0x80, 0x82, 0x81], 0, 0));
        assert_eq!(tag_len(&header), Some(10 + 257));
    }

    #[test]
    fn footer_flag_adds_ten_bytes() {
        let mut header = [0u8; ID3_HEADER_BYTES];
        header.copy_from_slice(&tag([0, 0, 0, 5], 0x10, 0));
        assert_eq!(tag_len(&header), Some(25));
    }

    #[test]
    fn skip_moves_past_tag() {
        let mut bytes = tag([0, 0, 0, 6], 0, 6);
        bytes.extend_from_slice(&[0xFF, 0xFB]);
        let mut cursor = Cursor::new(bytes);

        assert_eq!(skip_tag(&mut cursor).unwrap(), 16);
        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, vec![0xFF, 0xFB]);
    }

    #[test]
    fn untagged_stream_is_rewound() {
        let mut cursor = Cursor::new(vec![0xFF, 0xFB, 0x90, 0x64, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(skip_tag(&mut cursor).unwrap(), 0);
        assert_eq!(cursor.position(), 0);

        let mut short = Cursor::new(vec![0xFF, 0xFB]);
        assert_eq!(skip_tag(&mut short).unwrap(), 0);
    }
}
