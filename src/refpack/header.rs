//! The 9-byte RefPack framing header prefixed to every compressed payload:
//! `[compressedSize: u32 LE][0x10, 0xFB][uncompressedSize: u24 BE]`.

use crate::bitio::{read_u24_be, read_u32_le, write_u24_be, write_u32_le};
use crate::error::{CodecError, CodecResult};

pub const SIZE: usize = 9;
pub const SIGNATURE: [u8; 2] = [0x10, 0xFB];

#[must_use]
pub fn build(compressed_size: u32, uncompressed_size: u32) -> [u8; SIZE] {
    let mut buf = [0u8; SIZE];
    let mut pos = 0;
    write_u32_le(&mut buf, &mut pos, compressed_size);
    buf[pos] = SIGNATURE[0];
    buf[pos + 1] = SIGNATURE[1];
    pos += 2;
    write_u24_be(&mut buf, &mut pos, uncompressed_size);
    buf
}

/// Validates the signature bytes and returns `(compressedSize, uncompressedSize)`.
pub fn parse(buf: &[u8]) -> CodecResult<(u32, u32)> {
    if buf.len() < SIZE {
        return Err(CodecError::CorruptedStream {
            reason: "input shorter than the refpack framing header",
        });
    }
    let mut pos = 0;
    let compressed_size = read_u32_le(buf, &mut pos);
    if buf[pos..pos + 2] != SIGNATURE {
        return Err(CodecError::CorruptedStream {
            reason: "missing 0x10 0xFB refpack signature",
        });
    }
    pos += 2;
    let uncompressed_size = read_u24_be(buf, &mut pos);
    Ok((compressed_size, uncompressed_size))
}

#[cfg(test)]
mod tests {
    use super::{build, parse};

    #[test]
    fn round_trips() {
        let bytes = build(123, 4096);
        assert_eq!(parse(&bytes).unwrap(), (123, 4096));
    }

    #[test]
    fn rejects_bad_signature() {
        let mut bytes = build(123, 4096);
        bytes[4] = 0;
        assert!(parse(&bytes).is_err());
    }
}
