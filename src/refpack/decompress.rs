//! RefPack decompression: a single pass over the opcode stream, copying
//! literal runs verbatim and match runs one byte at a time so that a copy can
//! legally overlap the bytes it is still writing (offset < count).

use super::header;
use crate::error::{CodecError, CodecResult};

fn read_byte(src: &[u8], pos: &mut usize) -> CodecResult<u8> {
    let byte = *src.get(*pos).ok_or(CodecError::CorruptedStream {
        reason: "opcode read past end of input",
    })?;
    *pos += 1;
    Ok(byte)
}

struct Opcode {
    plain: usize,
    count: usize,
    offset: usize,
    terminal: bool,
}

fn read_opcode(src: &[u8], pos: &mut usize) -> CodecResult<Opcode> {
    let b0 = read_byte(src, pos)?;
    let opcode = match b0 {
        0x00..=0x7F => {
            let b1 = read_byte(src, pos)?;
            Opcode {
                plain: (b0 & 0x03) as usize,
                count: (((b0 >> 2) & 0x07) + 3) as usize,
                offset: (((u32::from(b0) & 0x60) << 3) + u32::from(b1) + 1) as usize,
                terminal: false,
            }
        }
        0x80..=0xBF => {
            let b1 = read_byte(src, pos)?;
            let b2 = read_byte(src, pos)?;
            Opcode {
                plain: ((b1 >> 6) & 0x03) as usize,
                count: ((b0 & 0x3F) + 4) as usize,
                offset: (((u32::from(b1) & 0x3F) << 8) + u32::from(b2) + 1) as usize,
                terminal: false,
            }
        }
        0xC0..=0xDF => {
            let b1 = read_byte(src, pos)?;
            let b2 = read_byte(src, pos)?;
            let b3 = read_byte(src, pos)?;
            Opcode {
                plain: (b0 & 0x03) as usize,
                count: (((u32::from(b0) & 0x0C) << 6) + u32::from(b3) + 5) as usize,
                offset: (((u32::from(b0) & 0x10) << 12) + (u32::from(b1) << 8) + u32::from(b2) + 1)
                    as usize,
                terminal: false,
            }
        }
        0xE0..=0xFB => Opcode {
            plain: (((b0 & 0x1F) as usize) << 2) + 4,
            count: 0,
            offset: 0,
            terminal: false,
        },
        0xFC..=0xFF => Opcode {
            plain: (b0 & 0x03) as usize,
            count: 0,
            offset: 0,
            terminal: true,
        },
    };
    Ok(opcode)
}

/// Decompresses a RefPack stream, including its 9-byte framing header.
/// `expected_len` is the caller's authoritative uncompressed size; the
/// produced buffer must match it exactly.
pub fn decompress(src: &[u8], expected_len: usize) -> CodecResult<Vec<u8>> {
    header::parse(src)?;

    let mut out = Vec::with_capacity(expected_len);
    let mut pos = header::SIZE;

    loop {
        let opcode = read_opcode(src, &mut pos)?;

        let lit_end = pos
            .checked_add(opcode.plain)
            .ok_or(CodecError::CorruptedStream {
                reason: "literal run length overflows cursor",
            })?;
        let literal = src.get(pos..lit_end).ok_or(CodecError::CorruptedStream {
            reason: "literal run reads past end of input",
        })?;
        out.extend_from_slice(literal);
        pos = lit_end;

        if opcode.count > 0 {
            if opcode.offset > out.len() {
                return Err(CodecError::CorruptedStream {
                    reason: "back-reference offset precedes start of output",
                });
            }
            let start = out.len() - opcode.offset;
            for k in 0..opcode.count {
                let byte = out[start + k];
                out.push(byte);
            }
        }

        if opcode.terminal {
            break;
        }
    }

    if out.len() != expected_len {
        return Err(CodecError::LengthMismatch {
            expected: expected_len,
            actual: out.len(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::decompress;
    use crate::error::CodecError;
    use crate::refpack::header;

    #[test]
    fn overlapping_back_reference_repeats_the_last_byte() {
        // One literal byte, then a short-family match with offset 1, count 7:
        // b0 = (count-3)<<2 | plain, b1 = offset-1. plain=1, count=7 -> b0 = (4<<2)|1 = 0x11.
        let mut body = vec![0x11u8, 0x00, b'X'];
        body.push(0xFC); // terminator, no trailing literals
        let header = header::build(header::SIZE as u32 + body.len() as u32, 8);
        let mut stream = header.to_vec();
        stream.extend_from_slice(&body);

        let out = decompress(&stream, 8).unwrap();
        assert_eq!(out, b"XXXXXXXX");
    }

    #[test]
    fn rejects_offset_past_output_start() {
        // Short-family match with no preceding literal and offset 1: the copy
        // would read before the start of output.
        let body = vec![(4u8 << 2) | 0, 0x00]; // count=7, plain=0, offset=1
        let header = header::build(header::SIZE as u32 + body.len() as u32, 7);
        let mut stream = header.to_vec();
        stream.extend_from_slice(&body);

        let err = decompress(&stream, 7).unwrap_err();
        assert!(matches!(err, CodecError::CorruptedStream { .. }));
    }

    #[test]
    fn rejects_truncated_opcode_stream() {
        let header = header::build(header::SIZE as u32, 10);
        let err = decompress(&header, 10).unwrap_err();
        assert!(matches!(err, CodecError::CorruptedStream { .. }));
    }

    #[test]
    fn rejects_length_mismatch() {
        let body = [0xFCu8]; // terminator, zero literals, declares 0 bytes
        let header = header::build(header::SIZE as u32 + 1, 4);
        let mut stream = header.to_vec();
        stream.extend_from_slice(&body);

        let err = decompress(&stream, 4).unwrap_err();
        assert!(matches!(err, CodecError::LengthMismatch { .. }));
    }
}
