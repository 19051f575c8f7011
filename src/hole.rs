//! Holes: (location, size) placeholders the game ignores. This tool
//! repurposes exactly one 8-byte hole to record a "signature" — a marker of
//! this tool's own authorship plus the file size at write time — so a
//! subsequent Recompress run can detect that nothing changed and skip the
//! archive entirely.

use crate::bitio::{read_u32_le, write_u32_le};
use crate::cc;

pub const HOLE_ENTRY_SIZE: usize = 8;
pub const SIGNATURE_SIZE: usize = 8;
pub const SIGNATURE_WORD: u32 = cc::make_four(b"BRG5");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hole {
    pub location: u32,
    pub size: u32,
}

impl Hole {
    #[must_use]
    pub fn parse(buf: &[u8]) -> Self {
        let mut pos = 0;
        let location = read_u32_le(buf, &mut pos);
        let size = read_u32_le(buf, &mut pos);
        Self { location, size }
    }

    #[must_use]
    pub fn serialize(&self) -> [u8; HOLE_ENTRY_SIZE] {
        let mut buf = [0u8; HOLE_ENTRY_SIZE];
        let mut pos = 0;
        write_u32_le(&mut buf, &mut pos, self.location);
        write_u32_le(&mut buf, &mut pos, self.size);
        buf
    }
}

/// Reads the tool's own signature out of an 8-byte hole payload at
/// `hole.location`, if `archive_bytes` is large enough and `hole.size == 8`.
/// Returns the file size the signature claims, for the caller to compare
/// against the archive's actual current size.
#[must_use]
pub fn read_signature(archive_bytes: &[u8], hole: &Hole) -> Option<u32> {
    if hole.size as usize != SIGNATURE_SIZE {
        return None;
    }
    let start = hole.location as usize;
    let end = start.checked_add(SIGNATURE_SIZE)?;
    let payload = archive_bytes.get(start..end)?;

    let mut pos = 0;
    let word = read_u32_le(payload, &mut pos);
    if word != SIGNATURE_WORD {
        return None;
    }
    Some(read_u32_le(payload, &mut pos))
}

/// Builds the 8-byte signature payload recorded at write time.
#[must_use]
pub fn build_signature(file_size: u32) -> [u8; SIGNATURE_SIZE] {
    let mut buf = [0u8; SIGNATURE_SIZE];
    let mut pos = 0;
    write_u32_le(&mut buf, &mut pos, SIGNATURE_WORD);
    write_u32_le(&mut buf, &mut pos, file_size);
    buf
}

#[cfg(test)]
mod tests {
    use super::{build_signature, read_signature, Hole};

    #[test]
    fn detects_matching_signature() {
        let mut archive = vec![0u8; 16];
        archive[8..16].copy_from_slice(&build_signature(16));
        let hole = Hole {
            location: 8,
            size: 8,
        };
        assert_eq!(read_signature(&archive, &hole), Some(16));
    }

    #[test]
    fn rejects_non_signature_hole() {
        let archive = vec![0u8; 16];
        let hole = Hole {
            location: 8,
            size: 8,
        };
        assert_eq!(read_signature(&archive, &hole), None);
    }

    #[test]
    fn rejects_wrong_size_hole() {
        let mut archive = vec![0u8; 16];
        archive[8..16].copy_from_slice(&build_signature(16));
        let hole = Hole {
            location: 8,
            size: 16,
        };
        assert_eq!(read_signature(&archive, &hole), None);
    }

    #[test]
    fn round_trips_entry() {
        let hole = Hole {
            location: 100,
            size: 8,
        };
        assert_eq!(Hole::parse(&hole.serialize()), hole);
    }
}
