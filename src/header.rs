//! The fixed 96-byte DBPF header: magic, versions, and the location/size
//! fields for the resource index and hole index.

use crate::bitio::{read_u32_le, write_u32_le};
use crate::cc;
use crate::error::{ParseError, ParseResult};

pub const HEADER_SIZE: usize = 96;
pub const MAGIC: u32 = cc::make_four(b"DBPF");

/// Offset of the first field the writer rewrites in place once the final
/// index/hole-index layout is known.
pub const PATCH_OFFSET: usize = 36;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub major_version: u32,
    pub minor_version: u32,
    pub major_user_version: u32,
    pub minor_user_version: u32,
    pub flags: u32,
    pub created_date: u32,
    pub modified_date: u32,
    pub index_major_version: u32,
    pub index_minor_version: u32,
    pub index_entry_count: u32,
    pub index_location: u32,
    pub index_size: u32,
    pub hole_index_entry_count: u32,
    pub hole_index_location: u32,
    pub hole_index_size: u32,
    /// Bytes 64–95, preserved verbatim across reads and writes.
    pub remainder: [u8; 32],
}

impl Header {
    /// Index entry stride in bytes: 24 when `indexMinorVersion == 2` (a 4th
    /// TGIR field is present), 20 otherwise.
    #[must_use]
    pub fn index_stride(&self) -> u32 {
        if self.index_minor_version == 2 {
            24
        } else {
            20
        }
    }

    #[must_use]
    pub fn has_resource_id(&self) -> bool {
        self.index_minor_version == 2
    }

    pub fn parse(buf: &[u8]) -> ParseResult<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(ParseError::TooSmall(buf.len()));
        }

        let mut pos = 0;
        let magic = read_u32_le(buf, &mut pos);
        if magic != MAGIC {
            return Err(ParseError::InvalidMagic(magic.to_le_bytes()));
        }

        let major_version = read_u32_le(buf, &mut pos);
        if major_version != 1 {
            return Err(ParseError::InvalidMajorVersion(major_version));
        }
        let minor_version = read_u32_le(buf, &mut pos);
        if minor_version > 2 {
            return Err(ParseError::InvalidMinorVersion(minor_version));
        }

        let major_user_version = read_u32_le(buf, &mut pos);
        let minor_user_version = read_u32_le(buf, &mut pos);
        let flags = read_u32_le(buf, &mut pos);
        let created_date = read_u32_le(buf, &mut pos);
        let modified_date = read_u32_le(buf, &mut pos);

        let index_major_version = read_u32_le(buf, &mut pos);
        if index_major_version != 7 {
            return Err(ParseError::InvalidIndexMajorVersion(index_major_version));
        }

        let index_entry_count = read_u32_le(buf, &mut pos);
        let index_location = read_u32_le(buf, &mut pos);
        let index_size = read_u32_le(buf, &mut pos);
        let hole_index_entry_count = read_u32_le(buf, &mut pos);
        let hole_index_location = read_u32_le(buf, &mut pos);
        let hole_index_size = read_u32_le(buf, &mut pos);
        let index_minor_version = read_u32_le(buf, &mut pos);
        if index_minor_version > 2 {
            return Err(ParseError::InvalidIndexMinorVersion(index_minor_version));
        }

        let mut remainder = [0u8; 32];
        remainder.copy_from_slice(&buf[64..96]);

        Ok(Self {
            major_version,
            minor_version,
            major_user_version,
            minor_user_version,
            flags,
            created_date,
            modified_date,
            index_major_version,
            index_minor_version,
            index_entry_count,
            index_location,
            index_size,
            hole_index_entry_count,
            hole_index_location,
            hole_index_size,
            remainder,
        })
    }

    /// Writes the full 96-byte header, including the index/hole-index fields
    /// as they currently stand. The writer calls this once up front with
    /// placeholder zeros, then patches bytes `PATCH_OFFSET..64` in place once
    /// the true layout is known.
    #[must_use]
    pub fn serialize(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        let mut pos = 0;
        write_u32_le(&mut buf, &mut pos, MAGIC);
        write_u32_le(&mut buf, &mut pos, self.major_version);
        write_u32_le(&mut buf, &mut pos, self.minor_version);
        write_u32_le(&mut buf, &mut pos, self.major_user_version);
        write_u32_le(&mut buf, &mut pos, self.minor_user_version);
        write_u32_le(&mut buf, &mut pos, self.flags);
        write_u32_le(&mut buf, &mut pos, self.created_date);
        write_u32_le(&mut buf, &mut pos, self.modified_date);
        write_u32_le(&mut buf, &mut pos, self.index_major_version);
        debug_assert_eq!(pos, PATCH_OFFSET);
        write_u32_le(&mut buf, &mut pos, self.index_entry_count);
        write_u32_le(&mut buf, &mut pos, self.index_location);
        write_u32_le(&mut buf, &mut pos, self.index_size);
        write_u32_le(&mut buf, &mut pos, self.hole_index_entry_count);
        write_u32_le(&mut buf, &mut pos, self.hole_index_location);
        write_u32_le(&mut buf, &mut pos, self.hole_index_size);
        write_u32_le(&mut buf, &mut pos, self.index_minor_version);
        debug_assert_eq!(pos, 64);
        buf[64..96].copy_from_slice(&self.remainder);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::Header;

    fn sample() -> Header {
        Header {
            major_version: 1,
            minor_version: 1,
            major_user_version: 0,
            minor_user_version: 0,
            flags: 0,
            created_date: 0,
            modified_date: 0,
            index_major_version: 7,
            index_minor_version: 2,
            index_entry_count: 3,
            index_location: 96,
            index_size: 72,
            hole_index_entry_count: 1,
            hole_index_location: 200,
            hole_index_size: 8,
            remainder: [0xAB; 32],
        }
    }

    #[test]
    fn round_trips() {
        let header = sample();
        let bytes = header.serialize();
        let parsed = Header::parse(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn index_stride_depends_on_minor_version() {
        let mut header = sample();
        header.index_minor_version = 2;
        assert_eq!(header.index_stride(), 24);
        header.index_minor_version = 1;
        assert_eq!(header.index_stride(), 20);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = sample().serialize();
        bytes[0] = b'X';
        assert!(Header::parse(&bytes).is_err());
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(Header::parse(&[0u8; 10]).is_err());
    }
}
