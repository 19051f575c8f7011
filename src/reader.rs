//! Parses an immutable byte view of an archive into the [`Archive`] model,
//! validating the data model's bounds invariants before handing back
//! `unpacked = true`.

use crate::archive::{Archive, Mode};
use crate::bitio::read_u32_le;
use crate::clst::{Clst, CLST_TYPE};
use crate::entry::Entry;
use crate::error::{ParseError, ParseResult};
use crate::header::Header;
use crate::hole::{read_signature, Hole, HOLE_ENTRY_SIZE};
use crate::key::Key;
use crate::refpack::header::SIGNATURE as REFPACK_SIGNATURE;
use std::collections::HashMap;

/// Parses `bytes` into an archive. Never fails: on any rejection it logs the
/// reason via `tracing` and returns [`Archive::rejected`].
#[must_use]
pub fn read(bytes: &[u8], mode: Mode, display_path: &str) -> Archive {
    match try_read(bytes, mode) {
        Ok(archive) => archive,
        Err(err) => {
            tracing::warn!(path = display_path, error = %err, "rejected archive");
            Archive::rejected()
        }
    }
}

/// The fallible core of [`read`], exposed directly for tests.
pub fn try_read(bytes: &[u8], mode: Mode) -> ParseResult<Archive> {
    let header = Header::parse(bytes)?;
    let file_size = bytes.len() as u64;

    let index_location = u64::from(header.index_location);
    let index_size = u64::from(header.index_size);
    if index_location + index_size > file_size {
        return Err(ParseError::IndexOutOfBounds {
            location: index_location,
            size: index_size,
            file_size,
        });
    }

    let hole_index_location = u64::from(header.hole_index_location);
    let hole_index_size = u64::from(header.hole_index_size);
    if hole_index_location + hole_index_size > file_size {
        return Err(ParseError::HoleIndexOutOfBounds {
            location: hole_index_location,
            size: hole_index_size,
            file_size,
        });
    }
    if u64::from(header.hole_index_entry_count) * 8 != u64::from(header.hole_index_size) {
        return Err(ParseError::HoleIndexSizeMismatch {
            count: header.hole_index_entry_count,
            size: header.hole_index_size,
        });
    }

    let stride = header.index_stride();
    if u64::from(header.index_entry_count) * u64::from(stride) > index_size {
        return Err(ParseError::IndexSizeMismatch {
            count: header.index_entry_count,
            size: header.index_size,
            stride,
        });
    }

    let holes = read_holes(bytes, &header)?;

    let signature_present = holes.len() == 1
        && holes[0].size == 8
        && read_signature(bytes, &holes[0]) == Some(file_size as u32);

    let (mut entries, clst_range) = read_index(bytes, &header, file_size)?;

    let clst = if let Some(range) = clst_range {
        Clst::parse(&bytes[range], header.has_resource_id())?
    } else {
        Clst::new()
    };

    for entry in &mut entries {
        if let Some(uncompressed_size) = clst.get(&entry.key) {
            let payload = &bytes[entry.range()];
            if payload.get(4..6) != Some(&REFPACK_SIGNATURE[..]) {
                return Err(ParseError::MissingFramingHeader {
                    location: u64::from(entry.location),
                });
            }
            entry.compressed = true;
            entry.uncompressed_size = uncompressed_size;
        }
    }

    if mode == Mode::Recompress {
        mark_repeated(&mut entries);
    }

    Ok(Archive {
        header,
        entries,
        holes,
        clst,
        signature_present,
        unpacked: true,
    })
}

fn read_holes(bytes: &[u8], header: &Header) -> ParseResult<Vec<Hole>> {
    let mut holes = Vec::with_capacity(header.hole_index_entry_count as usize);
    let base = header.hole_index_location as usize;
    for i in 0..header.hole_index_entry_count as usize {
        let start = base + i * HOLE_ENTRY_SIZE;
        let end = start + HOLE_ENTRY_SIZE;
        let record = bytes.get(start..end).ok_or(ParseError::Truncated {
            what: "hole index record",
            offset: start,
        })?;
        holes.push(Hole::parse(record));
    }
    Ok(holes)
}

/// Splits the index into non-CLST entries and the CLST payload's byte range,
/// if present.
fn read_index(
    bytes: &[u8],
    header: &Header,
    file_size: u64,
) -> ParseResult<(Vec<Entry>, Option<std::ops::Range<usize>>)> {
    let stride = header.index_stride() as usize;
    let base = header.index_location as usize;
    let has_resource_id = header.has_resource_id();

    let mut entries = Vec::with_capacity(header.index_entry_count as usize);
    let mut clst_range = None;

    for i in 0..header.index_entry_count as usize {
        let start = base + i * stride;
        let end = start + stride;
        let record = bytes.get(start..end).ok_or(ParseError::Truncated {
            what: "index record",
            offset: start,
        })?;

        let mut pos = 0;
        let type_id = read_u32_le(record, &mut pos);
        let group_id = read_u32_le(record, &mut pos);
        let instance_id = read_u32_le(record, &mut pos);
        let resource_id = if has_resource_id {
            read_u32_le(record, &mut pos)
        } else {
            0
        };
        let location = read_u32_le(record, &mut pos);
        let size = read_u32_le(record, &mut pos);

        let location_u64 = u64::from(location);
        let size_u64 = u64::from(size);
        if location_u64 + size_u64 > file_size {
            return Err(ParseError::EntryOutOfBounds {
                location: location_u64,
                size: size_u64,
                file_size,
            });
        }

        let key = Key::new(type_id, group_id, instance_id, resource_id);
        if type_id == CLST_TYPE {
            clst_range = Some(location as usize..(location as usize + size as usize));
        } else {
            entries.push(Entry::new(key, location, size));
        }
    }

    Ok((entries, clst_range))
}

fn mark_repeated(entries: &mut [Entry]) {
    let mut first_seen: HashMap<Key, usize> = HashMap::new();
    let mut repeated_indices = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        if let Some(&first) = first_seen.get(&entry.key) {
            repeated_indices.push(first);
            repeated_indices.push(i);
        } else {
            first_seen.insert(entry.key, i);
        }
    }
    for i in repeated_indices {
        entries[i].repeated = true;
    }
}

#[cfg(test)]
mod tests {
    use super::try_read;
    use crate::archive::Mode;
    use crate::clst::{Clst, CLST_TYPE};
    use crate::error::ParseError;
    use crate::header::Header;
    use crate::key::Key;

    fn base_header(entry_count: u32, index_location: u32, index_size: u32) -> Header {
        Header {
            major_version: 1,
            minor_version: 1,
            major_user_version: 0,
            minor_user_version: 0,
            flags: 0,
            created_date: 0,
            modified_date: 0,
            index_major_version: 7,
            index_minor_version: 0,
            index_entry_count: entry_count,
            index_location,
            index_size,
            hole_index_entry_count: 0,
            hole_index_location: 0,
            hole_index_size: 0,
            remainder: [0u8; 32],
        }
    }

    #[test]
    fn reads_empty_archive() {
        let header = base_header(0, 96, 0);
        let bytes = header.serialize().to_vec();
        let archive = try_read(&bytes, Mode::Recompress).unwrap();
        assert!(archive.unpacked);
        assert!(archive.entries.is_empty());
        assert!(archive.holes.is_empty());
    }

    #[test]
    fn detects_stale_signature_as_absent() {
        use crate::hole::build_signature;

        let sig_location = 96u32;
        let hole_index_location = sig_location + 8;
        let total_size = hole_index_location + 8;

        let mut header = base_header(0, total_size, 0);
        header.hole_index_entry_count = 1;
        header.hole_index_location = hole_index_location;
        header.hole_index_size = 8;

        let mut bytes = header.serialize().to_vec();
        bytes.extend_from_slice(&build_signature(total_size + 1)); // claims the wrong size
        bytes.extend_from_slice(
            &crate::hole::Hole {
                location: sig_location,
                size: 8,
            }
            .serialize(),
        );

        let archive = try_read(&bytes, Mode::Recompress).unwrap();
        assert_eq!(archive.holes.len(), 1);
        assert!(!archive.signature_present);
    }

    fn index_record(type_id: u32, group_id: u32, instance_id: u32, location: u32, size: u32) -> Vec<u8> {
        let mut record = Vec::with_capacity(20);
        record.extend_from_slice(&type_id.to_le_bytes());
        record.extend_from_slice(&group_id.to_le_bytes());
        record.extend_from_slice(&instance_id.to_le_bytes());
        record.extend_from_slice(&location.to_le_bytes());
        record.extend_from_slice(&size.to_le_bytes());
        record
    }

    #[test]
    fn reads_single_uncompressed_entry() {
        let payload = vec![0xABu8; 64];
        let entry_location = 96u32;
        let index_location = entry_location + payload.len() as u32;
        let index = index_record(1, 2, 3, entry_location, payload.len() as u32);

        let mut header = base_header(1, index_location, index.len() as u32);
        header.index_minor_version = 0;
        let mut bytes = header.serialize().to_vec();
        bytes.extend_from_slice(&payload);
        bytes.extend_from_slice(&index);

        let archive = try_read(&bytes, Mode::Recompress).unwrap();
        assert!(archive.unpacked);
        assert_eq!(archive.entries.len(), 1);
        assert_eq!(archive.entries[0].key, Key::new(1, 2, 3, 0));
        assert!(!archive.entries[0].compressed);
    }

    #[test]
    fn marks_repeated_tgir_in_recompress_mode() {
        let payload_a = vec![1u8, 2, 3, 4];
        let payload_b = vec![5u8, 6, 7, 8];
        let loc_a = 96u32;
        let loc_b = loc_a + payload_a.len() as u32;
        let index_location = loc_b + payload_b.len() as u32;

        let mut index = Vec::new();
        index.extend_from_slice(&index_record(1, 2, 3, loc_a, payload_a.len() as u32));
        index.extend_from_slice(&index_record(1, 2, 3, loc_b, payload_b.len() as u32));

        let mut header = base_header(2, index_location, index.len() as u32);
        header.index_minor_version = 0;
        let mut bytes = header.serialize().to_vec();
        bytes.extend_from_slice(&payload_a);
        bytes.extend_from_slice(&payload_b);
        bytes.extend_from_slice(&index);

        let archive = try_read(&bytes, Mode::Recompress).unwrap();
        assert_eq!(archive.entries.len(), 2);
        assert!(archive.entries[0].repeated);
        assert!(archive.entries[1].repeated);
    }

    #[test]
    fn rejects_out_of_bounds_index() {
        let header = base_header(1, 1_000_000, 20);
        let bytes = header.serialize().to_vec();
        assert!(try_read(&bytes, Mode::Recompress).is_err());
    }

    #[test]
    fn parses_clst_and_marks_compressed_entries() {
        let mut clst = Clst::new();
        let key = Key::new(10, 20, 30, 0);
        clst.insert(key, 4096);
        let clst_payload = clst.serialize(false);

        let entry_payload = vec![0x00u8, 0x00, 0x00, 0x00, 0x10, 0xFB, 0, 0, 0];
        let entry_location = 96u32;
        let clst_location = entry_location + entry_payload.len() as u32;
        let index_location = clst_location + clst_payload.len() as u32;

        let mut index = Vec::new();
        index.extend_from_slice(&index_record(
            10,
            20,
            30,
            entry_location,
            entry_payload.len() as u32,
        ));
        index.extend_from_slice(&index_record(
            CLST_TYPE,
            CLST_TYPE,
            0x286B_1F03,
            clst_location,
            clst_payload.len() as u32,
        ));

        let mut header = base_header(2, index_location, index.len() as u32);
        header.index_minor_version = 0;
        let mut bytes = header.serialize().to_vec();
        bytes.extend_from_slice(&entry_payload);
        bytes.extend_from_slice(&clst_payload);
        bytes.extend_from_slice(&index);

        let archive = try_read(&bytes, Mode::Recompress).unwrap();
        assert_eq!(archive.entries.len(), 1);
        assert!(archive.entries[0].compressed);
        assert_eq!(archive.entries[0].uncompressed_size, 4096);
    }

    #[test]
    fn rejects_clst_entry_missing_framing_header() {
        let mut clst = Clst::new();
        let key = Key::new(10, 20, 30, 0);
        clst.insert(key, 4096);
        let clst_payload = clst.serialize(false);

        // No 0x10 0xFB at bytes 4..6: the CLST claims this entry is
        // compressed, but its payload carries no refpack framing header.
        let entry_payload = vec![0x00u8, 0x00, 0x00, 0x00, 0x00, 0x00, 0, 0, 0];
        let entry_location = 96u32;
        let clst_location = entry_location + entry_payload.len() as u32;
        let index_location = clst_location + clst_payload.len() as u32;

        let mut index = Vec::new();
        index.extend_from_slice(&index_record(
            10,
            20,
            30,
            entry_location,
            entry_payload.len() as u32,
        ));
        index.extend_from_slice(&index_record(
            CLST_TYPE,
            CLST_TYPE,
            0x286B_1F03,
            clst_location,
            clst_payload.len() as u32,
        ));

        let mut header = base_header(2, index_location, index.len() as u32);
        header.index_minor_version = 0;
        let mut bytes = header.serialize().to_vec();
        bytes.extend_from_slice(&entry_payload);
        bytes.extend_from_slice(&clst_payload);
        bytes.extend_from_slice(&index);

        let err = try_read(&bytes, Mode::Recompress).unwrap_err();
        assert!(matches!(err, ParseError::MissingFramingHeader { .. }));
    }
}
