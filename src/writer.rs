//! Re-emits a complete archive: header, transformed resource payloads, the
//! regenerated CLST, the resource index, and (in Recompress mode) the
//! signature hole.
//!
//! Entries are transformed independently in parallel (each worker borrows
//! only the immutable source slice), then appended to the destination by a
//! single thread in entry order — see DESIGN.md for why this replaces the
//! distilled spec's shared read-lock/write-lock design.

use crate::archive::{Archive, Mode};
use crate::clst::Clst;
use crate::entry::Entry;
use crate::error::WriteResult;
use crate::header::HEADER_SIZE;
use crate::hole::{build_signature, Hole};
use crate::key::Key;
use crate::refpack;
use rayon::prelude::*;
use std::io::{Seek, SeekFrom, Write};

struct Transformed {
    bytes: Vec<u8>,
    compressed: bool,
    uncompressed_size: u32,
}

fn transform_recompress(source: &[u8], entry: &Entry) -> Transformed {
    let original = source[entry.range()].to_vec();

    if entry.repeated {
        return Transformed {
            bytes: original,
            compressed: entry.compressed,
            uncompressed_size: entry.uncompressed_size,
        };
    }

    let decoded = if entry.compressed {
        match refpack::decompress(&original, entry.uncompressed_size as usize) {
            Ok(decoded) => decoded,
            Err(_) => {
                // Framing is valid but the content doesn't decode under this
                // codec; leave the payload untouched rather than risk
                // corrupting it.
                return Transformed {
                    bytes: original,
                    compressed: true,
                    uncompressed_size: entry.uncompressed_size,
                };
            }
        }
    } else {
        original.clone()
    };

    match refpack::compress(&decoded) {
        Some(compressed) if compressed.len() < original.len() => Transformed {
            uncompressed_size: decoded.len() as u32,
            bytes: compressed,
            compressed: true,
        },
        _ => Transformed {
            bytes: original,
            compressed: entry.compressed,
            uncompressed_size: entry.uncompressed_size,
        },
    }
}

fn transform_decompress(source: &[u8], entry: &Entry) -> WriteResult<Transformed> {
    let original = &source[entry.range()];
    if entry.compressed {
        let decoded = refpack::decompress(original, entry.uncompressed_size as usize)?;
        Ok(Transformed {
            bytes: decoded,
            compressed: false,
            uncompressed_size: 0,
        })
    } else {
        Ok(Transformed {
            bytes: original.to_vec(),
            compressed: false,
            uncompressed_size: 0,
        })
    }
}

fn transform_all(source: &[u8], archive: &Archive, mode: Mode) -> WriteResult<Vec<Transformed>> {
    match mode {
        Mode::Recompress => Ok(archive
            .entries
            .par_iter()
            .map(|entry| transform_recompress(source, entry))
            .collect()),
        Mode::Decompress => archive
            .entries
            .par_iter()
            .map(|entry| transform_decompress(source, entry))
            .collect(),
        Mode::Skip => unreachable!("the orchestrator never invokes the writer in Skip mode"),
    }
}

fn write_index_record(out: &mut Vec<u8>, key: Key, location: u32, size: u32, has_resource_id: bool) {
    out.extend_from_slice(&key.type_id.to_le_bytes());
    out.extend_from_slice(&key.group_id.to_le_bytes());
    out.extend_from_slice(&key.instance_id.to_le_bytes());
    if has_resource_id {
        out.extend_from_slice(&key.resource_id.to_le_bytes());
    }
    out.extend_from_slice(&location.to_le_bytes());
    out.extend_from_slice(&size.to_le_bytes());
}

/// Writes a full archive to `dest`. `source` is the original file's bytes
/// (borrowed from a memory map in the CLI); `archive` is the parsed model of
/// that same data.
pub fn write<W: Write + Seek>(dest: &mut W, source: &[u8], archive: &Archive, mode: Mode) -> WriteResult<()> {
    let transformed = transform_all(source, archive, mode)?;

    let mut header = archive.header;
    header.index_entry_count = 0;
    header.index_location = 0;
    header.index_size = 0;
    header.hole_index_entry_count = 0;
    header.hole_index_location = 0;
    header.hole_index_size = 0;
    dest.write_all(&header.serialize())?;

    let mut pos = HEADER_SIZE as u64;
    let mut new_entries = Vec::with_capacity(archive.entries.len());
    for (entry, t) in archive.entries.iter().zip(transformed.iter()) {
        dest.write_all(&t.bytes)?;
        new_entries.push(Entry {
            key: entry.key,
            location: pos as u32,
            size: t.bytes.len() as u32,
            uncompressed_size: t.uncompressed_size,
            compressed: t.compressed,
            repeated: entry.repeated,
        });
        pos += t.bytes.len() as u64;
    }

    let has_resource_id = header.has_resource_id();
    if new_entries.iter().any(|e| e.compressed) {
        let mut clst = Clst::new();
        for e in new_entries.iter().filter(|e| e.compressed) {
            clst.insert(e.key, e.uncompressed_size);
        }
        let payload = clst.serialize(has_resource_id);
        let clst_entry = Entry {
            key: Key::clst(),
            location: pos as u32,
            size: payload.len() as u32,
            uncompressed_size: 0,
            compressed: false,
            repeated: false,
        };
        dest.write_all(&payload)?;
        pos += payload.len() as u64;
        new_entries.push(clst_entry);
    }

    let index_location = pos;
    let mut index_bytes = Vec::with_capacity(new_entries.len() * header.index_stride() as usize);
    for e in &new_entries {
        write_index_record(&mut index_bytes, e.key, e.location, e.size, has_resource_id);
    }
    dest.write_all(&index_bytes)?;
    pos += index_bytes.len() as u64;

    header.index_entry_count = new_entries.len() as u32;
    header.index_location = index_location as u32;
    header.index_size = index_bytes.len() as u32;

    if mode == Mode::Recompress {
        let hole_index_location = pos;
        let hole_location = hole_index_location + 8;
        let final_size = hole_location + 8;

        dest.write_all(
            &Hole {
                location: hole_location as u32,
                size: 8,
            }
            .serialize(),
        )?;
        dest.write_all(&build_signature(final_size as u32))?;

        header.hole_index_entry_count = 1;
        header.hole_index_location = hole_index_location as u32;
        header.hole_index_size = 8;
    }

    dest.seek(SeekFrom::Start(0))?;
    dest.write_all(&header.serialize())?;

    Ok(())
}
