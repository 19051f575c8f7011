//! Re-parses a just-written archive and compares it against the pre-write
//! model: the primary integrity gate before the orchestrator persists the
//! output over the original file.

use crate::archive::{Archive, Mode};
use crate::error::{ValidationError, ValidationResult};
use crate::reader::try_read;
use crate::refpack;

fn logical_payload(bytes: &[u8], compressed: bool, uncompressed_size: u32) -> ValidationResult<Vec<u8>> {
    if compressed {
        Ok(refpack::decompress(bytes, uncompressed_size as usize)?)
    } else {
        Ok(bytes.to_vec())
    }
}

/// Validates `new_bytes` (the just-written archive) against `original`, the
/// archive model parsed from `source_bytes` before writing.
pub fn validate(
    new_bytes: &[u8],
    source_bytes: &[u8],
    original: &Archive,
    mode: Mode,
) -> ValidationResult<()> {
    let new_archive = try_read(new_bytes, Mode::Skip).map_err(|_| ValidationError::RewriteUnpacked)?;

    let original_header = original.header.serialize();
    let new_header = new_archive.header.serialize();
    if original_header[..36] != new_header[..36] || original_header[60..] != new_header[60..] {
        return Err(ValidationError::HeaderChanged);
    }

    if mode == Mode::Recompress {
        if new_archive.holes.len() != 1 || new_archive.holes[0].size != 8 {
            return Err(ValidationError::SignatureHoleCount(new_archive.holes.len()));
        }
        if !new_archive.signature_present {
            let reported = crate::hole::read_signature(new_bytes, &new_archive.holes[0]).unwrap_or(0);
            return Err(ValidationError::SignatureSizeMismatch {
                reported,
                actual: new_bytes.len() as u64,
            });
        }
    }

    if new_archive.entries.len() != original.entries.len() {
        return Err(ValidationError::EntryCountChanged {
            before: original.entries.len(),
            after: new_archive.entries.len(),
        });
    }

    for (index, (orig_entry, new_entry)) in original
        .entries
        .iter()
        .zip(new_archive.entries.iter())
        .enumerate()
    {
        if orig_entry.key != new_entry.key {
            return Err(ValidationError::EntryKeyChanged { index });
        }

        let new_payload = &new_bytes[new_entry.range()];
        let framing_present = new_payload.get(4..6) == Some(&refpack::header::SIGNATURE[..]);
        if framing_present != new_entry.compressed {
            return Err(ValidationError::ClstMembershipMismatch { index });
        }

        if new_entry.compressed {
            let (framing_compressed_size, framing_uncompressed_size) =
                refpack::header::parse(new_payload)?;
            if framing_uncompressed_size != new_entry.uncompressed_size {
                return Err(ValidationError::UncompressedSizeMismatch {
                    index,
                    clst: new_entry.uncompressed_size,
                    framing: framing_uncompressed_size,
                });
            }
            if framing_compressed_size != new_entry.size {
                return Err(ValidationError::CompressedSizeMismatch {
                    index,
                    index_size: new_entry.size,
                    framing: framing_compressed_size,
                });
            }
            if new_entry.size >= new_entry.uncompressed_size {
                return Err(ValidationError::NotSmaller {
                    index,
                    compressed: new_entry.size,
                    uncompressed: new_entry.uncompressed_size,
                });
            }
        }

        let orig_payload = &source_bytes[orig_entry.range()];
        let orig_logical =
            logical_payload(orig_payload, orig_entry.compressed, orig_entry.uncompressed_size)?;
        let new_logical =
            logical_payload(new_payload, new_entry.compressed, new_entry.uncompressed_size)?;
        if orig_logical != new_logical {
            return Err(ValidationError::PayloadMismatch { index });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate;
    use crate::archive::Mode;
    use crate::header::Header;
    use crate::reader::try_read;
    use crate::writer::write;
    use std::io::Cursor;

    fn empty_header() -> Header {
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
            index_entry_count: 0,
            index_location: 96,
            index_size: 0,
            hole_index_entry_count: 0,
            hole_index_location: 0,
            hole_index_size: 0,
            remainder: [0u8; 32],
        }
    }

    #[test]
    fn accepts_a_well_formed_rewrite() {
        let mut index_record = Vec::new();
        index_record.extend_from_slice(&1u32.to_le_bytes());
        index_record.extend_from_slice(&2u32.to_le_bytes());
        index_record.extend_from_slice(&3u32.to_le_bytes());
        index_record.extend_from_slice(&96u32.to_le_bytes());
        index_record.extend_from_slice(&4096u32.to_le_bytes());

        let mut header = empty_header();
        header.index_entry_count = 1;
        header.index_location = 96 + 4096;
        header.index_size = index_record.len() as u32;

        let mut source = header.serialize().to_vec();
        source.extend_from_slice(&vec![0u8; 4096]);
        source.extend_from_slice(&index_record);

        let archive = try_read(&source, Mode::Recompress).unwrap();
        let mut out = Cursor::new(Vec::new());
        write(&mut out, &source, &archive, Mode::Recompress).unwrap();
        let new_bytes = out.into_inner();

        assert!(validate(&new_bytes, &source, &archive, Mode::Recompress).is_ok());
    }

    #[test]
    fn rejects_a_truncated_rewrite() {
        let header = empty_header();
        let source = header.serialize().to_vec();
        let archive = try_read(&source, Mode::Recompress).unwrap();
        assert!(validate(&[], &source, &archive, Mode::Recompress).is_err());
    }
}
