//! The directory-of-compressed-resources ("CLST"): a resource, stored inside
//! the archive itself, that enumerates every compressed entry's key and
//! uncompressed size. The reader consumes it into a plain set; the writer
//! regenerates it from scratch and re-materializes it as a resource only at
//! write time (see DESIGN.md, "CLST-as-resource").

use crate::bitio::{read_u32_le, write_u32_le};
use crate::error::{ParseError, ParseResult};
use crate::key::Key;
use std::collections::HashMap;

/// Resource type identifying the CLST payload within the index.
pub const CLST_TYPE: u32 = 0xE86B_1EEF;

/// The parsed directory-of-compressed-resources: key -> declared uncompressed size.
#[derive(Clone, Debug, Default)]
pub struct Clst {
    entries: HashMap<Key, u32>,
}

impl Clst {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &Key) -> Option<u32> {
        self.entries.get(key).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, key: Key, uncompressed_size: u32) {
        self.entries.insert(key, uncompressed_size);
    }

    /// Parses a CLST payload. Each record is 4 little-endian u32 fields
    /// (type, group, instance, [resource if `has_resource_id`]) followed by
    /// the uncompressed size.
    pub fn parse(payload: &[u8], has_resource_id: bool) -> ParseResult<Self> {
        let stride = if has_resource_id { 20 } else { 16 };
        if payload.len() % stride != 0 {
            return Err(ParseError::Truncated {
                what: "CLST record",
                offset: payload.len(),
            });
        }

        let mut clst = Self::new();
        let mut pos = 0;
        while pos < payload.len() {
            let type_id = read_u32_le(payload, &mut pos);
            let group_id = read_u32_le(payload, &mut pos);
            let instance_id = read_u32_le(payload, &mut pos);
            let resource_id = if has_resource_id {
                read_u32_le(payload, &mut pos)
            } else {
                0
            };
            let uncompressed_size = read_u32_le(payload, &mut pos);
            clst.insert(
                Key::new(type_id, group_id, instance_id, resource_id),
                uncompressed_size,
            );
        }
        Ok(clst)
    }

    /// Serializes the directory in iteration order (sorted by key, for
    /// deterministic output across runs).
    #[must_use]
    pub fn serialize(&self, has_resource_id: bool) -> Vec<u8> {
        let stride = if has_resource_id { 20 } else { 16 };
        let mut out = vec![0u8; self.entries.len() * stride];
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by_key(|(key, _)| **key);

        let mut pos = 0;
        for (key, uncompressed_size) in sorted {
            write_u32_le(&mut out, &mut pos, key.type_id);
            write_u32_le(&mut out, &mut pos, key.group_id);
            write_u32_le(&mut out, &mut pos, key.instance_id);
            if has_resource_id {
                write_u32_le(&mut out, &mut pos, key.resource_id);
            }
            write_u32_le(&mut out, &mut pos, *uncompressed_size);
        }
        out
    }
}
