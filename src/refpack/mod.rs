//! QFS/RefPack: a byte-oriented LZ77 codec used for individual resource
//! payloads. A compressed payload is a 9-byte framing header followed by a
//! stream of opcodes, each describing a literal run and/or a back-reference
//! copy.

mod compress;
mod decompress;
pub mod header;

pub use compress::compress;
pub use decompress::decompress;
pub use header::SIZE as FRAMING_HEADER_SIZE;
