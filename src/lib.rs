#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

//! Reads DBPF game-asset archives, recompresses or decompresses their
//! resources with the QFS/RefPack block codec, and writes back a
//! byte-equivalent archive.

pub mod archive;
pub mod bitio;
mod cc;
pub mod clst;
pub mod entry;
pub mod error;
pub mod header;
pub mod hole;
pub mod key;
pub mod reader;
pub mod refpack;
pub mod validator;
pub mod writer;

pub use archive::{Archive, Mode};
pub use error::{ArchiveError, CodecError, ParseError, ValidationError, WriteError};
pub use key::Key;

pub mod prelude {
    pub use crate::{Archive, ArchiveError, Key, Mode};
}
