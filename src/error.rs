use std::io;

/// Why the reader rejected an archive. A `ParseError` never propagates past
/// the reader: it is folded into a sentinel [`crate::Archive`] with
/// `unpacked = false`, and the orchestrator prints it and moves to the next
/// file.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("archive too small to hold a header: {0} bytes")]
    TooSmall(usize),

    #[error("invalid magic read from header: {0:?}")]
    InvalidMagic([u8; 4]),

    #[error("invalid major version read from header: {0}")]
    InvalidMajorVersion(u32),

    #[error("invalid minor version read from header: {0}")]
    InvalidMinorVersion(u32),

    #[error("invalid index major version read from header: {0}")]
    InvalidIndexMajorVersion(u32),

    #[error("invalid index minor version read from header: {0}")]
    InvalidIndexMinorVersion(u32),

    #[error("index location {location} + size {size} exceeds file size {file_size}")]
    IndexOutOfBounds {
        location: u64,
        size: u64,
        file_size: u64,
    },

    #[error("hole index location {location} + size {size} exceeds file size {file_size}")]
    HoleIndexOutOfBounds {
        location: u64,
        size: u64,
        file_size: u64,
    },

    #[error("hole index entry count {count} disagrees with hole index size {size}")]
    HoleIndexSizeMismatch { count: u32, size: u32 },

    #[error("index entry count {count} does not fit within index size {size} at stride {stride}")]
    IndexSizeMismatch { count: u32, size: u32, stride: u32 },

    #[error("entry location {location} + size {size} exceeds file size {file_size}")]
    EntryOutOfBounds {
        location: u64,
        size: u64,
        file_size: u64,
    },

    #[error("compressed entry at location {location} is missing a valid RefPack framing header")]
    MissingFramingHeader { location: u64 },

    #[error("truncated read while parsing {what} at offset {offset}")]
    Truncated { what: &'static str, offset: usize },
}

/// Errors raised by the RefPack codec itself.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("refpack stream is corrupted: {reason}")]
    CorruptedStream { reason: &'static str },

    #[error("decompressed length {actual} does not match declared length {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

pub type ParseResult<T> = Result<T, ParseError>;
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while writing a new archive.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type WriteResult<T> = Result<T, WriteError>;

/// Why the validator rejected a just-written archive.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("rewritten archive failed to parse")]
    RewriteUnpacked,

    #[error("header bytes outside the index/hole-index fields changed")]
    HeaderChanged,

    #[error("expected exactly one signature hole of size 8, found {0}")]
    SignatureHoleCount(usize),

    #[error("signature hole reports file size {reported} but the file is {actual} bytes")]
    SignatureSizeMismatch { reported: u32, actual: u64 },

    #[error("entry count changed: {before} before, {after} after")]
    EntryCountChanged { before: usize, after: usize },

    #[error("entry {index} key changed")]
    EntryKeyChanged { index: usize },

    #[error("entry {index} CLST membership disagrees with its framing header")]
    ClstMembershipMismatch { index: usize },

    #[error("entry {index} uncompressed size in CLST ({clst}) disagrees with framing header ({framing})")]
    UncompressedSizeMismatch {
        index: usize,
        clst: u32,
        framing: u32,
    },

    #[error("entry {index} index-reported size ({index_size}) disagrees with framing header compressed size ({framing})")]
    CompressedSizeMismatch {
        index: usize,
        index_size: u32,
        framing: u32,
    },

    #[error("entry {index} compressed size {compressed} is not smaller than uncompressed size {uncompressed}")]
    NotSmaller {
        index: usize,
        compressed: u32,
        uncompressed: u32,
    },

    #[error("entry {index} decompressed payload differs from the source archive")]
    PayloadMismatch { index: usize },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Top-level per-archive error aggregating every stage, consumed by the
/// orchestrator's single `Result` per candidate file.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;
