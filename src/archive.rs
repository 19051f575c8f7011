//! The in-memory archive model assembled by the reader and consumed by the
//! writer and validator: the header, the non-CLST resource entries, the hole
//! table, and the directory-of-compressed-resources.

use crate::clst::Clst;
use crate::entry::Entry;
use crate::header::Header;
use crate::hole::Hole;

/// The transform the writer applies to every resource payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Decompress already-compressed entries, then compress whatever isn't
    /// already smaller compressed. Skips repeated-TGIR entries entirely.
    Recompress,
    /// Strip compression from every entry; write no CLST.
    Decompress,
    /// The orchestrator's signature-skip short-circuit. Never passed to the
    /// writer.
    Skip,
}

/// A parsed archive. `unpacked` mirrors the outcome of the reader: `false`
/// marks a sentinel value returned on any parse rejection, and every other
/// field on a rejected archive is meaningless.
#[derive(Clone, Debug)]
pub struct Archive {
    pub header: Header,
    pub entries: Vec<Entry>,
    pub holes: Vec<Hole>,
    pub clst: Clst,
    pub signature_present: bool,
    pub unpacked: bool,
}

impl Archive {
    #[must_use]
    pub fn rejected() -> Self {
        Self {
            header: Header::default(),
            entries: Vec::new(),
            holes: Vec::new(),
            clst: Clst::new(),
            signature_present: false,
            unpacked: false,
        }
    }
}
