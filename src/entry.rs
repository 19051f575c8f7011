use crate::key::Key;

/// One resource's slot in the archive's index: where its payload lives, how
/// big it is, and its compression state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub key: Key,
    pub location: u32,
    pub size: u32,
    /// Only meaningful when `compressed`.
    pub uncompressed_size: u32,
    /// Derived from presence in the CLST directory, not from any bit in the
    /// index record itself.
    pub compressed: bool,
    /// Set when another entry in the same archive shares this entry's key.
    /// Repeated entries are never recompressed: their payloads may alias or
    /// differ, so the writer cannot assume they are interchangeable.
    pub repeated: bool,
}

impl Entry {
    #[must_use]
    pub fn new(key: Key, location: u32, size: u32) -> Self {
        Self {
            key,
            location,
            size,
            uncompressed_size: 0,
            compressed: false,
            repeated: false,
        }
    }

    #[must_use]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.location as usize..(self.location as usize + self.size as usize)
    }
}
