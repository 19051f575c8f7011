/// The (type, group, instance, resource) 4-tuple identifying a resource
/// within an archive. `resource` is only meaningful when the archive's
/// `indexMinorVersion == 2`; the reader and writer force it to `0` otherwise.
///
/// The distilled spec defines equality/hashing as an XOR of the four words.
/// This rewrite derives `Hash` normally instead (see DESIGN.md) — the XOR
/// scheme is weak (e.g. `(a, b, c, d)` and `(b, a, c, d)` collide) and the
/// spec's own Design Notes flag it as worth replacing in a rewrite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    pub type_id: u32,
    pub group_id: u32,
    pub instance_id: u32,
    pub resource_id: u32,
}

impl Key {
    #[must_use]
    pub fn new(type_id: u32, group_id: u32, instance_id: u32, resource_id: u32) -> Self {
        Self {
            type_id,
            group_id,
            instance_id,
            resource_id,
        }
    }

    /// The synthetic key the writer assigns to the directory-of-compressed-resources.
    #[must_use]
    pub fn clst() -> Self {
        Self::new(super::clst::CLST_TYPE, 0xE86B_1EEF, 0x286B_1F03, 0)
    }
}
