#[must_use]
pub(crate) const fn make_four(cc: &[u8]) -> u32 {
    let buffer = match cc.len() {
        0 => [0, 0, 0, 0],
        1 => [cc[0], 0, 0, 0],
        2 => [cc[0], cc[1], 0, 0],
        3 => [cc[0], cc[1], cc[2], 0],
        _ => [cc[0], cc[1], cc[2], cc[3]],
    };
    u32::from_le_bytes(buffer)
}

#[test]
fn test() {
    assert_eq!(make_four(b""), 0x0000_0000);
    assert_eq!(make_four(b"A"), 0x0000_0041);
    assert_eq!(make_four(b"DBPF"), 0x4650_4244);
}
