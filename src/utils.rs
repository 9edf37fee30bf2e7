/// Copy 4 bytes at `offset`. Callers have checked the slice length.
#[inline]
pub(crate) fn array_ref4(s: &[u8], offset: usize) -> [u8; 4] {
    [s[offset], s[offset + 1], s[offset + 2], s[offset + 3]]
}

/// Number of nanoseconds in one second
pub(crate) const NANOS_PER_SEC: u64 = 1_000_000_000;
