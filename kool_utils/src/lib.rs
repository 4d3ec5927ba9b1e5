use std::hash::{Hash, Hasher};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic 64 bit content hash (FNV-1a).
///
/// Unlike [`std::collections::hash_map::DefaultHasher`], the result only depends on the bytes that
/// were fed into it, so two structurally identical descriptors hash equally no matter where or
/// when they were built. Anything implementing [`Hash`] can be pushed with [`LongHash::push`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LongHash {
    state: u64,
}

impl Default for LongHash {
    fn default() -> Self {
        Self::new()
    }
}

impl LongHash {
    pub const fn new() -> Self {
        LongHash {
            state: FNV_OFFSET_BASIS,
        }
    }

    #[inline]
    pub fn push<T: Hash + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.hash(self);
        self
    }

    #[inline]
    pub fn push_u64(&mut self, value: u64) -> &mut Self {
        self.write(&value.to_le_bytes());
        self
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.state
    }
}

impl Hasher for LongHash {
    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.state ^= *byte as u64;
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    // fixed width so the result doesn't depend on the target's pointer size
    #[inline]
    fn write_usize(&mut self, i: usize) {
        self.write(&(i as u64).to_le_bytes());
    }

    #[inline]
    fn write_isize(&mut self, i: isize) {
        self.write(&(i as i64).to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_hash_is_offset_basis() {
        assert_eq!(LongHash::new().hash(), FNV_OFFSET_BASIS);
    }

    #[test]
    fn same_input_same_hash() {
        let mut a = LongHash::new();
        a.push("uAlbedo").push(&3u32);
        let mut b = LongHash::new();
        b.push("uAlbedo").push(&3u32);

        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn order_matters() {
        let mut a = LongHash::new();
        a.push_u64(1).push_u64(2);
        let mut b = LongHash::new();
        b.push_u64(2).push_u64(1);

        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn string_boundaries_are_respected() {
        let mut a = LongHash::new();
        a.push("ab").push("c");
        let mut b = LongHash::new();
        b.push("a").push("bc");

        assert_ne!(a.hash(), b.hash());
    }
}
