//! Resource name hashing.
//!
//! The game refers to many resources by a 32-bit hash of their name instead
//! of the name itself. The hash is a plain base-127 polynomial over the name
//! bytes, so short names can be recovered exactly with [`unhash`].

/// Multiplier of the name hash polynomial.
pub const NAME_HASH_BASE: u32 = 127;

/// Hash a name, continuing from `initial`.
#[inline]
pub fn name_hash_with_seed(name: &[u8], initial: u32) -> u32 {
    name.iter().fold(initial, |hash, &b| {
        hash.wrapping_mul(NAME_HASH_BASE).wrapping_add(b as u32)
    })
}

/// Hash a name with a zero seed.
#[inline]
pub fn name_hash(name: &[u8]) -> u32 {
    name_hash_with_seed(name, 0)
}

/// Rebuild the shortest byte string hashing to `hash` with a zero seed.
///
/// This is exact for names of up to four bytes that did not overflow the
/// polynomial; longer names come back as a different string with the same hash.
pub fn unhash(hash: u32) -> Vec<u8> {
    let mut out = Vec::new();
    let mut rest = hash;
    while rest != 0 {
        out.push((rest % NAME_HASH_BASE) as u8);
        rest /= NAME_HASH_BASE;
    }
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_hash() {
        assert_eq!(name_hash(b""), 0);
        assert_eq!(name_hash_with_seed(b"", 42), 42);
    }

    #[test]
    fn test_known_hash() {
        // 'a' * 127 + 'b'
        assert_eq!(name_hash(b"ab"), 97 * 127 + 98);
    }

    #[test]
    fn test_seed_continues_hash() {
        let split = name_hash_with_seed(b"def", name_hash(b"abc"));
        assert_eq!(split, name_hash(b"abcdef"));
    }

    #[test]
    fn test_unhash_short_name() {
        assert_eq!(unhash(name_hash(b"hero")), b"hero");
        assert!(unhash(0).is_empty());
    }
}
