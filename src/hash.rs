//! Shard routing hash.
//!
//! A 32-bit FNV variant that multiplies *before* XOR-ing each byte. This is not
//! textbook FNV-1a (which XORs first), and the order matters: shard placement
//! must reproduce the same hashes for the same canonical keys everywhere.

/// FNV 32-bit offset basis.
pub const OFFSET_BASIS: u32 = 2_166_136_261;

/// FNV 32-bit prime.
pub const PRIME: u32 = 16_777_619;

/// Hash a canonical key.
///
/// ```rust
/// use fnvshard::hash::fnv1a32;
///
/// assert_eq!(fnv1a32("test_string"), 2_101_758_991);
/// assert_eq!(fnv1a32("42"), 494_316_163);
/// ```
#[inline]
pub fn fnv1a32(canonical: &str) -> u32 {
    canonical.bytes().fold(OFFSET_BASIS, |hash, byte| {
        hash.wrapping_mul(PRIME) ^ u32::from(byte)
    })
}

/// Map a hash onto one of `shard_count` shards.
#[inline]
pub fn shard_index(hash: u32, shard_count: usize) -> usize {
    debug_assert!(shard_count > 0);
    hash as usize % shard_count
}
