//! Key-to-bucket reduction.
//!
//! `bucket = xxh32(key, xxh32(type_bits, index_seed)) & (bucket_count - 1)`
//!
//! The index seed is the 32-bit identity hash of the index name, so equal
//! key bytes from different indexes land in unrelated buckets. The function
//! is pure: identical inputs produce identical buckets in both phases and
//! across runs.

use idxcheck_error::{IdxCheckError, Result};
use idxcheck_types::KeyString;
use xxhash_rust::xxh32::xxh32;

/// Seed used when hashing index names into their identity hash.
pub const INDEX_NAME_HASH_SEED: u32 = 0;

/// Stable 32-bit identity hash of an index name.
#[must_use]
pub fn index_name_hash(name: &str) -> u32 {
    xxh32(name.as_bytes(), INDEX_NAME_HASH_SEED)
}

/// Fold type bits then key bytes into a 32-bit hash seeded by `seed`.
#[must_use]
pub fn hash_key_string(key: &KeyString<'_>, seed: u32) -> u32 {
    let folded = xxh32(key.type_bits(), seed);
    xxh32(key.bytes(), folded)
}

/// Reduces seeded key hashes onto a power-of-two bucket table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyHasher {
    mask: u32,
}

impl KeyHasher {
    /// Build a hasher for `bucket_count` buckets.
    ///
    /// # Errors
    ///
    /// Returns [`IdxCheckError::InvalidConfig`] unless `bucket_count` is a
    /// nonzero power of two that fits in `u32`.
    pub fn new(bucket_count: usize) -> Result<Self> {
        let count = u32::try_from(bucket_count)
            .ok()
            .filter(|count| count.is_power_of_two())
            .ok_or_else(|| {
                IdxCheckError::invalid_config(
                    "bucket_count",
                    format!("{bucket_count} is not a power of two within u32"),
                )
            })?;
        Ok(Self { mask: count - 1 })
    }

    #[must_use]
    pub const fn bucket_count(&self) -> usize {
        self.mask as usize + 1
    }

    /// Bucket index for `key` under the index identity `seed`.
    #[must_use]
    pub fn bucket(&self, key: &KeyString<'_>, seed: u32) -> usize {
        (hash_key_string(key, seed) & self.mask) as usize
    }
}
