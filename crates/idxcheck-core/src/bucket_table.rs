//! Fixed-size signed counter table used for approximate diffing.
//!
//! Phase 1 adds `+1` per document-derived key and `-1` per index-derived key
//! to the bucket the key hashes into. The table length is independent of
//! collection size, so memory stays bounded at the price of aliasing:
//! - a nonzero bucket proves at least one inconsistency among its keys;
//! - a zero bucket does not prove consistency (opposite errors can cancel).

use idxcheck_error::{IdxCheckError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketCounterTable {
    counts: Vec<i64>,
}

impl BucketCounterTable {
    /// Create a zeroed table of `bucket_count` buckets.
    ///
    /// # Errors
    ///
    /// Returns [`IdxCheckError::InvalidConfig`] when `bucket_count == 0`.
    pub fn new(bucket_count: usize) -> Result<Self> {
        if bucket_count == 0 {
            return Err(IdxCheckError::invalid_config(
                "bucket_count",
                "counter table needs at least one bucket",
            ));
        }
        Ok(Self {
            counts: vec![0; bucket_count],
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Count a document-derived key.
    pub fn increment(&mut self, bucket: usize) {
        let slot = &mut self.counts[bucket];
        *slot = slot.wrapping_add(1);
    }

    /// Count an index-derived key.
    pub fn decrement(&mut self, bucket: usize) {
        let slot = &mut self.counts[bucket];
        *slot = slot.wrapping_sub(1);
    }

    #[must_use]
    pub fn count(&self, bucket: usize) -> i64 {
        self.counts[bucket]
    }

    /// Whether the bucket is proven to hold an inconsistency.
    #[must_use]
    pub fn is_flagged(&self, bucket: usize) -> bool {
        self.counts[bucket] != 0
    }

    #[must_use]
    pub fn has_any_mismatch(&self) -> bool {
        self.counts.iter().any(|&count| count != 0)
    }

    #[must_use]
    pub fn flagged_buckets(&self) -> usize {
        self.counts.iter().filter(|&&count| count != 0).count()
    }
}
