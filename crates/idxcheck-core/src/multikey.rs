//! Multikey metadata path markers.
//!
//! Each index keeps a set of hashed array-path descriptors. The scan driver
//! adds a marker for every multikey metadata key it finds in the index and
//! removes one for every path the documents prove multikey; the leftover
//! cardinality is what it cross-checks. The checker only stores the set.

use hashbrown::HashSet;
use idxcheck_types::KeyString;

use crate::hasher::KeyHasher;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultikeyPaths {
    hashed: HashSet<usize>,
}

impl MultikeyPaths {
    /// Insert the marker for `path`. Returns `false` if it was already present.
    pub fn add(&mut self, hasher: &KeyHasher, path: &KeyString<'_>, seed: u32) -> bool {
        self.hashed.insert(hasher.bucket(path, seed))
    }

    /// Erase the marker for `path`. Returns `false` if it was absent.
    pub fn remove(&mut self, hasher: &KeyHasher, path: &KeyString<'_>, seed: u32) -> bool {
        self.hashed.remove(&hasher.bucket(path, seed))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hashed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hashed.is_empty()
    }
}
