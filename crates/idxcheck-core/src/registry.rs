//! Per-index bookkeeping for one validation run.
//!
//! The registry is built once from the catalog's index list and is the sole
//! owner of index metadata for the run. Everything else refers to an index
//! through an [`IndexHandle`]. Indexes cannot be added or removed afterwards.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use idxcheck_error::{IdxCheckError, Result};
use idxcheck_types::{IndexDescriptor, IndexHandle};
use serde::{Deserialize, Serialize};

use crate::hasher::index_name_hash;
use crate::multikey::MultikeyPaths;

/// Index name -> whether the index is still considered valid.
pub type IndexValidityMap = BTreeMap<String, bool>;

/// Running counters for one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexCounters {
    /// Index-derived keys counted in phase 1.
    pub keys: u64,
    /// Oversized keys recorded by the driver.
    pub long_keys: u64,
    /// Document-derived keys counted in phase 1, plus oversized keys.
    pub records: u64,
}

#[derive(Debug, Clone)]
pub struct IndexInfo {
    name: String,
    key_pattern: Vec<String>,
    name_hash: u32,
    ready: bool,
    scan_finished: bool,
    counters: IndexCounters,
    multikey_paths: MultikeyPaths,
}

impl IndexInfo {
    fn from_descriptor(descriptor: IndexDescriptor) -> Self {
        let name_hash = index_name_hash(&descriptor.name);
        Self {
            name: descriptor.name,
            key_pattern: descriptor.key_pattern,
            name_hash,
            ready: descriptor.ready,
            scan_finished: false,
            counters: IndexCounters::default(),
            multikey_paths: MultikeyPaths::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn key_pattern(&self) -> &[String] {
        &self.key_pattern
    }

    /// Identity hash of the name; seeds every key hash for this index.
    #[must_use]
    pub const fn name_hash(&self) -> u32 {
        self.name_hash
    }

    /// Readiness at registry construction. Unready indexes are ignored.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub const fn scan_finished(&self) -> bool {
        self.scan_finished
    }

    #[must_use]
    pub const fn counters(&self) -> IndexCounters {
        self.counters
    }

    #[must_use]
    pub const fn multikey_paths(&self) -> &MultikeyPaths {
        &self.multikey_paths
    }

    pub(crate) fn multikey_paths_mut(&mut self) -> &mut MultikeyPaths {
        &mut self.multikey_paths
    }

    pub(crate) fn count_document_key(&mut self) {
        self.counters.records = self.counters.records.saturating_add(1);
    }

    pub(crate) fn count_index_key(&mut self) {
        self.counters.keys = self.counters.keys.saturating_add(1);
    }

    pub(crate) fn count_long_key(&mut self) {
        self.counters.records = self.counters.records.saturating_add(1);
        self.counters.long_keys = self.counters.long_keys.saturating_add(1);
    }

    pub(crate) fn mark_scan_finished(&mut self) {
        self.scan_finished = true;
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexRegistry {
    indexes: Vec<IndexInfo>,
    by_name: HashMap<String, IndexHandle>,
}

impl IndexRegistry {
    /// Freeze the index set for a run. Handles follow descriptor order.
    ///
    /// # Errors
    ///
    /// Returns [`IdxCheckError::DuplicateIndexName`] if two descriptors share
    /// a name.
    pub fn from_descriptors<I>(descriptors: I) -> Result<Self>
    where
        I: IntoIterator<Item = IndexDescriptor>,
    {
        let mut registry = Self::default();
        for descriptor in descriptors {
            let slot = u32::try_from(registry.indexes.len())
                .map_err(|_| IdxCheckError::internal("index count overflowed u32"))?;
            let handle = IndexHandle::new(slot);
            if registry.by_name.contains_key(&descriptor.name) {
                return Err(IdxCheckError::DuplicateIndexName {
                    name: descriptor.name,
                });
            }
            registry.by_name.insert(descriptor.name.clone(), handle);
            registry.indexes.push(IndexInfo::from_descriptor(descriptor));
        }
        Ok(registry)
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<IndexHandle> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, handle: IndexHandle) -> Result<&IndexInfo> {
        self.indexes
            .get(handle.slot())
            .ok_or(IdxCheckError::UnknownIndexHandle {
                handle: handle.get(),
            })
    }

    pub fn name(&self, handle: IndexHandle) -> Result<&str> {
        Ok(self.get(handle)?.name())
    }

    pub(crate) fn get_mut(&mut self, handle: IndexHandle) -> Result<&mut IndexInfo> {
        self.indexes
            .get_mut(handle.slot())
            .ok_or(IdxCheckError::UnknownIndexHandle {
                handle: handle.get(),
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// All handles in slot order.
    pub fn handles(&self) -> impl Iterator<Item = IndexHandle> + '_ {
        (0..self.indexes.len()).map(|slot| IndexHandle::new(slot as u32))
    }

    /// Ready indexes with their handles, in slot order.
    pub fn ready(&self) -> impl Iterator<Item = (IndexHandle, &IndexInfo)> + '_ {
        self.handles()
            .zip(self.indexes.iter())
            .filter(|(_, info)| info.is_ready())
    }

    /// Validity map with every ready index marked valid.
    #[must_use]
    pub fn validity_map(&self) -> IndexValidityMap {
        self.ready()
            .map(|(_, info)| (info.name().to_owned(), true))
            .collect()
    }
}
