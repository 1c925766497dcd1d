//! Phase-2 exact reconciliation of flagged buckets.
//!
//! Only keys whose bucket was left nonzero by phase 1 reach the collector.
//! Document keys are parked as *missing* until an index key with identical
//! bytes (for the same index) shows up and removes them. Index keys with no
//! parked document key become *extra*. After both streams are replayed,
//! whatever remains is a real inconsistency.

use hashbrown::hash_map::Entry;
use hashbrown::{HashMap, HashSet};
use idxcheck_error::{IdxCheckError, Result};
use idxcheck_types::{IndexHandle, KeyString, RecordId};

use crate::report::DiagnosticRecord;

/// Exact identity of an observed key: owning index plus canonical key bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryKey {
    index: IndexHandle,
    bytes: Box<[u8]>,
}

impl EntryKey {
    #[must_use]
    pub fn new(index: IndexHandle, key: &KeyString<'_>) -> Self {
        Self {
            index,
            bytes: key.bytes().into(),
        }
    }

    #[must_use]
    pub const fn index(&self) -> IndexHandle {
        self.index
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// What happened to an index-derived key in phase 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKeyOutcome {
    /// A parked document key with identical bytes was removed.
    Reconciled,
    /// No document produced this key; it was recorded as extra.
    Extra,
}

/// Extra records sharing one key, in arrival order.
///
/// Within one key the index name and rehydrated key are fixed by the key
/// bytes, so the record id alone decides identity.
#[derive(Debug, Clone, Default)]
struct ExtraRecords {
    records: Vec<DiagnosticRecord>,
    seen: HashSet<RecordId>,
}

impl ExtraRecords {
    fn insert(&mut self, record: DiagnosticRecord) {
        if self.seen.insert(record.record_id) {
            self.records.push(record);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiscrepancyCollector {
    missing: HashMap<EntryKey, DiagnosticRecord>,
    extra: HashMap<EntryKey, ExtraRecords>,
}

impl DiscrepancyCollector {
    /// Park a document-derived key from a flagged bucket.
    ///
    /// # Errors
    ///
    /// Returns [`IdxCheckError::DuplicateMissingEntry`] if the same key was
    /// already parked: each document is scanned at most once per phase.
    pub fn record_document_key(&mut self, key: EntryKey, record: DiagnosticRecord) -> Result<()> {
        match self.missing.entry(key) {
            Entry::Occupied(occupied) => Err(IdxCheckError::DuplicateMissingEntry {
                index: record.index_name,
                key_len: occupied.key().bytes().len(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(record);
                Ok(())
            }
        }
    }

    /// Match an index-derived key from a flagged bucket against parked
    /// document keys.
    pub fn record_index_key(&mut self, key: EntryKey, record: DiagnosticRecord) -> IndexKeyOutcome {
        if self.missing.remove(&key).is_some() {
            return IndexKeyOutcome::Reconciled;
        }
        self.extra.entry(key).or_default().insert(record);
        IndexKeyOutcome::Extra
    }

    #[must_use]
    pub fn missing_len(&self) -> usize {
        self.missing.len()
    }

    /// Number of extra records across all keys.
    #[must_use]
    pub fn extra_len(&self) -> usize {
        self.extra.values().map(|extra| extra.records.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }

    #[must_use]
    pub fn contains_missing(&self, key: &EntryKey) -> bool {
        self.missing.contains_key(key)
    }

    #[must_use]
    pub fn extra_for(&self, key: &EntryKey) -> &[DiagnosticRecord] {
        self.extra
            .get(key)
            .map_or(&[][..], |extra| extra.records.as_slice())
    }

    /// Missing records ordered by `(index slot, key bytes)`.
    #[must_use]
    pub fn missing_sorted(&self) -> Vec<&DiagnosticRecord> {
        let mut entries: Vec<_> = self.missing.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, record)| record).collect()
    }

    /// Extra records ordered by `(index slot, key bytes)`, then by arrival.
    #[must_use]
    pub fn extra_sorted(&self) -> Vec<&DiagnosticRecord> {
        let mut entries: Vec<_> = self.extra.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
            .into_iter()
            .flat_map(|(_, extra)| extra.records.iter())
            .collect()
    }
}
