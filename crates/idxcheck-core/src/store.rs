//! Document-store seam.
//!
//! Phase 2 needs the primary key of a document whose key landed in a flagged
//! bucket. The checker reaches the document only through this trait.

use hashbrown::HashMap;
use idxcheck_error::{IdxCheckError, Result};
use idxcheck_types::RecordId;
use serde_json::Value;

/// Provider for document primary-key values.
pub trait RecordStore {
    /// Fetch the `_id` value of the document at `record_id`.
    ///
    /// Returns `Ok(None)` when the document exists but carries no `_id`.
    ///
    /// # Errors
    ///
    /// Returns [`IdxCheckError::RecordNotFound`] when no document lives at
    /// `record_id`, or a storage error.
    fn id_key(&self, record_id: RecordId) -> Result<Option<Value>>;
}

/// In-memory [`RecordStore`] keyed by record id.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: HashMap<RecordId, Option<Value>>,
}

impl MemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document, optionally with an `_id`.
    pub fn insert(&mut self, record_id: RecordId, id_key: Option<Value>) {
        self.records.insert(record_id, id_key);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryRecordStore {
    fn id_key(&self, record_id: RecordId) -> Result<Option<Value>> {
        self.records
            .get(&record_id)
            .cloned()
            .ok_or(IdxCheckError::RecordNotFound {
                record_id: record_id.repr(),
            })
    }
}
