//! Two-phase index consistency checking for one collection.
//!
//! A scan driver feeds every document-derived key and every index-derived
//! key to [`IndexConsistency`]:
//!
//! 1. **Count**: each key bumps the bucket it hashes to (`+1` document,
//!    `-1` index). Memory is one fixed table regardless of collection size.
//! 2. **Reconcile**: only if some bucket is nonzero, the driver rewinds
//!    both streams and feeds them again. Keys in balanced buckets are
//!    skipped; keys in flagged buckets are matched byte-for-byte.
//!
//! During the replay all document keys must arrive before the index keys
//! they are matched against: an index key only reconciles with a document
//! key that is already parked.
//!
//! The report then lists whatever could not be matched. Two inconsistencies
//! of opposite sign that alias to one bucket cancel in phase 1 and go
//! unreported; exact detection would need memory proportional to the
//! collection.

use idxcheck_error::{IdxCheckError, Result};
use idxcheck_types::{IndexDescriptor, IndexHandle, KeyString, RecordId};
use serde_json::Value;
use tracing::{debug, info, trace};

use crate::bucket_table::BucketCounterTable;
use crate::collector::{DiscrepancyCollector, EntryKey, IndexKeyOutcome};
use crate::config::CheckerConfig;
use crate::hasher::KeyHasher;
use crate::instrumentation::CheckerStats;
use crate::registry::{IndexInfo, IndexRegistry, IndexValidityMap};
use crate::report::{DiagnosticRecord, ReportBuilder, ValidateReport};
use crate::store::RecordStore;

/// Phase of a validation run. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPhase {
    /// Approximate counting into hash buckets.
    Count,
    /// Exact matching of keys in flagged buckets.
    Reconcile,
}

impl ValidationPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Reconcile => "reconcile",
        }
    }
}

/// Consistency checker bound to one collection for one validation run.
#[derive(Debug)]
pub struct IndexConsistency<'s, S: RecordStore + ?Sized> {
    store: &'s S,
    namespace: String,
    config: CheckerConfig,
    hasher: KeyHasher,
    registry: IndexRegistry,
    buckets: BucketCounterTable,
    collector: DiscrepancyCollector,
    phase: ValidationPhase,
    stats: CheckerStats,
}

impl<'s, S: RecordStore + ?Sized> IndexConsistency<'s, S> {
    /// Start a run over the indexes known right now.
    ///
    /// Indexes whose descriptor is not ready are registered but ignored by
    /// every later operation.
    pub fn new<I>(
        store: &'s S,
        namespace: impl Into<String>,
        indexes: I,
        config: CheckerConfig,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = IndexDescriptor>,
    {
        config.validate()?;
        let namespace = namespace.into();
        let hasher = KeyHasher::new(config.bucket_count)?;
        let buckets = BucketCounterTable::new(config.bucket_count)?;
        let registry = IndexRegistry::from_descriptors(indexes)?;

        info!(
            namespace = %namespace,
            indexes = registry.len(),
            ready = registry.ready().count(),
            buckets = config.bucket_count,
            "index consistency run started"
        );

        Ok(Self {
            store,
            namespace,
            config,
            hasher,
            registry,
            buckets,
            collector: DiscrepancyCollector::default(),
            phase: ValidationPhase::Count,
            stats: CheckerStats::default(),
        })
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub const fn config(&self) -> &CheckerConfig {
        &self.config
    }

    #[must_use]
    pub const fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    #[must_use]
    pub fn lookup(&self, index_name: &str) -> Option<IndexHandle> {
        self.registry.lookup(index_name)
    }

    pub fn index(&self, handle: IndexHandle) -> Result<&IndexInfo> {
        self.registry.get(handle)
    }

    #[must_use]
    pub const fn phase(&self) -> ValidationPhase {
        self.phase
    }

    #[must_use]
    pub const fn stats(&self) -> CheckerStats {
        self.stats
    }

    #[must_use]
    pub const fn buckets(&self) -> &BucketCounterTable {
        &self.buckets
    }

    #[must_use]
    pub const fn collector(&self) -> &DiscrepancyCollector {
        &self.collector
    }

    /// Deployment flag telling the driver whether oversized keys are errors.
    #[must_use]
    pub const fn large_keys_disallowed(&self) -> bool {
        self.config.large_keys_disallowed
    }

    /// Bucket `key` hashes to under `handle`'s identity seed.
    pub fn bucket_of(&self, handle: IndexHandle, key: &KeyString<'_>) -> Result<usize> {
        let seed = self.registry.get(handle)?.name_hash();
        Ok(self.hasher.bucket(key, seed))
    }

    /// Observe a key derived from a document.
    ///
    /// `key_values` are the positional key values, rehydrated into the
    /// diagnostic record when the key turns out to be missing from the index.
    pub fn observe_document_key(
        &mut self,
        handle: IndexHandle,
        key: &KeyString<'_>,
        record_id: RecordId,
        key_values: &[Value],
    ) -> Result<()> {
        let Some(bucket) = self.ready_bucket(handle, key)? else {
            return Ok(());
        };

        match self.phase {
            ValidationPhase::Count => {
                self.buckets.increment(bucket);
                self.registry.get_mut(handle)?.count_document_key();
                self.stats.record_counted(true);
                trace!(index = %handle, bucket, %record_id, "document key counted");
            }
            ValidationPhase::Reconcile => {
                if !self.buckets.is_flagged(bucket) {
                    self.stats.record_skipped();
                    return Ok(());
                }
                self.stats.record_examined();
                let id_key = self.store.id_key(record_id)?;
                let info = self.registry.get(handle)?;
                let record = DiagnosticRecord::new(info, record_id, key_values, id_key)?;
                debug!(
                    index = info.name(),
                    bucket,
                    %record_id,
                    "document key parked in flagged bucket"
                );
                self.collector
                    .record_document_key(EntryKey::new(handle, key), record)?;
            }
        }
        Ok(())
    }

    /// Observe a key read from an index entry pointing at `record_id`.
    pub fn observe_index_key(
        &mut self,
        handle: IndexHandle,
        key: &KeyString<'_>,
        record_id: RecordId,
        key_values: &[Value],
    ) -> Result<()> {
        let Some(bucket) = self.ready_bucket(handle, key)? else {
            return Ok(());
        };

        match self.phase {
            ValidationPhase::Count => {
                self.buckets.decrement(bucket);
                self.registry.get_mut(handle)?.count_index_key();
                self.stats.record_counted(false);
                trace!(index = %handle, bucket, %record_id, "index key counted");
            }
            ValidationPhase::Reconcile => {
                if !self.buckets.is_flagged(bucket) {
                    self.stats.record_skipped();
                    return Ok(());
                }
                self.stats.record_examined();
                let info = self.registry.get(handle)?;
                let record = DiagnosticRecord::new(info, record_id, key_values, None)?;
                let outcome = self
                    .collector
                    .record_index_key(EntryKey::new(handle, key), record);
                if outcome == IndexKeyOutcome::Reconciled {
                    self.stats.record_reconciled();
                }
                debug!(
                    index = info.name(),
                    bucket,
                    %record_id,
                    ?outcome,
                    "index key matched in flagged bucket"
                );
            }
        }
        Ok(())
    }

    /// Whether phase 1 proved at least one inconsistency.
    #[must_use]
    pub fn has_any_mismatch(&self) -> bool {
        self.buckets.has_any_mismatch()
    }

    /// Move to the reconciliation phase. Allowed exactly once.
    pub fn enter_second_phase(&mut self) -> Result<()> {
        if self.phase != ValidationPhase::Count {
            return Err(IdxCheckError::PhaseViolation {
                operation: "enter_second_phase",
                phase: self.phase.as_str(),
            });
        }
        self.phase = ValidationPhase::Reconcile;
        self.stats.flagged_buckets = self.buckets.flagged_buckets() as u64;
        debug!(
            namespace = %self.namespace,
            flagged_buckets = self.stats.flagged_buckets,
            "entering reconciliation phase"
        );
        Ok(())
    }

    /// Count an index key too large to be indexed.
    ///
    /// Only counted during [`ValidationPhase::Count`]: counters describe a
    /// single pass, so calls made while replaying for reconciliation are
    /// dropped. Drivers that want every oversized key counted must report
    /// it during the first pass. Unready indexes are ignored.
    pub fn record_oversized_key(&mut self, handle: IndexHandle) -> Result<()> {
        let info = self.registry.get_mut(handle)?;
        if !info.is_ready() || self.phase != ValidationPhase::Count {
            return Ok(());
        }
        info.count_long_key();
        Ok(())
    }

    /// Record an array path marker. Ignored for unready indexes.
    pub fn add_multikey_path(&mut self, handle: IndexHandle, path: &KeyString<'_>) -> Result<()> {
        let hasher = self.hasher;
        let info = self.registry.get_mut(handle)?;
        if !info.is_ready() {
            return Ok(());
        }
        let seed = info.name_hash();
        info.multikey_paths_mut().add(&hasher, path, seed);
        Ok(())
    }

    pub fn remove_multikey_path(
        &mut self,
        handle: IndexHandle,
        path: &KeyString<'_>,
    ) -> Result<()> {
        let hasher = self.hasher;
        let info = self.registry.get_mut(handle)?;
        if !info.is_ready() {
            return Ok(());
        }
        let seed = info.name_hash();
        info.multikey_paths_mut().remove(&hasher, path, seed);
        Ok(())
    }

    pub fn multikey_path_count(&self, handle: IndexHandle) -> Result<usize> {
        Ok(self.registry.get(handle)?.multikey_paths().len())
    }

    pub fn mark_index_scan_finished(&mut self, handle: IndexHandle) -> Result<()> {
        let info = self.registry.get_mut(handle)?;
        if info.is_ready() {
            info.mark_scan_finished();
        }
        Ok(())
    }

    pub fn index_scan_finished(&self, handle: IndexHandle) -> Result<bool> {
        Ok(self.registry.get(handle)?.scan_finished())
    }

    /// Validity map seeded with every ready index marked valid.
    #[must_use]
    pub fn validity_map(&self) -> IndexValidityMap {
        self.registry.validity_map()
    }

    /// Render the report for this run.
    ///
    /// # Errors
    ///
    /// Returns [`IdxCheckError::PhaseViolation`] when phase 1 found a
    /// mismatch that phase 2 has not reconciled yet.
    pub fn build_report(&self, index_validity: IndexValidityMap) -> Result<ValidateReport> {
        if self.phase == ValidationPhase::Count && self.has_any_mismatch() {
            return Err(IdxCheckError::PhaseViolation {
                operation: "build_report with unreconciled mismatches",
                phase: self.phase.as_str(),
            });
        }
        ReportBuilder::new(self.config.report_size_cap_bytes).build(
            &self.registry,
            &self.collector,
            index_validity,
        )
    }

    /// Bucket for a ready index, `None` when the index is not ready.
    fn ready_bucket(&mut self, handle: IndexHandle, key: &KeyString<'_>) -> Result<Option<usize>> {
        let info = self.registry.get(handle)?;
        if !info.is_ready() {
            self.stats.record_unready();
            return Ok(None);
        }
        Ok(Some(self.hasher.bucket(key, info.name_hash())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use serde_json::json;

    fn small_config() -> CheckerConfig {
        CheckerConfig::default().with_bucket_count(1 << 10)
    }

    fn store_with(ids: &[i64]) -> MemoryRecordStore {
        let mut store = MemoryRecordStore::new();
        for &id in ids {
            store.insert(RecordId::new(id), Some(json!(format!("oid{id}"))));
        }
        store
    }

    #[test]
    fn second_transition_is_a_phase_violation() {
        let store = store_with(&[]);
        let mut checker = IndexConsistency::new(
            &store,
            "db.coll",
            [IndexDescriptor::new("a_1", ["a"])],
            small_config(),
        )
        .expect("checker");
        checker.enter_second_phase().expect("first transition");
        let err = checker.enter_second_phase().expect_err("second transition");
        assert!(err.is_fatal_invariant());
        assert!(matches!(
            err,
            IdxCheckError::PhaseViolation {
                phase: "reconcile",
                ..
            }
        ));
    }

    #[test]
    fn unready_index_is_ignored_everywhere() {
        let store = store_with(&[1]);
        let mut checker = IndexConsistency::new(
            &store,
            "db.coll",
            [IndexDescriptor::new("b_1", ["b"]).not_ready()],
            small_config(),
        )
        .expect("checker");
        let handle = checker.lookup("b_1").expect("registered");
        let key = KeyString::untyped(b"orphan");

        checker
            .observe_index_key(handle, &key, RecordId::new(1), &[json!(1)])
            .expect("ignored");
        checker.record_oversized_key(handle).expect("ignored");
        assert!(!checker.has_any_mismatch());
        assert_eq!(checker.stats().unready_observations_ignored, 1);
        assert_eq!(
            checker.index(handle).expect("info").counters().records,
            0
        );
        let report = checker
            .build_report(checker.validity_map())
            .expect("report");
        assert!(report.valid);
        assert!(report.index_validity.is_empty());
    }

    #[test]
    fn unready_index_ignores_multikey_and_scan_bookkeeping() {
        let store = store_with(&[]);
        let mut checker = IndexConsistency::new(
            &store,
            "db.coll",
            [IndexDescriptor::new("b_1", ["b"]).not_ready()],
            small_config(),
        )
        .expect("checker");
        let handle = checker.lookup("b_1").expect("registered");

        checker
            .add_multikey_path(handle, &KeyString::untyped(b"b"))
            .expect("ignored");
        assert_eq!(checker.multikey_path_count(handle).expect("count"), 0);
        checker
            .remove_multikey_path(handle, &KeyString::untyped(b"b"))
            .expect("ignored");
        checker.mark_index_scan_finished(handle).expect("ignored");
        assert!(!checker.index_scan_finished(handle).expect("flag"));
    }

    #[test]
    fn report_before_reconciliation_is_rejected() {
        let store = store_with(&[1]);
        let mut checker = IndexConsistency::new(
            &store,
            "db.coll",
            [IndexDescriptor::new("a_1", ["a"])],
            small_config(),
        )
        .expect("checker");
        let handle = checker.lookup("a_1").expect("registered");
        checker
            .observe_document_key(
                handle,
                &KeyString::untyped(b"k"),
                RecordId::new(1),
                &[json!(1)],
            )
            .expect("count");
        assert!(checker.has_any_mismatch());
        let err = checker
            .build_report(checker.validity_map())
            .expect_err("must reconcile first");
        assert!(matches!(err, IdxCheckError::PhaseViolation { phase: "count", .. }));
    }

    #[test]
    fn oversized_keys_count_only_during_counting() {
        let store = store_with(&[]);
        let mut checker = IndexConsistency::new(
            &store,
            "db.coll",
            [IndexDescriptor::new("a_1", ["a"])],
            small_config().with_large_keys_disallowed(true),
        )
        .expect("checker");
        assert!(checker.large_keys_disallowed());
        let handle = checker.lookup("a_1").expect("registered");

        checker.record_oversized_key(handle).expect("count");
        checker.enter_second_phase().expect("transition");
        checker.record_oversized_key(handle).expect("ignored");

        let counters = checker.index(handle).expect("info").counters();
        assert_eq!(counters.long_keys, 1);
        assert_eq!(counters.records, 1);
    }

    #[test]
    fn multikey_paths_and_scan_flag() {
        let store = store_with(&[]);
        let mut checker = IndexConsistency::new(
            &store,
            "db.coll",
            [IndexDescriptor::new("tags_1", ["tags"])],
            small_config(),
        )
        .expect("checker");
        let handle = checker.lookup("tags_1").expect("registered");

        checker
            .add_multikey_path(handle, &KeyString::untyped(b"tags"))
            .expect("add");
        checker
            .add_multikey_path(handle, &KeyString::untyped(b"tags.x"))
            .expect("add");
        assert_eq!(checker.multikey_path_count(handle).expect("count"), 2);
        checker
            .remove_multikey_path(handle, &KeyString::untyped(b"tags"))
            .expect("remove");
        assert_eq!(checker.multikey_path_count(handle).expect("count"), 1);

        assert!(!checker.index_scan_finished(handle).expect("flag"));
        checker.mark_index_scan_finished(handle).expect("mark");
        assert!(checker.index_scan_finished(handle).expect("flag"));
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let store = store_with(&[]);
        let mut checker = IndexConsistency::new(
            &store,
            "db.coll",
            [IndexDescriptor::new("a_1", ["a"])],
            small_config(),
        )
        .expect("checker");
        let err = checker
            .observe_document_key(
                IndexHandle::new(4),
                &KeyString::untyped(b"k"),
                RecordId::new(1),
                &[json!(1)],
            )
            .expect_err("unknown handle");
        assert!(matches!(err, IdxCheckError::UnknownIndexHandle { handle: 4 }));
    }

    #[test]
    fn invalid_config_fails_construction() {
        let store = store_with(&[]);
        let err = IndexConsistency::new(
            &store,
            "db.coll",
            [IndexDescriptor::new("a_1", ["a"])],
            CheckerConfig::default().with_bucket_count(100),
        )
        .expect_err("bad config");
        assert!(matches!(err, IdxCheckError::InvalidConfig { .. }));
    }
}
