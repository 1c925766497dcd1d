//! Bounded-memory consistency checking between a collection's documents and
//! its secondary indexes.
//!
//! See [`consistency`] for the two-phase protocol a scan driver follows.

pub mod bucket_table;
pub mod collector;
pub mod config;
pub mod consistency;
pub mod hasher;
pub mod instrumentation;
pub mod multikey;
pub mod registry;
pub mod report;
pub mod store;
pub mod yield_policy;

pub use bucket_table::BucketCounterTable;
pub use collector::{DiscrepancyCollector, EntryKey, IndexKeyOutcome};
pub use config::{
    CheckerConfig, DEFAULT_BUCKET_COUNT, DEFAULT_REPORT_SIZE_CAP_BYTES, DEFAULT_YIELD_ITERATIONS,
    DEFAULT_YIELD_PERIOD_MS,
};
pub use consistency::{IndexConsistency, ValidationPhase};
pub use hasher::{KeyHasher, hash_key_string, index_name_hash};
pub use idxcheck_error::{IdxCheckError, Result};
pub use idxcheck_types::{IndexDescriptor, IndexHandle, KeyString, RecordId};
pub use instrumentation::CheckerStats;
pub use multikey::MultikeyPaths;
pub use registry::{IndexCounters, IndexInfo, IndexRegistry, IndexValidityMap};
pub use report::{DiagnosticRecord, ReportBuilder, ValidateReport, rehydrate_key};
pub use store::{MemoryRecordStore, RecordStore};
pub use yield_policy::YieldTracker;
