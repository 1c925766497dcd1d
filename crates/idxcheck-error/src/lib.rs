//! Error type shared by the idxcheck crates.

use thiserror::Error;

/// Primary error type for index consistency validation.
///
/// Data inconsistencies between documents and indexes are never errors: they
/// are collected and rendered into the validation report. Every variant here
/// either rejects bad input at construction time or signals a broken
/// invariant that must abort the run.
#[derive(Error, Debug)]
pub enum IdxCheckError {
    // === Invariant Violations ===
    /// A document key was inserted twice into the missing-entry set during
    /// the reconciliation pass. Documents are scanned at most once.
    #[error("duplicate missing-entry key for index '{index}' ({key_len} key bytes)")]
    DuplicateMissingEntry { index: String, key_len: usize },

    /// The key pattern and the positional key values disagree in length.
    #[error(
        "key pattern of index '{index}' declares {pattern_fields} fields but the key has {key_values} values"
    )]
    KeyPatternMismatch {
        index: String,
        pattern_fields: usize,
        key_values: usize,
    },

    /// An operation was invoked in a phase that does not permit it.
    #[error("{operation} is not permitted during the {phase} phase")]
    PhaseViolation {
        operation: &'static str,
        phase: &'static str,
    },

    /// A handle that the index registry never issued.
    #[error("unknown index handle {handle}")]
    UnknownIndexHandle { handle: u32 },

    // === Input Errors ===
    /// Two index descriptors share a name.
    #[error("index {name} already registered")]
    DuplicateIndexName { name: String },

    /// The document store could not resolve a record locator.
    #[error("no record with id {record_id}")]
    RecordNotFound { record_id: i64 },

    /// A configuration value failed validation.
    #[error("invalid config {field}: {detail}")]
    InvalidConfig { field: &'static str, detail: String },

    // === Encoding Errors ===
    /// JSON encoding of a diagnostic payload failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // === Internal Errors ===
    /// Internal logic error (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl IdxCheckError {
    /// Whether this error reports a broken checker invariant (a programming
    /// error in the scan driver or the checker) rather than bad input.
    #[must_use]
    pub const fn is_fatal_invariant(&self) -> bool {
        matches!(
            self,
            Self::DuplicateMissingEntry { .. }
                | Self::KeyPatternMismatch { .. }
                | Self::PhaseViolation { .. }
                | Self::UnknownIndexHandle { .. }
                | Self::Internal(_)
        )
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an invalid-config error.
    pub fn invalid_config(field: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            detail: detail.into(),
        }
    }
}

/// Result type alias using `IdxCheckError`.
pub type Result<T> = std::result::Result<T, IdxCheckError>;
