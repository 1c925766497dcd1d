//! Vocabulary types shared by the index consistency checker.
//!
//! Documents and index entries reach the checker only as opaque, already
//! encoded buffers plus a storage-assigned record locator. Nothing in this
//! crate interprets key bytes.

pub mod key_string;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use key_string::KeyString;

/// Storage-engine-assigned locator of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    #[must_use]
    pub const fn new(repr: i64) -> Self {
        Self(repr)
    }

    /// Raw integer representation, as reported in diagnostics.
    #[must_use]
    pub const fn repr(self) -> i64 {
        self.0
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

/// Opaque slot of an index inside the registry of one validation run.
///
/// Handles are issued in descriptor order starting at zero and stay valid
/// for the lifetime of the registry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexHandle(u32);

impl IndexHandle {
    #[must_use]
    pub const fn new(slot: u32) -> Self {
        Self(slot)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Slot as a vector position.
    #[must_use]
    pub const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for IndexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Catalog view of one index as seen at checker construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Index name, unique within the collection.
    pub name: String,
    /// Field names of the key pattern in declaration order.
    pub key_pattern: Vec<String>,
    /// Whether the index finished building before validation started.
    pub ready: bool,
}

impl IndexDescriptor {
    pub fn new<I, S>(name: impl Into<String>, key_pattern: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            key_pattern: key_pattern.into_iter().map(Into::into).collect(),
            ready: true,
        }
    }

    /// Mark the descriptor as not yet built.
    #[must_use]
    pub fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }
}
