//! Diagnostic records and size-capped report rendering.
//!
//! Missing entries are rendered first, then extra entries. Each category has
//! its own payload budget measured over the encoded `indexKey` (and `idKey`
//! for missing entries). The first record past the budget produces a single
//! truncation warning and ends listing for that category, but every record
//! still marks its index invalid.

use std::collections::BTreeMap;

use idxcheck_error::{IdxCheckError, Result};
use idxcheck_types::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::collector::DiscrepancyCollector;
use crate::registry::{IndexCounters, IndexInfo, IndexRegistry, IndexValidityMap};

/// One inconsistent index entry as surfaced to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticRecord {
    pub index_name: String,
    pub record_id: RecordId,
    /// `_id` of the owning document; only present for missing entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_key: Option<Value>,
    /// Key values named after the index's key pattern.
    pub index_key: Map<String, Value>,
}

impl DiagnosticRecord {
    /// Build a record, rehydrating positional key values with field names.
    ///
    /// # Errors
    ///
    /// Returns [`IdxCheckError::KeyPatternMismatch`] when the key pattern and
    /// the key disagree on the number of fields.
    pub fn new(
        index: &IndexInfo,
        record_id: RecordId,
        key_values: &[Value],
        id_key: Option<Value>,
    ) -> Result<Self> {
        Ok(Self {
            index_name: index.name().to_owned(),
            record_id,
            id_key,
            index_key: rehydrate_key(index.name(), index.key_pattern(), key_values)?,
        })
    }

    /// Bytes this record charges against its category's report budget.
    pub fn payload_size(&self) -> Result<usize> {
        let mut size = serde_json::to_vec(&self.index_key)?.len();
        if let Some(id_key) = &self.id_key {
            size += serde_json::to_vec(id_key)?.len();
        }
        Ok(size)
    }
}

/// Zip key-pattern field names with positional key values.
///
/// `["a", "b"]` + `[1, "x"]` -> `{"a": 1, "b": "x"}`
pub fn rehydrate_key(
    index_name: &str,
    key_pattern: &[String],
    key_values: &[Value],
) -> Result<Map<String, Value>> {
    if key_pattern.len() != key_values.len() {
        return Err(IdxCheckError::KeyPatternMismatch {
            index: index_name.to_owned(),
            pattern_fields: key_pattern.len(),
            key_values: key_values.len(),
        });
    }
    Ok(key_pattern
        .iter()
        .cloned()
        .zip(key_values.iter().cloned())
        .collect())
}

/// Outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub missing_index_entries: Vec<DiagnosticRecord>,
    pub extra_index_entries: Vec<DiagnosticRecord>,
    /// Index name -> validity, seeded by the caller.
    pub index_validity: IndexValidityMap,
    /// Counters of every ready index at report time.
    pub index_counts: BTreeMap<String, IndexCounters>,
}

impl ValidateReport {
    #[must_use]
    pub fn new(index_validity: IndexValidityMap) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            missing_index_entries: Vec::new(),
            extra_index_entries: Vec::new(),
            index_validity,
            index_counts: BTreeMap::new(),
        }
    }

    /// Whether `index` is still considered valid. Unknown names are valid.
    #[must_use]
    pub fn index_valid(&self, index: &str) -> bool {
        self.index_validity.get(index).copied().unwrap_or(true)
    }

    /// Mark an index invalid, recording one error the first time.
    fn invalidate_index(&mut self, index: &str) {
        let valid = self.index_validity.entry(index.to_owned()).or_insert(true);
        if *valid {
            *valid = false;
            self.errors
                .push(format!("Index with name '{index}' has inconsistencies."));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryCategory {
    Missing,
    Extra,
}

impl EntryCategory {
    const fn label(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Extra => "extra",
        }
    }
}

/// Renders collector output into a [`ValidateReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportBuilder {
    size_cap_bytes: usize,
}

impl ReportBuilder {
    #[must_use]
    pub const fn new(size_cap_bytes: usize) -> Self {
        Self { size_cap_bytes }
    }

    #[must_use]
    pub const fn size_cap_bytes(&self) -> usize {
        self.size_cap_bytes
    }

    /// Build the report for a run.
    ///
    /// Every index named by a diagnostic record is marked invalid in
    /// `index_validity`; marks are never cleared.
    pub fn build(
        &self,
        registry: &IndexRegistry,
        collector: &DiscrepancyCollector,
        index_validity: IndexValidityMap,
    ) -> Result<ValidateReport> {
        let mut report = ValidateReport::new(index_validity);

        let missing = collector.missing_sorted();
        let extra = collector.extra_sorted();

        let missing_listed = self.list_category(EntryCategory::Missing, &missing, &mut report)?;
        let extra_listed = self.list_category(EntryCategory::Extra, &extra, &mut report)?;
        report.missing_index_entries = missing_listed;
        report.extra_index_entries = extra_listed;

        for (category, count) in [
            (EntryCategory::Missing, missing.len()),
            (EntryCategory::Extra, extra.len()),
        ] {
            if count > 0 {
                report
                    .warnings
                    .push(format!("Detected {count} {} index entries.", category.label()));
            }
        }

        if !missing.is_empty() || !extra.is_empty() {
            report.valid = false;
        }

        report.index_counts = registry
            .ready()
            .map(|(_, info)| (info.name().to_owned(), info.counters()))
            .collect();

        info!(
            valid = report.valid,
            missing = missing.len(),
            extra = extra.len(),
            missing_listed = report.missing_index_entries.len(),
            extra_listed = report.extra_index_entries.len(),
            "index consistency report built"
        );
        Ok(report)
    }

    fn list_category(
        &self,
        category: EntryCategory,
        records: &[&DiagnosticRecord],
        report: &mut ValidateReport,
    ) -> Result<Vec<DiagnosticRecord>> {
        let mut listed = Vec::new();
        let mut used_bytes = 0_usize;
        let mut truncated = false;

        for record in records {
            if !truncated {
                used_bytes = used_bytes.saturating_add(record.payload_size()?);
                if used_bytes <= self.size_cap_bytes {
                    listed.push((*record).clone());
                } else {
                    truncated = true;
                    warn!(
                        category = category.label(),
                        cap_bytes = self.size_cap_bytes,
                        listed = listed.len(),
                        total = records.len(),
                        "index entry report truncated"
                    );
                    report.warnings.push(format!(
                        "Not all {} index entry inconsistencies are listed due to size limitations.",
                        category.label()
                    ));
                }
            }
            report.invalidate_index(&record.index_name);
        }
        Ok(listed)
    }
}
