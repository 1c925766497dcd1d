//! Per-run observability counters.
//!
//! Counters live on the checker instance rather than in process-wide
//! statics: a run is single-threaded and owned by one scan driver.

use serde::{Deserialize, Serialize};

/// Snapshot of what the checker has seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckerStats {
    /// Document-derived keys counted into buckets during phase 1.
    pub document_keys_counted: u64,
    /// Index-derived keys counted into buckets during phase 1.
    pub index_keys_counted: u64,
    /// Observations dropped because their index was not ready.
    pub unready_observations_ignored: u64,
    /// Phase-2 keys that hit a flagged bucket and were reconciled exactly.
    pub flagged_keys_examined: u64,
    /// Phase-2 keys skipped because their bucket balanced in phase 1.
    pub balanced_keys_skipped: u64,
    /// Index keys that removed a parked document key (collision artifacts).
    pub keys_reconciled: u64,
    /// Buckets left nonzero when phase 2 began.
    pub flagged_buckets: u64,
}

impl CheckerStats {
    pub(crate) fn record_counted(&mut self, document: bool) {
        let counter = if document {
            &mut self.document_keys_counted
        } else {
            &mut self.index_keys_counted
        };
        *counter = counter.saturating_add(1);
    }

    pub(crate) fn record_unready(&mut self) {
        self.unready_observations_ignored = self.unready_observations_ignored.saturating_add(1);
    }

    pub(crate) fn record_examined(&mut self) {
        self.flagged_keys_examined = self.flagged_keys_examined.saturating_add(1);
    }

    pub(crate) fn record_skipped(&mut self) {
        self.balanced_keys_skipped = self.balanced_keys_skipped.saturating_add(1);
    }

    pub(crate) fn record_reconciled(&mut self) {
        self.keys_reconciled = self.keys_reconciled.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::CheckerStats;

    #[test]
    fn counters_accumulate_independently() {
        let mut stats = CheckerStats::default();
        stats.record_counted(true);
        stats.record_counted(true);
        stats.record_counted(false);
        stats.record_unready();
        stats.record_examined();
        stats.record_skipped();
        stats.record_reconciled();
        assert_eq!(stats.document_keys_counted, 2);
        assert_eq!(stats.index_keys_counted, 1);
        assert_eq!(stats.unready_observations_ignored, 1);
        assert_eq!(stats.flagged_keys_examined, 1);
        assert_eq!(stats.balanced_keys_skipped, 1);
        assert_eq!(stats.keys_reconciled, 1);
    }
}
