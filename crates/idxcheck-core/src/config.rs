//! Checker configuration.
//!
//! Every knob is passed in explicitly at construction. In particular the
//! deployment compatibility flag that decides whether oversized index keys
//! are rejected lives here instead of in process-wide state.

use idxcheck_error::{IdxCheckError, Result};
use serde::{Deserialize, Serialize};

/// Default number of hash buckets (`1 << 16`).
pub const DEFAULT_BUCKET_COUNT: usize = 1 << 16;
/// Default cap on reported payload bytes per inconsistency category.
pub const DEFAULT_REPORT_SIZE_CAP_BYTES: usize = 1024 * 1024;
/// Default number of scanned items between yields.
pub const DEFAULT_YIELD_ITERATIONS: u64 = 1000;
/// Default elapsed time between yields, in milliseconds.
pub const DEFAULT_YIELD_PERIOD_MS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    /// Length of the phase-1 counter table. Nonzero power of two.
    pub bucket_count: usize,
    /// Payload bytes listed per category before the report truncates.
    pub report_size_cap_bytes: usize,
    /// Whether the deployment still rejects index keys above the legacy
    /// size limit. Evaluated by the scan driver, never by the checker.
    pub large_keys_disallowed: bool,
    /// Items the driver may scan before it must yield.
    pub yield_iterations: u64,
    /// Milliseconds the driver may run before it must yield.
    pub yield_period_ms: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            report_size_cap_bytes: DEFAULT_REPORT_SIZE_CAP_BYTES,
            large_keys_disallowed: false,
            yield_iterations: DEFAULT_YIELD_ITERATIONS,
            yield_period_ms: DEFAULT_YIELD_PERIOD_MS,
        }
    }
}

impl CheckerConfig {
    /// Reject values the checker cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.bucket_count == 0 || !self.bucket_count.is_power_of_two() {
            return Err(IdxCheckError::invalid_config(
                "bucket_count",
                format!("{} is not a nonzero power of two", self.bucket_count),
            ));
        }
        if u32::try_from(self.bucket_count).is_err() {
            return Err(IdxCheckError::invalid_config(
                "bucket_count",
                format!("{} exceeds the 32-bit hash range", self.bucket_count),
            ));
        }
        if self.report_size_cap_bytes == 0 {
            return Err(IdxCheckError::invalid_config(
                "report_size_cap_bytes",
                "must be nonzero",
            ));
        }
        if self.yield_iterations == 0 {
            return Err(IdxCheckError::invalid_config(
                "yield_iterations",
                "must be nonzero",
            ));
        }
        Ok(())
    }

    #[must_use]
    pub const fn with_bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    #[must_use]
    pub const fn with_report_size_cap(mut self, bytes: usize) -> Self {
        self.report_size_cap_bytes = bytes;
        self
    }

    #[must_use]
    pub const fn with_large_keys_disallowed(mut self, disallowed: bool) -> Self {
        self.large_keys_disallowed = disallowed;
        self
    }
}
