//! Batch output: records, failures and counts.

use std::fmt;

use serde::Serialize;

use super::invoice::{InvoiceRecord, ParseFailure};

/// Aggregate counts of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchCounts {
    /// Candidate files found.
    pub seen: usize,
    /// Files turned into records.
    pub parsed: usize,
    /// Files turned into failures.
    pub failed: usize,
}

impl fmt::Display for BatchCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} seen, {} parsed, {} failed",
            self.seen, self.parsed, self.failed
        )
    }
}

/// Result of one batch run. Immutable once built; read it through
/// [`crate::dataset::DatasetView`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dataset {
    records: Vec<InvoiceRecord>,
    failures: Vec<ParseFailure>,
    counts: BatchCounts,
}

impl Dataset {
    /// Build a dataset where every document ended up in one of the two lists.
    pub fn new(records: Vec<InvoiceRecord>, failures: Vec<ParseFailure>) -> Self {
        let counts = BatchCounts {
            seen: records.len() + failures.len(),
            parsed: records.len(),
            failed: failures.len(),
        };
        Self {
            records,
            failures,
            counts,
        }
    }

    /// Records in enumeration order.
    pub fn records(&self) -> &[InvoiceRecord] {
        &self.records
    }

    /// Failures in enumeration order.
    pub fn failures(&self) -> &[ParseFailure] {
        &self.failures
    }

    pub fn counts(&self) -> BatchCounts {
        self.counts
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records that carry at least one field warning.
    pub fn records_with_warnings(&self) -> impl Iterator<Item = &InvoiceRecord> {
        self.records.iter().filter(|r| r.has_warnings())
    }
}
