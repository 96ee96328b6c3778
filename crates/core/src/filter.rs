//! Record predicates and the filter pipeline.
//!
//! Predicates are plain data so persona files stay serialisable. Filtering is pure and
//! order-preserving; the input collection is never modified.

use crate::record::{Record, RecordStatus, Urgency};
use serde::{Deserialize, Serialize};

/// A predicate over a single record.
///
/// Used for persona main/sidebar filters, table and list row filters, and action
/// preconditions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordPredicate {
    /// Every record passes.
    All,
    StatusIn { statuses: Vec<RecordStatus> },
    StatusNotIn { statuses: Vec<RecordStatus> },
    UrgencyIn { urgencies: Vec<Urgency> },
    /// Every nested predicate must pass.
    AllOf { predicates: Vec<RecordPredicate> },
}

impl RecordPredicate {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::StatusIn { statuses } => statuses.contains(&record.status),
            Self::StatusNotIn { statuses } => !statuses.contains(&record.status),
            Self::UrgencyIn { urgencies } => urgencies.contains(&record.urgency),
            Self::AllOf { predicates } => predicates.iter().all(|p| p.matches(record)),
        }
    }

    /// Returns the matching records in input order.
    pub fn filter(&self, records: &[Record]) -> Vec<Record> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}

/// Applies an optional filter slot. An empty slot passes every record.
pub fn apply_filter(filter: Option<&RecordPredicate>, records: &[Record]) -> Vec<Record> {
    match filter {
        Some(predicate) => predicate.filter(records),
        None => records.to_vec(),
    }
}
