//! Referral analysis: the collaborator seam and per-widget request state.
//!
//! Analysis is the one asynchronous step in the engine. A widget asks the
//! [`AnalysisBoard`] for a ticket, the host runs the [`ReferralAnalyzer`] (with its own
//! timeout) and hands the outcome back with that ticket. A ticket goes stale when the
//! selection moves to another record; stale outcomes are dropped rather than shown against
//! the wrong patient.

use crate::constants::ANTICOAGULANT_MARKERS;
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub urgency_recommendation: String,
    pub suggested_pathway: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("analysis failed: {0}")]
    Failed(String),
    #[error("analysis timed out after {0:?}")]
    TimedOut(Duration),
}

pub type AnalysisFuture<'a> =
    Pin<Box<dyn Future<Output = Result<AnalysisResult, AnalysisError>> + Send + 'a>>;

/// External referral interpretation service.
pub trait ReferralAnalyzer: Send + Sync {
    fn analyze<'a>(&'a self, record: &'a Record) -> AnalysisFuture<'a>;
}

/// Deterministic offline analyzer based on keywords in the referral narrative.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeywordAnalyzer;

const SUSPICIOUS_TERMS: [&str; 6] = [
    "rapid",
    "changing",
    "bleeding",
    "melanoma",
    "ulcerat",
    "irregular",
];

impl KeywordAnalyzer {
    pub fn assess(&self, record: &Record) -> AnalysisResult {
        let note = record.clinical_note.to_lowercase();
        let hits: Vec<&str> = SUSPICIOUS_TERMS
            .iter()
            .copied()
            .filter(|term| note.contains(term))
            .collect();

        let (urgency, pathway) = if hits.is_empty() {
            ("Routine", "Routine Outpatient Clinic")
        } else {
            ("2WW", "Excision (See & Treat)")
        };

        let mut summary = if hits.is_empty() {
            format!("No red-flag features described for {}.", record.name)
        } else {
            format!(
                "Referral for {} describes red-flag features ({}).",
                record.name,
                hits.join(", ")
            )
        };
        if record.is_on_anticoagulant() {
            summary.push_str(&format!(
                " Check {} status before any procedure.",
                ANTICOAGULANT_MARKERS[1]
            ));
        }

        AnalysisResult {
            summary,
            urgency_recommendation: urgency.to_string(),
            suggested_pathway: pathway.to_string(),
        }
    }
}

impl ReferralAnalyzer for KeywordAnalyzer {
    fn analyze<'a>(&'a self, record: &'a Record) -> AnalysisFuture<'a> {
        Box::pin(async move { Ok(self.assess(record)) })
    }
}

// ============================================================================
// Per-widget state
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AnalysisPhase {
    #[default]
    Idle,
    Busy,
    Ready(AnalysisResult),
    Failed(String),
}

static IDLE: AnalysisPhase = AnalysisPhase::Idle;

/// Proof that a request was started; required to report its outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisTicket {
    pub widget_id: String,
    pub record_id: String,
    pub generation: u64,
}

#[derive(Clone, Debug, Default)]
struct WidgetAnalysis {
    record_id: String,
    generation: u64,
    phase: AnalysisPhase,
}

/// Analysis state for every analysis widget, scoped to the selected record.
#[derive(Clone, Debug, Default)]
pub struct AnalysisBoard {
    selected: Option<String>,
    widgets: BTreeMap<String, WidgetAnalysis>,
}

impl AnalysisBoard {
    /// Record a selection change. State held for any other record is cleared and its
    /// outstanding tickets become stale.
    pub fn select(&mut self, record_id: Option<&str>) {
        self.selected = record_id.map(str::to_string);
        for state in self.widgets.values_mut() {
            if Some(state.record_id.as_str()) != record_id {
                state.record_id = record_id.unwrap_or_default().to_string();
                state.generation += 1;
                state.phase = AnalysisPhase::Idle;
            }
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Current phase of `widget_id` for `record_id`; idle if its state belongs elsewhere.
    pub fn phase_for(&self, widget_id: &str, record_id: &str) -> &AnalysisPhase {
        match self.widgets.get(widget_id) {
            Some(state) if state.record_id == record_id => &state.phase,
            _ => &IDLE,
        }
    }

    /// Start a request, clearing any previous result or error.
    ///
    /// # Returns
    ///
    /// `None` while a request for the same widget and record is already in flight.
    pub fn begin(&mut self, widget_id: &str, record_id: &str) -> Option<AnalysisTicket> {
        let state = self.widgets.entry(widget_id.to_string()).or_default();
        if state.record_id != record_id {
            state.record_id = record_id.to_string();
            state.generation += 1;
        } else if state.phase == AnalysisPhase::Busy {
            return None;
        }
        state.phase = AnalysisPhase::Busy;

        Some(AnalysisTicket {
            widget_id: widget_id.to_string(),
            record_id: record_id.to_string(),
            generation: state.generation,
        })
    }

    /// Store the outcome of the request identified by `ticket`.
    ///
    /// # Returns
    ///
    /// `false` if the ticket is stale; the outcome is discarded.
    pub fn complete(
        &mut self,
        ticket: &AnalysisTicket,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) -> bool {
        let Some(state) = self.widgets.get_mut(&ticket.widget_id) else {
            tracing::warn!("discarding analysis for unknown widget {}", ticket.widget_id);
            return false;
        };

        if state.record_id != ticket.record_id
            || state.generation != ticket.generation
            || state.phase != AnalysisPhase::Busy
        {
            tracing::warn!(
                "discarding stale analysis for widget {} (record {}, generation {})",
                ticket.widget_id,
                ticket.record_id,
                ticket.generation
            );
            return false;
        }

        state.phase = match outcome {
            Ok(result) => AnalysisPhase::Ready(result),
            Err(err) => AnalysisPhase::Failed(err.to_string()),
        };
        true
    }
}
