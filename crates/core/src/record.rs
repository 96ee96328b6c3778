//! Case record model.
//!
//! A [`Record`] is a referral moving through the intake → triage → scheduling pathway. The
//! engine never stores records itself: it reads them out of the host's collection and asks
//! for replacements through the mutation callback (see [`crate::context::RecordSink`]).
//!
//! Field names on the wire are camelCase so that existing referral exports can be loaded
//! unchanged.

use crate::constants::{ANTICOAGULANT_MARKERS, MISSING_VALUE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position of a referral in the pathway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
    #[serde(rename = "Intake Review")]
    IntakeReview,
    #[serde(rename = "Triage Pending")]
    TriagePending,
    #[serde(rename = "Form Pending")]
    FormPending,
    #[serde(rename = "Awaiting Scheduling")]
    AwaitingScheduling,
    Scheduled,
    Confirmed,
    Rejected,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IntakeReview => "Intake Review",
            Self::TriagePending => "Triage Pending",
            Self::FormPending => "Form Pending",
            Self::AwaitingScheduling => "Awaiting Scheduling",
            Self::Scheduled => "Scheduled",
            Self::Confirmed => "Confirmed",
            Self::Rejected => "Rejected",
        }
    }

    /// Badge tone used wherever a status is rendered.
    pub fn tone(&self) -> BadgeTone {
        match self {
            Self::Confirmed | Self::Scheduled => BadgeTone::Success,
            Self::IntakeReview | Self::AwaitingScheduling => BadgeTone::Warning,
            Self::Rejected => BadgeTone::Error,
            Self::TriagePending => BadgeTone::Info,
            Self::FormPending => BadgeTone::Default,
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clinical urgency assigned by the GP or at triage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    Urgent,
    Routine,
    #[serde(rename = "2WW")]
    TwoWeekWait,
    #[serde(rename = "Inter Regular")]
    InterRegular,
    #[default]
    #[serde(rename = "Not Set")]
    NotSet,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "Urgent",
            Self::Routine => "Routine",
            Self::TwoWeekWait => "2WW",
            Self::InterRegular => "Inter Regular",
            Self::NotSet => "Not Set",
        }
    }

    pub fn tone(&self) -> BadgeTone {
        match self {
            Self::Urgent | Self::TwoWeekWait => BadgeTone::Error,
            Self::InterRegular => BadgeTone::Warning,
            Self::Routine => BadgeTone::Info,
            Self::NotSet => BadgeTone::Default,
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual emphasis of a rendered badge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    #[default]
    Default,
    Success,
    Warning,
    Error,
    Info,
}

/// A referral case record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mrn: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub referral_date: String,
    pub status: RecordStatus,
    #[serde(default)]
    pub urgency: Urgency,
    /// Free-text narrative supplied with the referral.
    #[serde(default, rename = "gpNote")]
    pub clinical_note: String,
    #[serde(default)]
    pub comorbidities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Record {
    /// Returns the textual value of `field`, or `None` when the record has no value for it.
    pub fn field_value(&self, field: &RecordField) -> Option<String> {
        let value = match field {
            RecordField::Id => self.id.clone(),
            RecordField::Name => self.name.clone(),
            RecordField::Mrn => self.mrn.clone(),
            RecordField::Dob => self.dob.clone(),
            RecordField::ReferralDate => self.referral_date.clone(),
            RecordField::Status => self.status.to_string(),
            RecordField::Urgency => self.urgency.to_string(),
            RecordField::ClinicalNote => self.clinical_note.clone(),
            RecordField::Procedure => self.procedure.clone().unwrap_or_default(),
            RecordField::Comorbidities => self.comorbidities.join(", "),
            RecordField::LastUpdated => self
                .last_updated
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_default(),
            RecordField::Other(_) => String::new(),
        };

        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Like [`Record::field_value`] but substitutes the missing-value placeholder.
    pub fn display_field(&self, field: &RecordField) -> String {
        self.field_value(field)
            .unwrap_or_else(|| MISSING_VALUE.to_string())
    }

    /// True when any comorbidity mentions warfarin or anticoagulant therapy, in any letter case.
    pub fn is_on_anticoagulant(&self) -> bool {
        self.comorbidities.iter().any(|c| {
            let lower = c.to_lowercase();
            ANTICOAGULANT_MARKERS
                .iter()
                .any(|marker| lower.contains(marker))
        })
    }
}

/// A field of [`Record`] addressable from configuration.
///
/// Unrecognised keys are kept as [`RecordField::Other`] and always project to the
/// missing-value placeholder rather than failing the configuration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordField {
    Id,
    Name,
    Mrn,
    Dob,
    ReferralDate,
    Status,
    Urgency,
    ClinicalNote,
    Comorbidities,
    Procedure,
    LastUpdated,
    Other(String),
}

impl RecordField {
    pub fn key(&self) -> &str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Mrn => "mrn",
            Self::Dob => "dob",
            Self::ReferralDate => "referralDate",
            Self::Status => "status",
            Self::Urgency => "urgency",
            Self::ClinicalNote => "gpNote",
            Self::Comorbidities => "comorbidities",
            Self::Procedure => "procedure",
            Self::LastUpdated => "lastUpdated",
            Self::Other(key) => key,
        }
    }

    /// Human-readable label used by field projections.
    pub fn label(&self) -> &str {
        match self {
            Self::Name => "Full Name",
            Self::Mrn => "MRN",
            Self::Dob => "Date of Birth",
            Self::ReferralDate => "Referral Date",
            Self::Urgency => "Urgency",
            Self::Status => "Status",
            Self::Procedure => "Procedure",
            other => other.key(),
        }
    }
}

impl From<String> for RecordField {
    fn from(key: String) -> Self {
        match key.as_str() {
            "id" => Self::Id,
            "name" => Self::Name,
            "mrn" => Self::Mrn,
            "dob" => Self::Dob,
            "referralDate" => Self::ReferralDate,
            "status" => Self::Status,
            "urgency" => Self::Urgency,
            "gpNote" => Self::ClinicalNote,
            "comorbidities" => Self::Comorbidities,
            "procedure" => Self::Procedure,
            "lastUpdated" => Self::LastUpdated,
            _ => Self::Other(key),
        }
    }
}

impl From<RecordField> for String {
    fn from(field: RecordField) -> Self {
        field.key().to_string()
    }
}

/// Partial field update applied by generic outcomes and command handlers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.urgency.is_none() && self.procedure.is_none()
    }

    /// Produces a new record with the patched fields replaced; `record` is left untouched.
    pub fn apply_to(&self, record: &Record) -> Record {
        let mut updated = record.clone();
        if let Some(status) = self.status {
            updated.status = status;
        }
        if let Some(urgency) = self.urgency {
            updated.urgency = urgency;
        }
        if let Some(procedure) = &self.procedure {
            updated.procedure = Some(procedure.clone());
        }
        updated
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::record;
    use super::*;

    #[test]
    fn parses_camel_case_referral_export() {
        let input = r#"{
            "id": "p-101",
            "name": "Margaret Thompson",
            "mrn": "NHS-4421",
            "dob": "12/04/1958",
            "referralDate": "08/01/2024",
            "status": "Awaiting Scheduling",
            "urgency": "2WW",
            "gpNote": "Rapidly growing lesion.",
            "comorbidities": ["Type 2 Diabetes", "On Warfarin"],
            "procedure": "Two Week Wait Clinic",
            "lastUpdated": "2024-01-09T10:00:00Z"
        }"#;

        let parsed: Record = serde_json::from_str(input).expect("parse record");
        assert_eq!(parsed.status, RecordStatus::AwaitingScheduling);
        assert_eq!(parsed.urgency, Urgency::TwoWeekWait);
        assert_eq!(parsed.clinical_note, "Rapidly growing lesion.");
        assert_eq!(parsed.procedure.as_deref(), Some("Two Week Wait Clinic"));
        assert!(parsed.last_updated.is_some());
    }

    #[test]
    fn missing_optional_fields_default() {
        let parsed: Record =
            serde_json::from_str(r#"{"id": "p-1", "status": "Intake Review"}"#).expect("parse");
        assert_eq!(parsed.urgency, Urgency::NotSet);
        assert!(parsed.comorbidities.is_empty());
        assert_eq!(parsed.display_field(&RecordField::Name), MISSING_VALUE);
    }

    #[test]
    fn unknown_field_projects_placeholder() {
        let r = record("1", RecordStatus::IntakeReview);
        let field = RecordField::from("nhsNumber".to_string());
        assert_eq!(field, RecordField::Other("nhsNumber".into()));
        assert_eq!(r.display_field(&field), "N/A");
        assert_eq!(field.label(), "nhsNumber");
    }

    #[test]
    fn procedure_placeholder_when_absent() {
        let r = record("1", RecordStatus::IntakeReview);
        assert_eq!(r.display_field(&RecordField::Procedure), "N/A");
        assert_eq!(r.display_field(&RecordField::Mrn), "MRN-1");
    }

    #[test]
    fn anticoagulant_detection_is_case_insensitive_substring() {
        let mut r = record("1", RecordStatus::TriagePending);
        r.comorbidities = vec!["Hypertension".into(), "takes WARFARIN daily".into()];
        assert!(r.is_on_anticoagulant());

        r.comorbidities = vec!["Prior Anticoagulant therapy".into()];
        assert!(r.is_on_anticoagulant());

        r.comorbidities = vec!["Hypertension".into(), "Asthma".into()];
        assert!(!r.is_on_anticoagulant());

        r.comorbidities.clear();
        assert!(!r.is_on_anticoagulant());
    }

    #[test]
    fn patch_replaces_only_supplied_fields() {
        let r = record("1", RecordStatus::TriagePending);
        let patch = RecordPatch {
            status: None,
            urgency: Some(Urgency::Urgent),
            procedure: Some("Excision (See & Treat)".into()),
        };

        let updated = patch.apply_to(&r);
        assert_eq!(updated.status, RecordStatus::TriagePending);
        assert_eq!(updated.urgency, Urgency::Urgent);
        assert_eq!(updated.procedure.as_deref(), Some("Excision (See & Treat)"));
        assert_eq!(r.urgency, Urgency::NotSet);
    }

    #[test]
    fn badge_tones_follow_pathway_semantics() {
        assert_eq!(Urgency::TwoWeekWait.tone(), BadgeTone::Error);
        assert_eq!(Urgency::InterRegular.tone(), BadgeTone::Warning);
        assert_eq!(RecordStatus::Scheduled.tone(), BadgeTone::Success);
        assert_eq!(RecordStatus::TriagePending.tone(), BadgeTone::Info);
    }
}
