//! Patient profile for the selected record.

use super::{AlertSeverity, AlertView, Badge, FieldEntry, WidgetConfig};
use crate::constants::{
    ANTICOAGULANT_ALERT_MESSAGE, ANTICOAGULANT_ALERT_TITLE, NO_SELECTION_MESSAGE,
};
use crate::context::PersonaContext;
use crate::record::RecordField;
use serde::{Deserialize, Serialize};

const DEFAULT_TITLE: &str = "Patient Profile";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatientDetailsProps {
    pub fields: Vec<RecordField>,
    pub show_anticoagulant_alert: bool,
    pub show_gp_note: bool,
}

impl Default for PatientDetailsProps {
    fn default() -> Self {
        Self {
            fields: vec![
                RecordField::Name,
                RecordField::Mrn,
                RecordField::Dob,
                RecordField::ReferralDate,
            ],
            show_anticoagulant_alert: false,
            show_gp_note: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PatientDetailsView {
    NoSelection {
        title: String,
        message: String,
    },
    Profile {
        title: String,
        record_id: String,
        /// "GP Suggested" urgency shown in the header.
        suggested_urgency: Badge,
        fields: Vec<FieldEntry>,
        #[serde(skip_serializing_if = "Option::is_none")]
        gp_note: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        safety_alert: Option<AlertView>,
    },
}

pub fn render(
    widget: &WidgetConfig,
    props: &PatientDetailsProps,
    ctx: &PersonaContext<'_>,
) -> PatientDetailsView {
    let title = widget.title.as_deref().unwrap_or(DEFAULT_TITLE).to_string();

    let Some(record) = ctx.selected.as_ref() else {
        return PatientDetailsView::NoSelection {
            title,
            message: NO_SELECTION_MESSAGE.to_string(),
        };
    };

    let safety_alert = (props.show_anticoagulant_alert && record.is_on_anticoagulant()).then(|| {
        AlertView {
            title: ANTICOAGULANT_ALERT_TITLE.to_string(),
            message: ANTICOAGULANT_ALERT_MESSAGE.to_string(),
            severity: AlertSeverity::Error,
            action_label: None,
        }
    });

    PatientDetailsView::Profile {
        title,
        record_id: record.id.clone(),
        suggested_urgency: Badge::urgency(record.urgency),
        fields: props
            .fields
            .iter()
            .map(|field| FieldEntry::project(record, field))
            .collect(),
        gp_note: props
            .show_gp_note
            .then(|| record.display_field(&RecordField::ClinicalNote)),
        safety_alert,
    }
}
