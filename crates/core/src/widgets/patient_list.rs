//! Compact record list over a filtered subset of the context.

use super::{Badge, WidgetConfig};
use crate::constants::LIST_EMPTY_MESSAGE;
use crate::context::PersonaContext;
use crate::filter::{apply_filter, RecordPredicate};
use crate::record::{BadgeTone, Record, RecordField};
use serde::{Deserialize, Serialize};

const CONFIRMED_BADGE: &str = "Confirmed";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListVariant {
    #[default]
    Default,
    Compact,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatientListProps {
    pub variant: ListVariant,
    pub filter: Option<RecordPredicate>,
    pub empty_message: Option<String>,
    /// Marks every listed record with a "Confirmed" badge.
    pub show_badge: bool,
}

impl PatientListProps {
    pub fn visible_records(&self, records: &[Record]) -> Vec<Record> {
        apply_filter(self.filter.as_ref(), records)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatientListItem {
    pub record_id: String,
    pub name: String,
    pub procedure: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<Badge>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatientListView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub variant: ListVariant,
    pub items: Vec<PatientListItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

pub fn render(
    widget: &WidgetConfig,
    props: &PatientListProps,
    ctx: &PersonaContext<'_>,
) -> PatientListView {
    let items: Vec<PatientListItem> = props
        .visible_records(&ctx.records)
        .iter()
        .map(|record| PatientListItem {
            record_id: record.id.clone(),
            name: record.display_field(&RecordField::Name),
            procedure: record.display_field(&RecordField::Procedure),
            badge: props.show_badge.then(|| Badge {
                label: CONFIRMED_BADGE.to_string(),
                tone: BadgeTone::Success,
            }),
        })
        .collect();

    let empty_message = items.is_empty().then(|| {
        props
            .empty_message
            .clone()
            .unwrap_or_else(|| LIST_EMPTY_MESSAGE.to_string())
    });

    PatientListView {
        title: widget.title.clone(),
        variant: props.variant,
        items,
        empty_message,
    }
}
