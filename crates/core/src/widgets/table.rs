//! Tabular view over a filtered subset of the context's records.

use super::{Badge, WidgetConfig};
use crate::constants::{DEFAULT_TABLE_ACTION_ID, DEFAULT_TABLE_ACTION_LABEL, TABLE_EMPTY_MESSAGE};
use crate::context::PersonaContext;
use crate::filter::{apply_filter, RecordPredicate};
use crate::record::{Record, RecordField};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableProps {
    pub columns: Vec<TableColumn>,
    pub filter: Option<RecordPredicate>,
    pub empty_message: Option<String>,
}

impl TableProps {
    /// True when an actions column in this table triggers `action_id`.
    pub fn offers_action(&self, action_id: &str) -> bool {
        self.columns.iter().any(|col| match &col.kind {
            ColumnKind::Actions { action_id: id, .. } => id == action_id,
            _ => false,
        })
    }

    /// Rows shown by the table, in context order.
    pub fn visible_records(&self, records: &[Record]) -> Vec<Record> {
        apply_filter(self.filter.as_ref(), records)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "TableColumnWire")]
pub struct TableColumn {
    pub label: String,
    pub kind: ColumnKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Plain(RecordField),
    /// Urgency and status get their own tones; other fields use the default tone.
    Badge(RecordField),
    Actions { action_id: String, label: String },
    /// Primary value with a secondary line underneath.
    Paired {
        primary: RecordField,
        secondary: RecordField,
    },
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ColumnTypeWire {
    #[default]
    Plain,
    Badge,
    Actions,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TableColumnWire {
    key: String,
    label: String,
    #[serde(default, rename = "type")]
    column_type: ColumnTypeWire,
    #[serde(default, alias = "subKey")]
    sub_key: Option<String>,
    #[serde(default)]
    action_id: Option<String>,
    #[serde(default)]
    action_label: Option<String>,
}

impl From<TableColumnWire> for TableColumn {
    fn from(wire: TableColumnWire) -> Self {
        let field = RecordField::from(wire.key);
        let kind = match (wire.column_type, wire.sub_key) {
            (ColumnTypeWire::Badge, _) => ColumnKind::Badge(field),
            (ColumnTypeWire::Actions, _) => ColumnKind::Actions {
                action_id: wire
                    .action_id
                    .unwrap_or_else(|| DEFAULT_TABLE_ACTION_ID.to_string()),
                label: wire
                    .action_label
                    .unwrap_or_else(|| DEFAULT_TABLE_ACTION_LABEL.to_string()),
            },
            (ColumnTypeWire::Plain, Some(sub_key)) => ColumnKind::Paired {
                primary: field,
                secondary: RecordField::from(sub_key),
            },
            (ColumnTypeWire::Plain, None) => ColumnKind::Plain(field),
        };
        Self {
            label: wire.label,
            kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableCell {
    Text {
        value: String,
    },
    Badge {
        badge: Badge,
    },
    Action {
        action_id: String,
        label: String,
    },
    Paired {
        primary: String,
        secondary_label: String,
        secondary: String,
    },
}

impl TableCell {
    fn project(record: &Record, kind: &ColumnKind) -> Self {
        match kind {
            ColumnKind::Plain(field) => Self::Text {
                value: record.display_field(field),
            },
            ColumnKind::Badge(field) => Self::Badge {
                badge: Badge::for_field(record, field),
            },
            ColumnKind::Actions { action_id, label } => Self::Action {
                action_id: action_id.clone(),
                label: label.clone(),
            },
            ColumnKind::Paired { primary, secondary } => Self::Paired {
                primary: record.display_field(primary),
                secondary_label: secondary.label().to_string(),
                secondary: record.display_field(secondary),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub record_id: String,
    pub cells: Vec<TableCell>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
    /// Set only when there are no rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

pub fn render(widget: &WidgetConfig, props: &TableProps, ctx: &PersonaContext<'_>) -> TableView {
    let rows: Vec<TableRow> = props
        .visible_records(&ctx.records)
        .iter()
        .map(|record| TableRow {
            record_id: record.id.clone(),
            cells: props
                .columns
                .iter()
                .map(|col| TableCell::project(record, &col.kind))
                .collect(),
        })
        .collect();

    let empty_message = rows.is_empty().then(|| {
        props
            .empty_message
            .clone()
            .unwrap_or_else(|| TABLE_EMPTY_MESSAGE.to_string())
    });

    TableView {
        title: widget.title.clone(),
        headers: props.columns.iter().map(|col| col.label.clone()).collect(),
        rows,
        empty_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::{PersonaIdentity, PersonaRegistry};
    use crate::record::fixtures::{record, urgent};
    use crate::record::{BadgeTone, RecordStatus};
    use crate::widgets::test_support::widget;
    use crate::widgets::WidgetKind;

    const PROPS: &str = r#"columns:
  - { key: name, label: Patient, sub_key: mrn }
  - { key: procedure, label: Procedure }
  - { key: urgency, label: Priority, type: badge }
  - { key: actions, label: Action, type: actions }
filter: { kind: status_in, statuses: [Awaiting Scheduling] }
empty_message: Nothing waiting
"#;

    fn table_props(w: &WidgetConfig) -> &TableProps {
        match &w.kind {
            WidgetKind::Table(props) => props,
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn column_kinds_resolve_at_load() {
        let w = widget("table", WidgetKind::TABLE, PROPS);
        let props = table_props(&w);

        assert_eq!(
            props.columns[0].kind,
            ColumnKind::Paired {
                primary: RecordField::Name,
                secondary: RecordField::Mrn
            }
        );
        assert_eq!(props.columns[2].kind, ColumnKind::Badge(RecordField::Urgency));
        assert!(props.offers_action("find-slot"));
        assert!(!props.offers_action("reject"));
    }

    #[test]
    fn renders_filtered_rows_with_placeholders() {
        let w = widget("table", WidgetKind::TABLE, PROPS);
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let records = vec![
            urgent("1", RecordStatus::AwaitingScheduling),
            record("2", RecordStatus::Confirmed),
        ];
        let ctx = PersonaContext::build(
            registry.lookup(PersonaIdentity::WaitingListOffice),
            &records,
            None,
        );

        let view = render(&w, table_props(&w), &ctx);
        assert_eq!(view.headers, vec!["Patient", "Procedure", "Priority", "Action"]);
        assert_eq!(view.rows.len(), 1);
        assert!(view.empty_message.is_none());

        let cells = &view.rows[0].cells;
        assert_eq!(
            cells[0],
            TableCell::Paired {
                primary: "Patient 1".into(),
                secondary_label: "MRN".into(),
                secondary: "MRN-1".into()
            }
        );
        assert_eq!(cells[1], TableCell::Text { value: "N/A".into() });
        assert!(matches!(
            &cells[2],
            TableCell::Badge { badge } if badge.tone == BadgeTone::Error && badge.label == "Urgent"
        ));
        assert_eq!(
            cells[3],
            TableCell::Action {
                action_id: "find-slot".into(),
                label: "Find Slot".into()
            }
        );
    }

    #[test]
    fn empty_table_shows_configured_message() {
        let w = widget("table", WidgetKind::TABLE, PROPS);
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let ctx = PersonaContext::build(registry.lookup(PersonaIdentity::Management), &[], None);

        let view = render(&w, table_props(&w), &ctx);
        assert!(view.rows.is_empty());
        assert_eq!(view.empty_message.as_deref(), Some("Nothing waiting"));

        let bare = widget("bare", WidgetKind::TABLE, "columns: []");
        let view = render(&bare, table_props(&bare), &ctx);
        assert_eq!(view.empty_message.as_deref(), Some("No data available"));
    }
}
