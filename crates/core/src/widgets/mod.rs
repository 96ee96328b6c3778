//! Widget kinds and the dispatcher.
//!
//! Every widget in a layout carries a [`WidgetKind`]: a closed union whose variants hold the
//! typed properties for that kind. Properties arrive as an untyped YAML bag in persona files
//! and are parsed into the variant once, in [`WidgetKind::from_wire`]. Adding a widget kind
//! means adding a variant here plus one arm in [`dispatch`]; the compiler finds the rest.
//!
//! A type tag that is not recognised is kept as [`WidgetKind::Unknown`]: the configuration
//! still loads and the widget renders nothing, with a warning.

pub mod action_panel;
pub mod alert;
pub mod analysis;
pub mod custom;
pub mod metrics;
pub mod patient_details;
pub mod patient_list;
pub mod progress;
pub mod table;

use crate::analysis::AnalysisBoard;
use crate::context::PersonaContext;
use crate::filter::RecordPredicate;
use crate::record::{BadgeTone, Record, RecordField, RecordStatus, Urgency};
use crate::{DashboardError, DashboardResult};
use careboard_types::Slug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use action_panel::{ActionPanelProps, ActionPanelView, PanelAction};
pub use alert::{AlertCardProps, AlertSeverity, AlertView};
pub use analysis::{AnalysisProps, AnalysisView};
pub use custom::{CustomProps, CustomView};
pub use metrics::{
    ComputedMetric, MetricCardProps, MetricSource, MetricTile, MetricTileView, MetricValue,
    MetricsGridProps, MetricsGridView,
};
pub use patient_details::{PatientDetailsProps, PatientDetailsView};
pub use patient_list::{PatientListProps, PatientListView};
pub use progress::{ChecklistItem, ProgressTrackerProps, ProgressTrackerView};
pub use table::{TableCell, TableColumn, TableProps, TableView};

/// One configured widget in a persona layout.
#[derive(Clone, Debug, PartialEq)]
pub struct WidgetConfig {
    /// Unique within the layout.
    pub id: Slug,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    /// Grid columns to occupy. Not checked against the layout's column count.
    pub span: Option<u32>,
    pub condition: Option<WidgetCondition>,
    pub kind: WidgetKind,
}

/// Visibility predicate over the (already filtered) context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WidgetCondition {
    HasSelection,
    HasRecords,
    MinRecords { count: usize },
    SelectedMatches { predicate: RecordPredicate },
}

impl WidgetCondition {
    pub fn evaluate(&self, ctx: &PersonaContext<'_>) -> bool {
        match self {
            Self::HasSelection => ctx.selected.is_some(),
            Self::HasRecords => !ctx.records.is_empty(),
            Self::MinRecords { count } => ctx.records.len() >= *count,
            Self::SelectedMatches { predicate } => {
                ctx.selected.as_ref().is_some_and(|r| predicate.matches(r))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum WidgetKind {
    PatientDetails(PatientDetailsProps),
    ActionPanel(ActionPanelProps),
    AiAnalysis(AnalysisProps),
    ProgressTracker(ProgressTrackerProps),
    MetricsGrid(MetricsGridProps),
    MetricCard(MetricCardProps),
    Table(TableProps),
    PatientList(PatientListProps),
    AlertCard(AlertCardProps),
    Custom(CustomProps),
    /// A type tag this build does not implement.
    Unknown { tag: String },
}

impl WidgetKind {
    pub const PATIENT_DETAILS: &'static str = "patient-details";
    pub const ACTION_PANEL: &'static str = "action-panel";
    pub const AI_ANALYSIS: &'static str = "ai-analysis";
    pub const PROGRESS_TRACKER: &'static str = "progress-tracker";
    pub const METRICS_GRID: &'static str = "metrics-grid";
    pub const METRIC_CARD: &'static str = "metric-card";
    pub const TABLE: &'static str = "table";
    pub const PATIENT_LIST: &'static str = "patient-list";
    pub const ALERT_CARD: &'static str = "alert-card";
    pub const CUSTOM: &'static str = "custom";

    pub fn tag(&self) -> &str {
        match self {
            Self::PatientDetails(_) => Self::PATIENT_DETAILS,
            Self::ActionPanel(_) => Self::ACTION_PANEL,
            Self::AiAnalysis(_) => Self::AI_ANALYSIS,
            Self::ProgressTracker(_) => Self::PROGRESS_TRACKER,
            Self::MetricsGrid(_) => Self::METRICS_GRID,
            Self::MetricCard(_) => Self::METRIC_CARD,
            Self::Table(_) => Self::TABLE,
            Self::PatientList(_) => Self::PATIENT_LIST,
            Self::AlertCard(_) => Self::ALERT_CARD,
            Self::Custom(_) => Self::CUSTOM,
            Self::Unknown { tag } => tag,
        }
    }

    /// Kinds that only make sense with a selected record.
    pub fn requires_selection(&self) -> bool {
        matches!(
            self,
            Self::PatientDetails(_) | Self::AiAnalysis(_) | Self::ActionPanel(_)
        )
    }

    /// Parse the properties bag for the kind named by `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::WidgetProps`] when `props` does not fit a known kind.
    /// Unknown tags are not an error.
    pub fn from_wire(widget_id: &Slug, tag: &str, props: serde_yaml::Value) -> DashboardResult<Self> {
        let kind = match tag {
            Self::PATIENT_DETAILS => Self::PatientDetails(parse_props(widget_id, Self::PATIENT_DETAILS, props)?),
            Self::ACTION_PANEL => Self::ActionPanel(parse_props(widget_id, Self::ACTION_PANEL, props)?),
            Self::AI_ANALYSIS => Self::AiAnalysis(parse_props(widget_id, Self::AI_ANALYSIS, props)?),
            Self::PROGRESS_TRACKER => {
                Self::ProgressTracker(parse_props(widget_id, Self::PROGRESS_TRACKER, props)?)
            }
            Self::METRICS_GRID => Self::MetricsGrid(parse_props(widget_id, Self::METRICS_GRID, props)?),
            Self::METRIC_CARD => Self::MetricCard(parse_props(widget_id, Self::METRIC_CARD, props)?),
            Self::TABLE => Self::Table(parse_props(widget_id, Self::TABLE, props)?),
            Self::PATIENT_LIST => Self::PatientList(parse_props(widget_id, Self::PATIENT_LIST, props)?),
            Self::ALERT_CARD => Self::AlertCard(parse_props(widget_id, Self::ALERT_CARD, props)?),
            Self::CUSTOM => Self::Custom(parse_props(widget_id, Self::CUSTOM, props)?),
            other => {
                tracing::warn!("widget {} has unknown type '{}'; it will not render", widget_id, other);
                Self::Unknown {
                    tag: other.to_string(),
                }
            }
        };
        Ok(kind)
    }
}

fn parse_props<T: DeserializeOwned>(
    widget_id: &Slug,
    kind: &'static str,
    props: serde_yaml::Value,
) -> DashboardResult<T> {
    // A widget with no `props` key behaves like one with an empty mapping.
    let props = match props {
        serde_yaml::Value::Null => serde_yaml::Value::Mapping(serde_yaml::Mapping::new()),
        other => other,
    };

    serde_path_to_error::deserialize(props).map_err(|err| {
        let path = err.path().to_string();
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        DashboardError::WidgetProps {
            widget_id: widget_id.to_string(),
            kind,
            path,
            message: err.into_inner().to_string(),
        }
    })
}

// ============================================================================
// Shared view fragments
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: String,
    pub tone: BadgeTone,
}

impl Badge {
    pub fn urgency(urgency: Urgency) -> Self {
        Self {
            label: urgency.to_string(),
            tone: urgency.tone(),
        }
    }

    pub fn status(status: RecordStatus) -> Self {
        Self {
            label: status.to_string(),
            tone: status.tone(),
        }
    }

    /// Badge for an arbitrary field: urgency and status get their own tones.
    pub fn for_field(record: &Record, field: &RecordField) -> Self {
        match field {
            RecordField::Urgency => Self::urgency(record.urgency),
            RecordField::Status => Self::status(record.status),
            other => Self {
                label: record.display_field(other),
                tone: BadgeTone::Default,
            },
        }
    }
}

/// A labelled value in a field projection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldEntry {
    pub key: String,
    pub label: String,
    pub value: String,
}

impl FieldEntry {
    pub fn project(record: &Record, field: &RecordField) -> Self {
        Self {
            key: field.key().to_string(),
            label: field.label().to_string(),
            value: record.display_field(field),
        }
    }
}

/// Rendered output of one widget.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WidgetView {
    PatientDetails(PatientDetailsView),
    ActionPanel(ActionPanelView),
    AiAnalysis(AnalysisView),
    ProgressTracker(ProgressTrackerView),
    MetricsGrid(MetricsGridView),
    MetricCard(MetricTileView),
    Table(TableView),
    PatientList(PatientListView),
    AlertCard(AlertView),
    Custom(CustomView),
}

/// Render one widget against the shared context.
///
/// The visibility condition is checked first; per-kind selection requirements are applied
/// inside each widget. `None` means "render nothing", which is never an error.
pub fn dispatch(
    widget: &WidgetConfig,
    ctx: &PersonaContext<'_>,
    analysis: &AnalysisBoard,
) -> Option<WidgetView> {
    if let Some(condition) = &widget.condition {
        if !condition.evaluate(ctx) {
            return None;
        }
    }

    match &widget.kind {
        WidgetKind::PatientDetails(props) => Some(WidgetView::PatientDetails(
            patient_details::render(widget, props, ctx),
        )),
        WidgetKind::ActionPanel(props) => {
            action_panel::render(widget, props, ctx).map(WidgetView::ActionPanel)
        }
        WidgetKind::AiAnalysis(props) => {
            analysis::render(widget, props, ctx, analysis).map(WidgetView::AiAnalysis)
        }
        WidgetKind::ProgressTracker(props) => Some(WidgetView::ProgressTracker(progress::render(
            widget, props,
        ))),
        WidgetKind::MetricsGrid(props) => Some(WidgetView::MetricsGrid(metrics::render_grid(
            widget, props, ctx,
        ))),
        WidgetKind::MetricCard(props) => {
            Some(WidgetView::MetricCard(metrics::render_card(props, ctx)))
        }
        WidgetKind::Table(props) => Some(WidgetView::Table(table::render(widget, props, ctx))),
        WidgetKind::PatientList(props) => Some(WidgetView::PatientList(patient_list::render(
            widget, props, ctx,
        ))),
        WidgetKind::AlertCard(props) => Some(WidgetView::AlertCard(alert::render(props))),
        WidgetKind::Custom(props) => Some(WidgetView::Custom(custom::render(widget, props))),
        WidgetKind::Unknown { tag } => {
            tracing::warn!("unknown widget type '{}' for widget {}", tag, widget.id);
            None
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::widget;
    use super::*;
    use crate::persona::{PersonaIdentity, PersonaRegistry};
    use crate::record::fixtures::record;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    fn all_kinds() -> Vec<WidgetConfig> {
        vec![
            widget("a", WidgetKind::PATIENT_DETAILS, "{}"),
            widget("b", WidgetKind::ACTION_PANEL, "actions: []"),
            widget("c", WidgetKind::AI_ANALYSIS, "ai_enabled: true"),
            widget("d", WidgetKind::PROGRESS_TRACKER, "items: []"),
            widget("e", WidgetKind::METRICS_GRID, "metrics: []"),
            widget("f", WidgetKind::METRIC_CARD, "label: Backlog\nvalue_key: totalPatients"),
            widget("g", WidgetKind::TABLE, "columns: []"),
            widget("h", WidgetKind::PATIENT_LIST, "{}"),
            widget("i", WidgetKind::ALERT_CARD, "title: Heads up\nmessage: Check capacity"),
            widget("j", WidgetKind::CUSTOM, "component: TheatreLoadWidget"),
        ]
    }

    #[test]
    fn dispatch_is_total_over_known_kinds() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let config = registry.lookup(PersonaIdentity::Management);
        let records = vec![record("1", RecordStatus::IntakeReview)];
        let board = AnalysisBoard::default();

        let with_selection = PersonaContext::build(config, &records, Some(&records[0]));
        for w in all_kinds() {
            let view = dispatch(&w, &with_selection, &board);
            assert!(view.is_some(), "{} rendered nothing with a selection", w.kind.tag());
        }

        let without_selection = PersonaContext::build(config, &records, None);
        for w in all_kinds() {
            let view = dispatch(&w, &without_selection, &board);
            let expect_none = matches!(w.kind, WidgetKind::ActionPanel(_) | WidgetKind::AiAnalysis(_));
            assert_eq!(view.is_none(), expect_none, "{}", w.kind.tag());
        }
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            let bytes = self.0.lock().expect("log buffer").clone();
            String::from_utf8(bytes).expect("utf-8 log output")
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("log buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn unknown_tag_dispatches_to_nothing_with_a_warning() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let config = registry.lookup(PersonaIdentity::Admin);
        let ctx = PersonaContext::build(config, &[], None);

        let w = widget("z", "heatmap", "anything: goes");
        assert_eq!(w.kind.tag(), "heatmap");
        assert!(!w.kind.requires_selection());

        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let view = tracing::subscriber::with_default(subscriber, || {
            dispatch(&w, &ctx, &AnalysisBoard::default())
        });

        assert!(view.is_none());
        let output = logs.contents();
        assert!(output.contains("WARN"), "no warning logged: {output}");
        assert!(
            output.contains("unknown widget type 'heatmap'"),
            "unexpected log output: {output}"
        );
    }

    #[test]
    fn failing_condition_precedes_kind_dispatch() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let config = registry.lookup(PersonaIdentity::Management);
        let ctx = PersonaContext::build(config, &[], None);

        let mut w = widget("d", WidgetKind::PROGRESS_TRACKER, "items: []");
        w.condition = Some(WidgetCondition::HasRecords);
        assert!(dispatch(&w, &ctx, &AnalysisBoard::default()).is_none());

        w.condition = Some(WidgetCondition::MinRecords { count: 0 });
        assert!(dispatch(&w, &ctx, &AnalysisBoard::default()).is_some());
    }

    #[test]
    fn conditions_see_filtered_records() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let config = registry.lookup(PersonaIdentity::Admin);
        // Admin only sees Intake Review records.
        let records = vec![record("1", RecordStatus::Confirmed)];
        let ctx = PersonaContext::build(config, &records, Some(&records[0]));

        assert!(!WidgetCondition::HasRecords.evaluate(&ctx));
        assert!(WidgetCondition::HasSelection.evaluate(&ctx));
        assert!(WidgetCondition::SelectedMatches {
            predicate: RecordPredicate::StatusIn {
                statuses: vec![RecordStatus::Confirmed]
            }
        }
        .evaluate(&ctx));
    }

    #[test]
    fn missing_props_use_defaults() {
        let id = Slug::new("details").expect("slug");
        let kind = WidgetKind::from_wire(&id, WidgetKind::PATIENT_DETAILS, serde_yaml::Value::Null)
            .expect("null props");
        match kind {
            WidgetKind::PatientDetails(props) => assert_eq!(props.fields.len(), 4),
            other => panic!("expected patient details, got {other:?}"),
        }
    }

    #[test]
    fn props_errors_report_path() {
        let id = Slug::new("tracker").expect("slug");
        let props: serde_yaml::Value =
            serde_yaml::from_str("items:\n  - label: Photos\n    done: maybe\n").expect("yaml");
        let err = WidgetKind::from_wire(&id, WidgetKind::PROGRESS_TRACKER, props)
            .expect_err("done must be a bool");
        match err {
            DashboardError::WidgetProps { path, .. } => {
                assert!(path.contains("items[0].done"), "unexpected path {path}");
            }
            other => panic!("expected WidgetProps error, got {other:?}"),
        }
    }
}
