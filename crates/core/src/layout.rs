//! Layout resolution: turning a persona configuration and a context into a dashboard view.

use crate::analysis::AnalysisBoard;
use crate::constants::{
    DEFAULT_LAYOUT_COLUMNS, DEFAULT_LAYOUT_GAP, DEFAULT_WIDGET_SPAN, EMPTY_STATE_HINT,
    EMPTY_STATE_TITLE,
};
use crate::context::PersonaContext;
use crate::filter::apply_filter;
use crate::persona::PersonaConfig;
use crate::record::Record;
use crate::widgets::{self, Badge, WidgetConfig, WidgetView};
use serde::{Deserialize, Serialize};

/// Only `grid` has defined geometry; the others are passed through for the host to lay out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Grid,
    Flex,
    Stack,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
    pub kind: LayoutKind,
    pub columns: Option<u32>,
    pub gap: Option<u32>,
    pub widgets: Vec<WidgetConfig>,
}

impl LayoutConfig {
    pub fn columns(&self) -> u32 {
        self.columns.unwrap_or(DEFAULT_LAYOUT_COLUMNS)
    }

    pub fn gap(&self) -> u32 {
        self.gap.unwrap_or(DEFAULT_LAYOUT_GAP)
    }

    /// True if any widget in the layout only makes sense with a selected record.
    pub fn requires_selection(&self) -> bool {
        self.widgets.iter().any(|w| w.kind.requires_selection())
    }
}

/// One grid cell. Cells keep their configured position even when the widget renders nothing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GridCell {
    pub widget_id: String,
    #[serde(rename = "type")]
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub span: u32,
    pub view: Option<WidgetView>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DashboardView {
    EmptyState {
        title: String,
        hint: String,
    },
    Grid {
        kind: LayoutKind,
        columns: u32,
        gap: u32,
        cells: Vec<GridCell>,
    },
}

impl DashboardView {
    pub fn cells(&self) -> &[GridCell] {
        match self {
            Self::EmptyState { .. } => &[],
            Self::Grid { cells, .. } => cells,
        }
    }
}

/// Render the main dashboard for `config`.
///
/// An empty filtered set combined with a selection-dependent layout yields the single empty
/// state; otherwise every widget is dispatched in configured order.
pub fn render_dashboard(
    config: &PersonaConfig,
    ctx: &PersonaContext<'_>,
    analysis: &AnalysisBoard,
) -> DashboardView {
    let layout = &config.layout;
    if ctx.records.is_empty() && layout.requires_selection() {
        tracing::debug!("{} dashboard has no records; showing empty state", config.persona);
        return DashboardView::EmptyState {
            title: EMPTY_STATE_TITLE.to_string(),
            hint: EMPTY_STATE_HINT.to_string(),
        };
    }

    let cells = layout
        .widgets
        .iter()
        .map(|widget| GridCell {
            widget_id: widget.id.to_string(),
            tag: widget.kind.tag().to_string(),
            title: widget.title.clone(),
            subtitle: widget.subtitle.clone(),
            span: widget.span.unwrap_or(DEFAULT_WIDGET_SPAN),
            view: widgets::dispatch(widget, ctx, analysis),
        })
        .collect();

    DashboardView::Grid {
        kind: layout.kind,
        columns: layout.columns(),
        gap: layout.gap(),
        cells,
    }
}

// ============================================================================
// Sidebar
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SidebarEntry {
    pub record_id: String,
    pub name: String,
    pub mrn: String,
    pub urgency: Badge,
    pub status: Badge,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SidebarView {
    pub show_patient_list: bool,
    pub entries: Vec<SidebarEntry>,
}

/// Render the side navigation list. The sidebar filter applies to the full record set,
/// independently of the main dashboard filter.
pub fn render_sidebar(
    config: &PersonaConfig,
    records: &[Record],
    selected_id: Option<&str>,
) -> SidebarView {
    let Some(sidebar) = config.sidebar.as_ref().filter(|s| s.show_patient_list) else {
        return SidebarView {
            show_patient_list: false,
            entries: Vec::new(),
        };
    };

    let entries = apply_filter(sidebar.filter.as_ref(), records)
        .into_iter()
        .map(|record| SidebarEntry {
            selected: selected_id == Some(record.id.as_str()),
            urgency: Badge::urgency(record.urgency),
            status: Badge::status(record.status),
            record_id: record.id,
            name: record.name,
            mrn: record.mrn,
        })
        .collect();

    SidebarView {
        show_patient_list: true,
        entries,
    }
}
