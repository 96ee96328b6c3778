//! Static checklist with completion counts.

use super::WidgetConfig;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgressTrackerProps {
    pub items: Vec<ChecklistItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChecklistItem {
    pub label: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProgressTrackerView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub items: Vec<ChecklistItem>,
    pub completed: usize,
    pub total: usize,
}

pub fn render(widget: &WidgetConfig, props: &ProgressTrackerProps) -> ProgressTrackerView {
    ProgressTrackerView {
        title: widget.title.clone(),
        items: props.items.clone(),
        completed: props.items.iter().filter(|item| item.done).count(),
        total: props.items.len(),
    }
}
