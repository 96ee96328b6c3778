//! Placeholder for host-provided widgets.
//!
//! The engine knows nothing about a custom component beyond its name; hosts that recognise
//! the name substitute their own rendering.

use super::WidgetConfig;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomProps {
    pub component: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomView {
    pub widget_id: String,
    pub component: String,
}

pub fn render(widget: &WidgetConfig, props: &CustomProps) -> CustomView {
    CustomView {
        widget_id: widget.id.to_string(),
        component: props.component.clone(),
    }
}
