//! Action buttons for the selected record.
//!
//! Rendering only lists the buttons; pressing one comes back in as an
//! [`ActionTrigger`](crate::actions::ActionTrigger) and is resolved by
//! [`trigger_action`](crate::actions::trigger_action).

use super::WidgetConfig;
use crate::actions::ActionVariant;
use crate::context::PersonaContext;
use crate::record::RecordPatch;
use careboard_types::Slug;
use serde::{Deserialize, Serialize};

const DEFAULT_TITLE: &str = "Actions";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActionPanelProps {
    pub actions: Vec<PanelAction>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PanelAction {
    pub id: Slug,
    pub label: String,
    #[serde(default)]
    pub variant: ActionVariant,
    #[serde(default)]
    pub badge: Option<String>,
    /// Generic patch used when the persona has no action with this id.
    #[serde(default)]
    pub outcome: Option<RecordPatch>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionPanelView {
    pub title: String,
    pub record_id: String,
    pub buttons: Vec<ActionButton>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionButton {
    pub action_id: String,
    pub label: String,
    pub variant: ActionVariant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

pub fn render(
    widget: &WidgetConfig,
    props: &ActionPanelProps,
    ctx: &PersonaContext<'_>,
) -> Option<ActionPanelView> {
    let record = ctx.selected.as_ref()?;

    Some(ActionPanelView {
        title: widget.title.as_deref().unwrap_or(DEFAULT_TITLE).to_string(),
        record_id: record.id.clone(),
        buttons: props
            .actions
            .iter()
            .map(|action| ActionButton {
                action_id: action.id.to_string(),
                label: action.label.clone(),
                variant: action.variant,
                badge: action.badge.clone(),
            })
            .collect(),
    })
}
