//! Static alert card.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    #[default]
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertCardProps {
    pub title: String,
    pub message: String,
    #[serde(default, alias = "variant")]
    pub severity: AlertSeverity,
    #[serde(default)]
    pub action: Option<AlertAction>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertAction {
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AlertView {
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_label: Option<String>,
}

pub fn render(props: &AlertCardProps) -> AlertView {
    AlertView {
        title: props.title.clone(),
        message: props.message.clone(),
        severity: props.severity,
        action_label: props.action.as_ref().map(|a| a.label.clone()),
    }
}
