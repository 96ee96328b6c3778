//! YAML wire model for persona files.
//!
//! Persona files are parsed strictly (`deny_unknown_fields`) into wire structs and then
//! translated into domain types. Widget `props` stay an untyped YAML value on the wire and
//! are parsed into the typed properties of the widget's kind during translation, so a
//! configuration is validated exactly once, when it is loaded.

use super::{PersonaConfig, PersonaIdentity, PersonaMeta, SidebarConfig};
use crate::actions::{ActionCommand, ActionConfig, ActionVariant, CommandRegistry};
use crate::filter::RecordPredicate;
use crate::layout::{LayoutConfig, LayoutKind};
use crate::widgets::{WidgetCondition, WidgetConfig, WidgetKind};
use crate::{DashboardError, DashboardResult};
use careboard_types::{NonEmptyText, Slug};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PersonaWire {
    persona: PersonaIdentity,
    display_name: NonEmptyText,
    #[serde(default)]
    subtitle: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    filter: Option<RecordPredicate>,
    #[serde(default)]
    sidebar: Option<SidebarConfig>,
    layout: LayoutWire,
    #[serde(default)]
    actions: Vec<ActionWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutWire {
    #[serde(default)]
    kind: LayoutKind,
    #[serde(default)]
    columns: Option<u32>,
    #[serde(default)]
    gap: Option<u32>,
    widgets: Vec<WidgetWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WidgetWire {
    id: Slug,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    span: Option<u32>,
    #[serde(default)]
    props: serde_yaml::Value,
    #[serde(default)]
    condition: Option<WidgetCondition>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActionWire {
    id: Slug,
    label: NonEmptyText,
    #[serde(default)]
    variant: ActionVariant,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    condition: Option<RecordPredicate>,
    command: ActionCommand,
}

/// Parse one persona file.
///
/// `source_name` is only used in error messages.
///
/// # Errors
///
/// Returns [`DashboardError`] if:
/// - the YAML does not match the persona schema (the failing path is reported),
/// - a known widget kind has malformed `props`,
/// - two widgets in the layout share an id,
/// - an action names a handler that `commands` does not know.
pub fn parse_persona_yaml(
    source_name: &str,
    text: &str,
    commands: &CommandRegistry,
) -> DashboardResult<PersonaConfig> {
    let deserializer = serde_yaml::Deserializer::from_str(text);

    let wire = match serde_path_to_error::deserialize::<_, PersonaWire>(deserializer) {
        Ok(parsed) => parsed,
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>".to_string()
            } else {
                path
            };
            return Err(DashboardError::PersonaSchema {
                source_name: source_name.to_string(),
                path,
                message: source.to_string(),
            });
        }
    };

    wire_to_domain(wire, commands)
}

fn wire_to_domain(wire: PersonaWire, commands: &CommandRegistry) -> DashboardResult<PersonaConfig> {
    let persona = wire.persona;

    let mut seen = HashSet::new();
    let mut widgets = Vec::with_capacity(wire.layout.widgets.len());
    for widget in wire.layout.widgets {
        if !seen.insert(widget.id.clone()) {
            return Err(DashboardError::DuplicateWidgetId {
                persona,
                widget_id: widget.id.to_string(),
            });
        }

        let kind = WidgetKind::from_wire(&widget.id, &widget.kind, widget.props)?;
        widgets.push(WidgetConfig {
            id: widget.id,
            title: widget.title,
            subtitle: widget.subtitle,
            span: widget.span,
            condition: widget.condition,
            kind,
        });
    }

    let actions = wire
        .actions
        .into_iter()
        .map(|action| {
            let run = commands.resolve(action.command.handler.as_str()).ok_or_else(|| {
                DashboardError::UnknownHandler {
                    action_id: action.id.to_string(),
                    handler: action.command.handler.to_string(),
                }
            })?;
            Ok(ActionConfig {
                id: action.id,
                label: action.label,
                variant: action.variant,
                icon: action.icon,
                condition: action.condition,
                command: action.command,
                run,
            })
        })
        .collect::<DashboardResult<Vec<_>>>()?;

    Ok(PersonaConfig {
        persona,
        meta: PersonaMeta {
            persona,
            display_name: wire.display_name,
            subtitle: wire.subtitle,
            description: wire.description,
            icon: wire.icon,
        },
        filter: wire.filter,
        layout: LayoutConfig {
            kind: wire.layout.kind,
            columns: wire.layout.columns,
            gap: wire.layout.gap,
            widgets,
        },
        sidebar: wire.sidebar,
        actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"persona: management
display_name: Management
layout:
  widgets:
    - id: backlog
      type: metric-card
      props:
        label: Total Backlog
        value_key: totalPatients
"#;

    fn parse(text: &str) -> DashboardResult<PersonaConfig> {
        parse_persona_yaml("test.yaml", text, &CommandRegistry::builtin())
    }

    #[test]
    fn parses_minimal_persona() {
        let config = parse(MINIMAL).expect("parse minimal persona");
        assert_eq!(config.persona, PersonaIdentity::Management);
        assert!(config.filter.is_none());
        assert!(config.sidebar.is_none());
        assert!(config.actions.is_empty());
        assert_eq!(config.layout.widgets.len(), 1);
        assert_eq!(config.layout.widgets[0].kind.tag(), "metric-card");
    }

    #[test]
    fn strict_validation_rejects_unknown_keys() {
        let input = MINIMAL.replace("layout:", "colour: teal\nlayout:");
        let err = parse(&input).expect_err("should reject unknown key");
        match err {
            DashboardError::PersonaSchema { message, .. } => {
                assert!(message.contains("colour"));
            }
            other => panic!("expected PersonaSchema error, got {other:?}"),
        }
    }

    #[test]
    fn schema_errors_carry_the_failing_path() {
        let input = MINIMAL.replace("- id: backlog", "- id: \"back log\"");
        let err = parse(&input).expect_err("should reject invalid widget id");
        match err {
            DashboardError::PersonaSchema { path, .. } => {
                assert!(path.contains("widgets"), "unexpected path {path}");
            }
            other => panic!("expected PersonaSchema error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_props_are_rejected_at_load_time() {
        let input = MINIMAL.replace("label: Total Backlog", "label: [not, a, string]");
        let err = parse(&input).expect_err("should reject malformed props");
        match err {
            DashboardError::WidgetProps {
                widget_id, kind, ..
            } => {
                assert_eq!(widget_id, "backlog");
                assert_eq!(kind, "metric-card");
            }
            other => panic!("expected WidgetProps error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_widget_type_is_kept_not_rejected() {
        let input = MINIMAL.replace("type: metric-card", "type: sparkline");
        let config = parse(&input).expect("unknown widget types are non-fatal");
        assert!(matches!(
            &config.layout.widgets[0].kind,
            WidgetKind::Unknown { tag } if tag == "sparkline"
        ));
    }

    #[test]
    fn duplicate_widget_ids_are_rejected() {
        let input = format!(
            "{MINIMAL}    - id: backlog\n      type: custom\n      props:\n        component: Chart\n"
        );
        let err = parse(&input).expect_err("should reject duplicate ids");
        assert!(matches!(err, DashboardError::DuplicateWidgetId { .. }));
    }

    #[test]
    fn unknown_handler_is_rejected() {
        let input = format!(
            "{MINIMAL}actions:\n  - id: escalate\n    label: Escalate\n    command:\n      handler: page-on-call\n      message: paged\n"
        );
        let err = parse(&input).expect_err("should reject unknown handler");
        match err {
            DashboardError::UnknownHandler { action_id, handler } => {
                assert_eq!(action_id, "escalate");
                assert_eq!(handler, "page-on-call");
            }
            other => panic!("expected UnknownHandler error, got {other:?}"),
        }
    }
}
