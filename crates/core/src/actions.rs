//! Persona actions and the action resolver.
//!
//! An [`ActionConfig`] is data: an id, a label, an optional precondition and an
//! [`ActionCommand`] describing the effect. The command's `handler` key is resolved against a
//! [`CommandRegistry`] when the persona file is loaded, so a configuration can never name a
//! handler that does not exist at render time.
//!
//! Resolution order for a triggered action:
//! 1. persona action with that id whose precondition passes → run its handler;
//! 2. otherwise an inline outcome on the triggering widget → generic patch;
//! 3. otherwise nothing happens.
//!
//! A persona action whose precondition fails blocks the action outright; the inline outcome is
//! not used as a way around the precondition.

use crate::context::PersonaContext;
use crate::filter::RecordPredicate;
use crate::persona::PersonaConfig;
use crate::record::{Record, RecordPatch};
use crate::widgets::WidgetKind;
use crate::{DashboardError, DashboardResult};
use careboard_types::{NonEmptyText, Slug};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Visual emphasis of an action button.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionVariant {
    #[default]
    Primary,
    Secondary,
    Tertiary,
    Danger,
    Success,
}

/// Effect description carried by a persona action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionCommand {
    /// Key into the [`CommandRegistry`].
    pub handler: Slug,
    #[serde(default)]
    pub patch: RecordPatch,
    /// Notification template. `{name}` and `{procedure}` are replaced from the record.
    pub message: String,
}

impl ActionCommand {
    /// Substitutes placeholders in one pass; text inserted from the record is never rescanned.
    pub fn render_message(&self, record: &Record) -> String {
        let procedure = record.procedure.as_deref().unwrap_or("procedure");
        let mut rendered = String::with_capacity(self.message.len());
        let mut rest = self.message.as_str();

        while let Some(start) = rest.find('{') {
            rendered.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix("{name}") {
                rendered.push_str(&record.name);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{procedure}") {
                rendered.push_str(procedure);
                rest = after;
            } else {
                rendered.push('{');
                rest = &tail[1..];
            }
        }
        rendered.push_str(rest);
        rendered
    }
}

/// Signature of a command handler. Handlers report their effect through the context's
/// mutation callback and must not touch host state any other way.
pub type CommandFn = fn(&Record, &ActionCommand, &PersonaContext<'_>);

#[derive(Clone, Debug)]
pub struct ActionConfig {
    pub id: Slug,
    pub label: NonEmptyText,
    pub variant: ActionVariant,
    pub icon: Option<String>,
    pub condition: Option<RecordPredicate>,
    pub command: ActionCommand,
    /// Handler resolved from `command.handler` at load time.
    pub run: CommandFn,
}

impl ActionConfig {
    pub fn is_available_for(&self, record: &Record) -> bool {
        self.condition.as_ref().map_or(true, |c| c.matches(record))
    }
}

/// Handler lookup keyed by the `handler` field of an [`ActionCommand`].
#[derive(Clone, Debug)]
pub struct CommandRegistry {
    handlers: BTreeMap<String, CommandFn>,
}

impl CommandRegistry {
    pub const PATCH_AND_NOTIFY: &'static str = "patch-and-notify";
    pub const PATCH_WITH_AUDIT_NOTE: &'static str = "patch-with-audit-note";

    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Registry with the handlers shipped by this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Self::PATCH_AND_NOTIFY, patch_and_notify);
        registry.register(Self::PATCH_WITH_AUDIT_NOTE, patch_with_audit_note);
        registry
    }

    /// Adds or replaces a handler.
    pub fn register(&mut self, key: impl Into<String>, handler: CommandFn) {
        self.handlers.insert(key.into(), handler);
    }

    pub fn resolve(&self, key: &str) -> Option<CommandFn> {
        self.handlers.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn patch_and_notify(record: &Record, command: &ActionCommand, ctx: &PersonaContext<'_>) {
    let updated = command.patch.apply_to(record);
    ctx.update(updated, Some(command.render_message(record)));
}

fn patch_with_audit_note(record: &Record, command: &ActionCommand, ctx: &PersonaContext<'_>) {
    let message = command.render_message(record);
    let mut updated = command.patch.apply_to(record);
    if updated.clinical_note.trim().is_empty() {
        updated.clinical_note = format!("[Audit] {message}");
    } else {
        updated.clinical_note = format!("{}\n[Audit] {message}", updated.clinical_note);
    }
    ctx.update(updated, Some(message));
}

/// How a triggered action was handled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "resolution", rename_all = "snake_case")]
pub enum ActionResolution {
    /// A persona action handler ran.
    Handled { action_id: String, handler: String },
    /// No persona action matched; the widget's inline outcome was applied.
    Patched { action_id: String, patch: RecordPatch },
    /// A persona action matched but its precondition failed for the record.
    Blocked { action_id: String },
    /// Nothing to do: no handler and no outcome (or no mutation callback).
    NoOp { action_id: String },
}

/// Resolve `action_id` for `record` against the persona's actions, falling back to `outcome`.
pub fn resolve_action(
    config: &PersonaConfig,
    action_id: &str,
    outcome: Option<&RecordPatch>,
    record: &Record,
    ctx: &PersonaContext<'_>,
) -> ActionResolution {
    let action_id_owned = action_id.to_string();

    if let Some(action) = config.find_action(action_id) {
        if !action.is_available_for(record) {
            tracing::debug!(
                "action {} blocked by precondition for record {}",
                action_id,
                record.id
            );
            return ActionResolution::Blocked {
                action_id: action_id_owned,
            };
        }
        if !ctx.can_update() {
            tracing::debug!("action {} has no mutation callback to report to", action_id);
            return ActionResolution::NoOp {
                action_id: action_id_owned,
            };
        }

        tracing::debug!(
            "action {} handled by {} for record {}",
            action_id,
            action.command.handler,
            record.id
        );
        (action.run)(record, &action.command, ctx);
        return ActionResolution::Handled {
            action_id: action_id_owned,
            handler: action.command.handler.to_string(),
        };
    }

    match outcome {
        Some(patch) if !patch.is_empty() && ctx.can_update() => {
            tracing::debug!("action {} applied inline outcome to {}", action_id, record.id);
            ctx.update(
                patch.apply_to(record),
                Some(format!("Updated {}", record.name)),
            );
            ActionResolution::Patched {
                action_id: action_id_owned,
                patch: patch.clone(),
            }
        }
        _ => ActionResolution::NoOp {
            action_id: action_id_owned,
        },
    }
}

/// A user interaction routed back from a rendered widget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTrigger {
    pub widget_id: String,
    pub action_id: String,
    /// Row the action was triggered on. Required for table actions; action panels act on
    /// the current selection.
    #[serde(default)]
    pub record_id: Option<String>,
}

/// Route a trigger through the widget that produced it and resolve the action.
///
/// # Errors
///
/// Returns [`DashboardError`] if the widget is not in the persona's layout, the widget does
/// not offer the action, or a table row is not among the widget's visible records.
pub fn trigger_action(
    config: &PersonaConfig,
    ctx: &PersonaContext<'_>,
    trigger: &ActionTrigger,
) -> DashboardResult<ActionResolution> {
    let widget = config
        .layout
        .widgets
        .iter()
        .find(|w| w.id == trigger.widget_id.as_str())
        .ok_or_else(|| DashboardError::UnknownWidget(trigger.widget_id.clone()))?;

    let unknown_action = || DashboardError::UnknownAction {
        widget_id: trigger.widget_id.clone(),
        action_id: trigger.action_id.clone(),
    };

    match &widget.kind {
        WidgetKind::ActionPanel(props) => {
            let button = props
                .actions
                .iter()
                .find(|a| a.id == trigger.action_id.as_str())
                .ok_or_else(unknown_action)?;

            let Some(record) = ctx.selected.as_ref() else {
                return Ok(ActionResolution::NoOp {
                    action_id: trigger.action_id.clone(),
                });
            };

            Ok(resolve_action(
                config,
                &trigger.action_id,
                button.outcome.as_ref(),
                record,
                ctx,
            ))
        }
        WidgetKind::Table(props) => {
            if !props.offers_action(&trigger.action_id) {
                return Err(unknown_action());
            }

            let record_id = trigger
                .record_id
                .as_deref()
                .ok_or_else(|| DashboardError::InvalidInput("table actions need a record_id".into()))?;
            let record = props
                .visible_records(&ctx.records)
                .into_iter()
                .find(|r| r.id == record_id)
                .ok_or_else(|| DashboardError::UnknownRecord(record_id.to_string()))?;

            Ok(resolve_action(config, &trigger.action_id, None, &record, ctx))
        }
        _ => Err(unknown_action()),
    }
}

/// Route a row click on a list or table widget to the selection callback.
///
/// # Errors
///
/// Returns [`DashboardError`] if the widget is not in the layout, does not list rows, or
/// does not show `record_id`.
pub fn select_row(
    config: &PersonaConfig,
    ctx: &PersonaContext<'_>,
    widget_id: &str,
    record_id: &str,
) -> DashboardResult<bool> {
    let widget = config
        .layout
        .widgets
        .iter()
        .find(|w| w.id == widget_id)
        .ok_or_else(|| DashboardError::UnknownWidget(widget_id.to_string()))?;

    let rows = match &widget.kind {
        WidgetKind::Table(props) => props.visible_records(&ctx.records),
        WidgetKind::PatientList(props) => props.visible_records(&ctx.records),
        _ => {
            return Err(DashboardError::InvalidInput(format!(
                "widget '{widget_id}' has no selectable rows"
            )))
        }
    };
    if !rows.iter().any(|r| r.id == record_id) {
        return Err(DashboardError::UnknownRecord(record_id.to_string()));
    }

    Ok(ctx.select(record_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::{PersonaIdentity, PersonaRegistry};
    use crate::record::fixtures::record;
    use crate::record::{RecordStatus, Urgency};
    use std::cell::RefCell;

    type Captured = RefCell<Vec<(Record, Option<String>)>>;

    fn capture() -> Captured {
        RefCell::new(Vec::new())
    }

    #[test]
    fn find_slot_confirms_and_names_patient() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let config = registry.lookup(PersonaIdentity::WaitingListOffice);
        let mut patient = record("7", RecordStatus::AwaitingScheduling);
        patient.name = "Margaret Thompson".into();
        patient.procedure = Some("Excision (See & Treat)".into());
        let records = vec![patient];

        let captured = capture();
        let sink = |r: Record, m: Option<String>| captured.borrow_mut().push((r, m));
        let ctx = PersonaContext::build(config, &records, None).with_update_sink(&sink);

        let resolution = trigger_action(
            config,
            &ctx,
            &ActionTrigger {
                widget_id: "scheduling-table".into(),
                action_id: "find-slot".into(),
                record_id: Some("7".into()),
            },
        )
        .expect("trigger find-slot");

        assert!(matches!(resolution, ActionResolution::Handled { .. }));
        let captured = captured.borrow();
        assert_eq!(captured.len(), 1);
        let (updated, message) = &captured[0];
        assert_eq!(updated.status, RecordStatus::Confirmed);
        let message = message.as_deref().expect("message");
        assert!(message.contains("Margaret Thompson"));
        assert!(message.contains("Excision (See & Treat)"));
    }

    #[test]
    fn find_slot_is_blocked_for_confirmed_records() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let config = registry.lookup(PersonaIdentity::WaitingListOffice);
        let confirmed = record("9", RecordStatus::Confirmed);

        let captured = capture();
        let sink = |r: Record, m: Option<String>| captured.borrow_mut().push((r, m));
        let ctx = PersonaContext::build(config, &[], None).with_update_sink(&sink);

        let resolution = resolve_action(config, "find-slot", None, &confirmed, &ctx);
        assert_eq!(
            resolution,
            ActionResolution::Blocked {
                action_id: "find-slot".into()
            }
        );
        assert!(captured.borrow().is_empty());
    }

    #[test]
    fn handler_takes_precedence_over_inline_outcome() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let config = registry.lookup(PersonaIdentity::Admin);
        let patient = record("1", RecordStatus::IntakeReview);

        let captured = capture();
        let sink = |r: Record, m: Option<String>| captured.borrow_mut().push((r, m));
        let ctx = PersonaContext::build(config, std::slice::from_ref(&patient), Some(&patient))
            .with_update_sink(&sink);

        let outcome = RecordPatch {
            status: Some(RecordStatus::Rejected),
            urgency: Some(Urgency::Urgent),
            procedure: None,
        };
        let resolution = resolve_action(config, "request-info", Some(&outcome), &patient, &ctx);

        assert!(matches!(resolution, ActionResolution::Handled { .. }));
        let captured = captured.borrow();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].0.status, RecordStatus::FormPending);
        assert_eq!(captured[0].0.urgency, Urgency::NotSet);
        assert_eq!(
            captured[0].1.as_deref(),
            Some("Requested additional information for Patient 1.")
        );
    }

    #[test]
    fn inline_outcome_applies_when_no_persona_action_matches() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let config = registry.lookup(PersonaIdentity::Clinician);
        let patient = record("2", RecordStatus::TriagePending);

        let captured = capture();
        let sink = |r: Record, m: Option<String>| captured.borrow_mut().push((r, m));
        let ctx = PersonaContext::build(config, std::slice::from_ref(&patient), Some(&patient))
            .with_update_sink(&sink);

        let resolution = trigger_action(
            config,
            &ctx,
            &ActionTrigger {
                widget_id: "triage-actions".into(),
                action_id: "routine".into(),
                record_id: None,
            },
        )
        .expect("trigger routine");

        assert!(matches!(resolution, ActionResolution::Patched { .. }));
        let captured = captured.borrow();
        assert_eq!(captured[0].0.urgency, Urgency::Routine);
        assert_eq!(captured[0].0.procedure.as_deref(), Some("Routine Clinic"));
        assert_eq!(captured[0].1.as_deref(), Some("Updated Patient 2"));
    }

    #[test]
    fn no_handler_and_no_outcome_is_silent_no_op() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let config = registry.lookup(PersonaIdentity::Management);
        let patient = record("3", RecordStatus::Scheduled);

        let captured = capture();
        let sink = |r: Record, m: Option<String>| captured.borrow_mut().push((r, m));
        let ctx = PersonaContext::build(config, &[], None).with_update_sink(&sink);

        let resolution = resolve_action(config, "escalate", None, &patient, &ctx);
        assert_eq!(
            resolution,
            ActionResolution::NoOp {
                action_id: "escalate".into()
            }
        );
        assert!(captured.borrow().is_empty());
    }

    #[test]
    fn outcome_without_mutation_callback_is_no_op() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let config = registry.lookup(PersonaIdentity::Clinician);
        let patient = record("2", RecordStatus::TriagePending);
        let ctx = PersonaContext::build(config, &[], None);

        let outcome = RecordPatch {
            urgency: Some(Urgency::Routine),
            ..RecordPatch::default()
        };
        let resolution = resolve_action(config, "routine", Some(&outcome), &patient, &ctx);
        assert!(matches!(resolution, ActionResolution::NoOp { .. }));
    }

    #[test]
    fn action_panel_without_selection_is_no_op() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let config = registry.lookup(PersonaIdentity::Admin);
        let ctx = PersonaContext::build(config, &[], None);

        let resolution = trigger_action(
            config,
            &ctx,
            &ActionTrigger {
                widget_id: "validation-actions".into(),
                action_id: "reject".into(),
                record_id: None,
            },
        )
        .expect("trigger without selection");
        assert!(matches!(resolution, ActionResolution::NoOp { .. }));
    }

    #[test]
    fn reject_appends_audit_note() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let config = registry.lookup(PersonaIdentity::Admin);
        let patient = record("4", RecordStatus::IntakeReview);

        let captured = capture();
        let sink = |r: Record, m: Option<String>| captured.borrow_mut().push((r, m));
        let ctx = PersonaContext::build(config, std::slice::from_ref(&patient), Some(&patient))
            .with_update_sink(&sink);

        let resolution = resolve_action(config, "reject", None, &patient, &ctx);
        assert!(matches!(
            resolution,
            ActionResolution::Handled { ref handler, .. } if handler == CommandRegistry::PATCH_WITH_AUDIT_NOTE
        ));

        let captured = captured.borrow();
        let updated = &captured[0].0;
        assert_eq!(updated.status, RecordStatus::Rejected);
        assert!(updated
            .clinical_note
            .starts_with("Changing pigmented lesion on left forearm."));
        assert!(updated
            .clinical_note
            .ends_with("[Audit] Referral for Patient 4 has been rejected."));
    }

    #[test]
    fn trigger_rejects_unknown_widget_and_action() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let config = registry.lookup(PersonaIdentity::Admin);
        let ctx = PersonaContext::build(config, &[], None);

        let err = trigger_action(
            config,
            &ctx,
            &ActionTrigger {
                widget_id: "nope".into(),
                action_id: "reject".into(),
                record_id: None,
            },
        )
        .expect_err("unknown widget");
        assert!(matches!(err, DashboardError::UnknownWidget(_)));

        let err = trigger_action(
            config,
            &ctx,
            &ActionTrigger {
                widget_id: "validation-checklist".into(),
                action_id: "reject".into(),
                record_id: None,
            },
        )
        .expect_err("checklist offers no actions");
        assert!(matches!(err, DashboardError::UnknownAction { .. }));
    }

    #[test]
    fn table_trigger_requires_visible_row() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let config = registry.lookup(PersonaIdentity::WaitingListOffice);
        let records = vec![record("5", RecordStatus::Confirmed)];
        let ctx = PersonaContext::build(config, &records, None);

        // Confirmed rows are filtered out of the scheduling table.
        let err = trigger_action(
            config,
            &ctx,
            &ActionTrigger {
                widget_id: "scheduling-table".into(),
                action_id: "find-slot".into(),
                record_id: Some("5".into()),
            },
        )
        .expect_err("row not visible");
        assert!(matches!(err, DashboardError::UnknownRecord(_)));
    }

    #[test]
    fn custom_handlers_can_be_registered() {
        fn escalate(record: &Record, command: &ActionCommand, ctx: &PersonaContext<'_>) {
            ctx.update(record.clone(), Some(command.render_message(record)));
        }

        let mut registry = CommandRegistry::builtin();
        registry.register("escalate", escalate);
        assert!(registry.resolve("escalate").is_some());
        assert_eq!(
            registry.keys().collect::<Vec<_>>(),
            vec!["escalate", "patch-and-notify", "patch-with-audit-note"]
        );
    }

    #[test]
    fn row_selection_goes_through_the_selection_callback() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let config = registry.lookup(PersonaIdentity::WaitingListOffice);
        let records = vec![
            record("1", RecordStatus::AwaitingScheduling),
            record("2", RecordStatus::Confirmed),
        ];

        let chosen = RefCell::new(Vec::<String>::new());
        let on_select = |id: &str| chosen.borrow_mut().push(id.to_string());
        let ctx = PersonaContext::build(config, &records, None).with_selection_sink(&on_select);

        assert!(select_row(config, &ctx, "confirmed-bookings", "2").expect("list row"));
        assert!(select_row(config, &ctx, "scheduling-table", "1").expect("table row"));
        assert_eq!(*chosen.borrow(), vec!["2".to_string(), "1".to_string()]);

        // The table hides confirmed records.
        let err = select_row(config, &ctx, "scheduling-table", "2").expect_err("hidden row");
        assert!(matches!(err, DashboardError::UnknownRecord(_)));

        let err = select_row(config, &ctx, "theatre-load", "1").expect_err("no rows");
        assert!(matches!(err, DashboardError::InvalidInput(_)));
    }

    #[test]
    fn handler_without_mutation_callback_is_no_op() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let config = registry.lookup(PersonaIdentity::Admin);
        let patient = record("1", RecordStatus::IntakeReview);
        let ctx = PersonaContext::build(config, std::slice::from_ref(&patient), Some(&patient));

        let resolution = resolve_action(config, "request-info", None, &patient, &ctx);
        assert_eq!(
            resolution,
            ActionResolution::NoOp {
                action_id: "request-info".into()
            }
        );
    }

    #[test]
    fn message_placeholders_are_substituted_once() {
        let command = ActionCommand {
            handler: Slug::new("patch-and-notify").expect("slug"),
            patch: RecordPatch::default(),
            message: "Booked {name} for {procedure} {unknown}.".into(),
        };
        let mut patient = record("1", RecordStatus::AwaitingScheduling);
        patient.name = "Ann {procedure} Lee".into();
        patient.procedure = Some("Biopsy {name}".into());

        assert_eq!(
            command.render_message(&patient),
            "Booked Ann {procedure} Lee for Biopsy {name} {unknown}."
        );

        patient.procedure = None;
        assert_eq!(
            command.render_message(&patient),
            "Booked Ann {procedure} Lee for procedure {unknown}."
        );
    }
}
