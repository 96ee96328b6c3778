//! Referral interpretation panel backed by the analysis collaborator.
//!
//! The widget itself is synchronous: it reads the per-widget state from the
//! [`AnalysisBoard`] and offers a "run" affordance. The host starts the call through the
//! board and reports the outcome back to it.

use super::WidgetConfig;
use crate::analysis::{AnalysisBoard, AnalysisPhase, AnalysisResult};
use crate::constants::NO_HISTORY_MESSAGE;
use crate::context::PersonaContext;
use serde::{Deserialize, Serialize};

const DEFAULT_TITLE: &str = "Referral Interpretation";
const RUN_LABEL: &str = "AI Decision Support";
const BUSY_LABEL: &str = "Reading Notes...";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisProps {
    pub show_gp_note: bool,
    pub show_comorbidities: bool,
    pub ai_enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunAffordance {
    pub label: String,
    pub busy: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisView {
    pub title: String,
    pub record_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gp_note: Option<String>,
    /// Present when comorbidities are shown; empty history yields a single placeholder entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comorbidities: Option<Vec<String>>,
    /// Offered while AI is enabled and no result is held.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunAffordance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn render(
    widget: &WidgetConfig,
    props: &AnalysisProps,
    ctx: &PersonaContext<'_>,
    board: &AnalysisBoard,
) -> Option<AnalysisView> {
    let record = ctx.selected.as_ref()?;
    let phase = board.phase_for(widget.id.as_str(), &record.id);

    let (result, error) = match phase {
        AnalysisPhase::Ready(result) => (Some(result.clone()), None),
        AnalysisPhase::Failed(message) => (None, Some(message.clone())),
        AnalysisPhase::Idle | AnalysisPhase::Busy => (None, None),
    };
    let busy = matches!(phase, AnalysisPhase::Busy);

    let run = (props.ai_enabled && result.is_none()).then(|| RunAffordance {
        label: if busy { BUSY_LABEL } else { RUN_LABEL }.to_string(),
        busy,
    });

    let comorbidities = props.show_comorbidities.then(|| {
        if record.comorbidities.is_empty() {
            vec![NO_HISTORY_MESSAGE.to_string()]
        } else {
            record.comorbidities.clone()
        }
    });

    Some(AnalysisView {
        title: widget.title.as_deref().unwrap_or(DEFAULT_TITLE).to_string(),
        record_id: record.id.clone(),
        gp_note: props.show_gp_note.then(|| record.clinical_note.clone()),
        comorbidities,
        run,
        result,
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisError;
    use crate::persona::{PersonaIdentity, PersonaRegistry};
    use crate::record::fixtures::record;
    use crate::record::{Record, RecordStatus};
    use crate::widgets::test_support::widget;
    use crate::widgets::WidgetKind;

    const PROPS: &str = "show_gp_note: true\nshow_comorbidities: true\nai_enabled: true";

    fn view_for(record: &Record, board: &AnalysisBoard) -> AnalysisView {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let w = widget("interpretation", WidgetKind::AI_ANALYSIS, PROPS);
        let WidgetKind::AiAnalysis(props) = &w.kind else {
            panic!("expected analysis widget");
        };
        let ctx = PersonaContext::build(
            registry.lookup(PersonaIdentity::Clinician),
            &[],
            Some(record),
        );
        render(&w, props, &ctx, board).expect("selection present")
    }

    #[test]
    fn idle_view_offers_run_and_history_placeholder() {
        let patient = record("1", RecordStatus::TriagePending);
        let view = view_for(&patient, &AnalysisBoard::default());

        assert_eq!(
            view.run,
            Some(RunAffordance {
                label: "AI Decision Support".into(),
                busy: false
            })
        );
        assert_eq!(
            view.comorbidities,
            Some(vec!["No documented history".to_string()])
        );
        assert!(view.gp_note.is_some());
    }

    #[test]
    fn busy_then_ready_hides_run() {
        let patient = record("1", RecordStatus::TriagePending);
        let mut board = AnalysisBoard::default();
        board.select(Some("1"));
        let ticket = board.begin("interpretation", "1").expect("ticket");

        let view = view_for(&patient, &board);
        assert_eq!(
            view.run.as_ref().map(|r| (r.label.as_str(), r.busy)),
            Some(("Reading Notes...", true))
        );

        let result = AnalysisResult {
            summary: "Suspicious lesion".into(),
            urgency_recommendation: "2WW".into(),
            suggested_pathway: "Excision".into(),
        };
        assert!(board.complete(&ticket, Ok(result.clone())));
        let view = view_for(&patient, &board);
        assert!(view.run.is_none());
        assert_eq!(view.result, Some(result));
    }

    #[test]
    fn failure_is_recoverable() {
        let patient = record("1", RecordStatus::TriagePending);
        let mut board = AnalysisBoard::default();
        board.select(Some("1"));
        let ticket = board.begin("interpretation", "1").expect("ticket");
        board.complete(&ticket, Err(AnalysisError::Failed("upstream unavailable".into())));

        let view = view_for(&patient, &board);
        assert!(view.error.is_some());
        assert_eq!(view.run.as_ref().map(|r| r.busy), Some(false));
        assert!(board.begin("interpretation", "1").is_some(), "retry allowed");
    }

    #[test]
    fn state_for_another_record_is_not_shown() {
        let mut board = AnalysisBoard::default();
        board.select(Some("1"));
        let ticket = board.begin("interpretation", "1").expect("ticket");
        board.complete(
            &ticket,
            Ok(AnalysisResult {
                summary: "s".into(),
                urgency_recommendation: "Routine".into(),
                suggested_pathway: "Clinic".into(),
            }),
        );

        let other = record("2", RecordStatus::TriagePending);
        let view = view_for(&other, &board);
        assert!(view.result.is_none());
        assert!(view.run.is_some());
    }
}
