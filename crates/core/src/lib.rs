//! # Careboard Core
//!
//! Configuration-driven dashboard engine for the referral pathway.
//!
//! Given a persona and a collection of case records, the engine selects that persona's
//! declarative configuration, filters the records, resolves the widget layout, renders each
//! widget against a shared context and routes user actions back to the host through a
//! mutation callback.
//!
//! - [`persona`]: persona identities, YAML persona files and the [`PersonaRegistry`]
//! - [`filter`]: record predicates
//! - [`context`]: the per-render [`PersonaContext`] and the host callbacks
//! - [`layout`] and [`widgets`]: layout resolution and the widget dispatcher
//! - [`actions`]: the command registry and the action resolver
//! - [`analysis`]: the analysis collaborator seam and per-widget request state
//! - [`session`]: host-side state used by the CLI and REST server
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest` and `cli`.

pub mod actions;
pub mod analysis;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod filter;
pub mod layout;
pub mod persona;
pub mod record;
pub mod session;
pub mod source;
pub mod widgets;

pub use actions::{
    resolve_action, select_row, trigger_action, ActionCommand, ActionConfig, ActionResolution,
    ActionTrigger, ActionVariant, CommandFn, CommandRegistry,
};
pub use analysis::{
    AnalysisBoard, AnalysisError, AnalysisPhase, AnalysisResult, AnalysisTicket, KeywordAnalyzer,
    ReferralAnalyzer,
};
pub use config::EngineConfig;
pub use context::{PersonaContext, RecordSink, SelectionSink};
pub use error::{DashboardError, DashboardResult};
pub use filter::{apply_filter, RecordPredicate};
pub use layout::{render_dashboard, render_sidebar, DashboardView, GridCell, SidebarView};
pub use persona::{PersonaConfig, PersonaIdentity, PersonaMeta, PersonaRegistry};
pub use record::{Record, RecordField, RecordPatch, RecordStatus, Urgency};
pub use session::{Notification, Session};
pub use widgets::{dispatch, WidgetConfig, WidgetKind, WidgetView};
