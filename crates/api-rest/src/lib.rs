//! # API REST
//!
//! REST API for the Careboard dashboard engine.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, analysis timeouts)
//!
//! The engine itself lives in `careboard-core`; this crate only owns the session for the
//! lifetime of the server and maps requests onto it.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use careboard_core::{
    source::load_records, ActionResolution, ActionTrigger, AnalysisError, AnalysisResult,
    CommandRegistry, DashboardError, DashboardView, EngineConfig, KeywordAnalyzer,
    PersonaIdentity, PersonaRegistry, Record, ReferralAnalyzer, Session, SidebarView,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across REST API handlers
///
/// The persona registry is immutable after startup. The session (records, selection,
/// analysis state, notifications) sits behind an async mutex that is never held across the
/// analysis call.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<PersonaRegistry>,
    session: Arc<Mutex<Session>>,
    analyzer: Arc<dyn ReferralAnalyzer>,
    analysis_timeout: Duration,
}

impl AppState {
    pub fn new(
        registry: PersonaRegistry,
        session: Session,
        analyzer: Arc<dyn ReferralAnalyzer>,
        analysis_timeout: Duration,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            session: Arc::new(Mutex::new(session)),
            analyzer,
            analysis_timeout,
        }
    }

    /// Build the state described by `config`, using the offline keyword analyzer.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError`] if the persona registry or the records file cannot be loaded.
    pub fn from_config(config: &EngineConfig) -> Result<Self, DashboardError> {
        let registry = config.load_registry(&CommandRegistry::builtin())?;
        let records = load_records(config.records_path())?;
        Ok(Self::new(
            registry,
            Session::new(records),
            Arc::new(KeywordAnalyzer),
            config.analysis_timeout(),
        ))
    }
}

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PersonaSummary {
    pub persona: String,
    pub display_name: String,
    pub subtitle: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListPersonasRes {
    pub personas: Vec<PersonaSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListRecordsRes {
    #[schema(value_type = Vec<Object>)]
    pub records: Vec<Record>,
    pub selected_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardRes {
    pub persona: String,
    #[schema(value_type = Object)]
    pub view: DashboardView,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SidebarRes {
    pub persona: String,
    #[schema(value_type = Object)]
    pub sidebar: SidebarView,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SelectReq {
    pub record_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SelectRes {
    pub selected_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActionReq {
    pub widget_id: String,
    pub action_id: String,
    /// Row the action applies to; required for table actions.
    #[serde(default)]
    pub record_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActionRes {
    #[schema(value_type = Object)]
    pub resolution: ActionResolution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Ready,
    Failed,
    /// The selection changed while the analysis was running; the outcome was dropped.
    Discarded,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalysisRes {
    pub record_id: String,
    pub status: AnalysisStatus,
    #[schema(value_type = Option<Object>)]
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationRes {
    pub record_id: String,
    pub message: String,
    pub at: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListNotificationsRes {
    pub notifications: Vec<NotificationRes>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_personas,
        list_records,
        dashboard,
        sidebar,
        select_record,
        select_row,
        trigger_action,
        run_analysis,
        list_notifications,
    ),
    components(schemas(
        HealthRes,
        PersonaSummary,
        ListPersonasRes,
        ListRecordsRes,
        DashboardRes,
        SidebarRes,
        SelectReq,
        SelectRes,
        ActionReq,
        ActionRes,
        AnalysisStatus,
        AnalysisRes,
        NotificationRes,
        ListNotificationsRes,
    ))
)]
pub struct ApiDoc;

/// Build the REST router, including the Swagger UI.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/personas", get(list_personas))
        .route("/records", get(list_records))
        .route("/personas/:persona/dashboard", get(dashboard))
        .route("/personas/:persona/sidebar", get(sidebar))
        .route("/selection", post(select_record))
        .route(
            "/personas/:persona/widgets/:widget_id/selection",
            post(select_row),
        )
        .route("/personas/:persona/actions", post(trigger_action))
        .route(
            "/personas/:persona/widgets/:widget_id/analysis",
            post(run_analysis),
        )
        .route("/notifications", get(list_notifications))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `config.rest_addr()` and serve until the server fails.
///
/// # Errors
///
/// Returns an error if startup state cannot be loaded, the address cannot be bound, or the
/// HTTP server fails while running.
pub async fn serve(config: &EngineConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let addr = config.rest_addr();

    tracing::info!("++ Starting Careboard REST on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

type ApiError = (StatusCode, &'static str);

fn parse_persona(persona: &str) -> Result<PersonaIdentity, ApiError> {
    persona
        .parse::<PersonaIdentity>()
        .map_err(|_| (StatusCode::NOT_FOUND, "Unknown persona"))
}

fn map_dashboard_error(err: DashboardError) -> ApiError {
    match err {
        DashboardError::UnknownWidget(_) => (StatusCode::NOT_FOUND, "Unknown widget"),
        DashboardError::UnknownRecord(_) => (StatusCode::NOT_FOUND, "Unknown record"),
        DashboardError::UnknownAction { .. } => {
            (StatusCode::BAD_REQUEST, "Widget does not offer this action")
        }
        DashboardError::InvalidInput(message) => {
            tracing::warn!("rejected request: {}", message);
            (StatusCode::BAD_REQUEST, "Invalid request")
        }
        other => {
            tracing::error!("request failed: {:?}", other);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Careboard REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/personas",
    responses(
        (status = 200, description = "Configured personas", body = ListPersonasRes)
    )
)]
/// List every persona with its display metadata
async fn list_personas(State(state): State<AppState>) -> Json<ListPersonasRes> {
    let personas = state
        .registry
        .iter()
        .map(|config| PersonaSummary {
            persona: config.persona.to_string(),
            display_name: config.meta.display_name.to_string(),
            subtitle: config.meta.subtitle.clone(),
            description: config.meta.description.clone(),
            icon: config.meta.icon.clone(),
        })
        .collect();
    Json(ListPersonasRes { personas })
}

#[utoipa::path(
    get,
    path = "/records",
    responses(
        (status = 200, description = "All records and the current selection", body = ListRecordsRes)
    )
)]
/// List all records held by the session
async fn list_records(State(state): State<AppState>) -> Json<ListRecordsRes> {
    let session = state.session.lock().await;
    Json(ListRecordsRes {
        records: session.records().to_vec(),
        selected_id: session.selected().map(|r| r.id.clone()),
    })
}

#[utoipa::path(
    get,
    path = "/personas/{persona}/dashboard",
    params(("persona" = String, Path, description = "admin, clinician, waiting-list or management")),
    responses(
        (status = 200, description = "Rendered dashboard", body = DashboardRes),
        (status = 404, description = "Unknown persona")
    )
)]
/// Render the main dashboard for a persona
async fn dashboard(
    State(state): State<AppState>,
    AxumPath(persona): AxumPath<String>,
) -> Result<Json<DashboardRes>, ApiError> {
    let persona = parse_persona(&persona)?;
    let config = state.registry.lookup(persona);
    let session = state.session.lock().await;
    Ok(Json(DashboardRes {
        persona: persona.to_string(),
        view: session.render(config),
    }))
}

#[utoipa::path(
    get,
    path = "/personas/{persona}/sidebar",
    params(("persona" = String, Path, description = "admin, clinician, waiting-list or management")),
    responses(
        (status = 200, description = "Sidebar record list", body = SidebarRes),
        (status = 404, description = "Unknown persona")
    )
)]
/// Render the sidebar record list for a persona
async fn sidebar(
    State(state): State<AppState>,
    AxumPath(persona): AxumPath<String>,
) -> Result<Json<SidebarRes>, ApiError> {
    let persona = parse_persona(&persona)?;
    let config = state.registry.lookup(persona);
    let session = state.session.lock().await;
    Ok(Json(SidebarRes {
        persona: persona.to_string(),
        sidebar: session.sidebar(config),
    }))
}

#[utoipa::path(
    post,
    path = "/selection",
    request_body = SelectReq,
    responses(
        (status = 200, description = "Selection changed", body = SelectRes),
        (status = 404, description = "Unknown record")
    )
)]
/// Change the selected record
///
/// Any analysis state for the previous record is cleared.
async fn select_record(
    State(state): State<AppState>,
    Json(req): Json<SelectReq>,
) -> Result<Json<SelectRes>, ApiError> {
    let mut session = state.session.lock().await;
    session.select(&req.record_id).map_err(map_dashboard_error)?;
    Ok(Json(SelectRes {
        selected_id: req.record_id,
    }))
}

#[utoipa::path(
    post,
    path = "/personas/{persona}/widgets/{widget_id}/selection",
    request_body = SelectReq,
    params(
        ("persona" = String, Path, description = "admin, clinician, waiting-list or management"),
        ("widget_id" = String, Path, description = "Id of a table or patient list widget")
    ),
    responses(
        (status = 200, description = "Selection changed", body = SelectRes),
        (status = 400, description = "Widget has no selectable rows"),
        (status = 404, description = "Unknown persona, widget or row")
    )
)]
/// Select a record by clicking a row of a list or table widget
///
/// The row must be visible in that widget for the persona.
async fn select_row(
    State(state): State<AppState>,
    AxumPath((persona, widget_id)): AxumPath<(String, String)>,
    Json(req): Json<SelectReq>,
) -> Result<Json<SelectRes>, ApiError> {
    let persona = parse_persona(&persona)?;
    let config = state.registry.lookup(persona);
    let mut session = state.session.lock().await;
    session
        .select_row(config, &widget_id, &req.record_id)
        .map_err(map_dashboard_error)?;
    Ok(Json(SelectRes {
        selected_id: req.record_id,
    }))
}

#[utoipa::path(
    post,
    path = "/personas/{persona}/actions",
    request_body = ActionReq,
    params(("persona" = String, Path, description = "admin, clinician, waiting-list or management")),
    responses(
        (status = 200, description = "How the action was resolved", body = ActionRes),
        (status = 400, description = "Widget does not offer the action"),
        (status = 404, description = "Unknown persona, widget or record")
    )
)]
/// Trigger an action from a rendered widget
///
/// # Errors
/// Returns `404 Not Found` if the persona, widget or (for table actions) row is unknown, and
/// `400 Bad Request` if the widget does not offer the action.
async fn trigger_action(
    State(state): State<AppState>,
    AxumPath(persona): AxumPath<String>,
    Json(req): Json<ActionReq>,
) -> Result<Json<ActionRes>, ApiError> {
    let persona = parse_persona(&persona)?;
    let config = state.registry.lookup(persona);
    let trigger = ActionTrigger {
        widget_id: req.widget_id,
        action_id: req.action_id,
        record_id: req.record_id,
    };

    let mut session = state.session.lock().await;
    let resolution = session
        .trigger(config, &trigger, chrono::Utc::now())
        .map_err(map_dashboard_error)?;
    Ok(Json(ActionRes { resolution }))
}

#[utoipa::path(
    post,
    path = "/personas/{persona}/widgets/{widget_id}/analysis",
    params(
        ("persona" = String, Path, description = "admin, clinician, waiting-list or management"),
        ("widget_id" = String, Path, description = "Id of an AI analysis widget")
    ),
    responses(
        (status = 200, description = "Analysis outcome", body = AnalysisRes),
        (status = 400, description = "Widget does not offer AI analysis"),
        (status = 404, description = "Unknown persona or widget"),
        (status = 409, description = "Analysis already running")
    )
)]
/// Run the analysis collaborator for the selected record
///
/// The session lock is released while the collaborator runs. The configured timeout applies;
/// failures and timeouts become the widget's recoverable error state. The run completes even
/// if the client disconnects.
async fn run_analysis(
    State(state): State<AppState>,
    AxumPath((persona, widget_id)): AxumPath<(String, String)>,
) -> Result<Json<AnalysisRes>, ApiError> {
    let persona = parse_persona(&persona)?;
    let config = state.registry.lookup(persona);

    let started = {
        let mut session = state.session.lock().await;
        session
            .begin_analysis(config, &widget_id)
            .map_err(map_dashboard_error)?
    };
    let Some((ticket, record)) = started else {
        return Err((StatusCode::CONFLICT, "Analysis already running"));
    };

    // The run and its completion live in their own task so the busy flag is cleared even if
    // this handler is dropped.
    let session = Arc::clone(&state.session);
    let analyzer = Arc::clone(&state.analyzer);
    let timeout = state.analysis_timeout;
    let task = tokio::spawn(async move {
        let outcome = match tokio::time::timeout(timeout, analyzer.analyze(&record)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AnalysisError::TimedOut(timeout)),
        };
        let accepted = session
            .lock()
            .await
            .complete_analysis(&ticket, outcome.clone());
        (record, accepted, outcome)
    });

    let (record, accepted, outcome) = task.await.map_err(|e| {
        tracing::error!("Analysis task error: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    })?;

    let (status, result, error) = match (accepted, outcome) {
        (false, _) => (AnalysisStatus::Discarded, None, None),
        (true, Ok(result)) => (AnalysisStatus::Ready, Some(result), None),
        (true, Err(err)) => (AnalysisStatus::Failed, None, Some(err.to_string())),
    };
    Ok(Json(AnalysisRes {
        record_id: record.id,
        status,
        result,
        error,
    }))
}

#[utoipa::path(
    get,
    path = "/notifications",
    responses(
        (status = 200, description = "Recent notifications, newest first", body = ListNotificationsRes)
    )
)]
/// List recent notifications produced by actions
async fn list_notifications(State(state): State<AppState>) -> Json<ListNotificationsRes> {
    let session = state.session.lock().await;
    let notifications = session
        .notifications()
        .map(|n| NotificationRes {
            record_id: n.record_id.clone(),
            message: n.message.clone(),
            at: n.at.to_rfc3339(),
        })
        .collect();
    Json(ListNotificationsRes { notifications })
}
