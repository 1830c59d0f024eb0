//! HTTP API for reviewing drafts from other tools.
//!
//! Each session owns its own document behind its own lock. Sessions live in
//! memory only: idle ones are swept after `server.session_ttl_minutes`, and
//! all of them vanish when the server stops.

use super::build_pipeline;
use crate::cli::{content_preview, Output};
use crate::config::Settings;
use crate::error::BlogError;
use crate::pipeline::{Pipeline, Stage};
use crate::review::{ReviewController, ReviewDecision, ReviewState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

/// A review session hosted by the server.
struct Session {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    controller: ReviewController,
}

impl Session {
    fn new(controller: ReviewController) -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            controller,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

type SessionHandle = Arc<Mutex<Session>>;

/// How often idle sessions are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared application state.
struct AppState {
    pipeline: Pipeline,
    max_revisions: u32,
    /// `None` keeps sessions until they are deleted.
    session_ttl: Option<Duration>,
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl AppState {
    fn new(pipeline: Pipeline, max_revisions: u32, session_ttl: Option<Duration>) -> Self {
        Self {
            pipeline,
            max_revisions,
            session_ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let pipeline = build_pipeline(&settings)?;

    let session_ttl = match settings.server.session_ttl_minutes {
        0 => None,
        minutes => Some(Duration::from_secs(minutes.saturating_mul(60))),
    };
    let state = Arc::new(AppState::new(
        pipeline,
        settings.review.max_revisions,
        session_ttl,
    ));

    if session_ttl.is_some() {
        let sweeper = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                let evicted = evict_idle(&sweeper, Utc::now()).await;
                if evicted > 0 {
                    info!("Evicted {} idle session(s)", evicted);
                }
            }
        });
    }

    let addr = format!(
        "{}:{}",
        host.unwrap_or(settings.server.host),
        port.unwrap_or(settings.server.port)
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("ytblog API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Start session", "POST   /sessions");
    Output::kv("List sessions", "GET    /sessions");
    Output::kv("Get session", "GET    /sessions/{id}");
    Output::kv("Review draft", "POST   /sessions/{id}/review");
    Output::kv("Retry revision", "POST   /sessions/{id}/revise");
    Output::kv("End session", "DELETE /sessions/{id}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/review", post(review_session))
        .route("/sessions/{id}/revise", post(retry_revision))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct CreateSessionRequest {
    /// YouTube URL or video ID
    video_url: String,
}

#[derive(Serialize)]
struct SessionResponse {
    id: Uuid,
    state: ReviewState,
    revisions: u32,
    max_revisions: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    source_reference: String,
    draft: Option<String>,
    approved: Option<bool>,
    feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl SessionResponse {
    fn from_session(id: Uuid, session: &Session) -> Self {
        let document = session.controller.document();
        Self {
            id,
            state: session.controller.state(),
            revisions: session.controller.revisions(),
            max_revisions: session.controller.max_revisions(),
            created_at: session.created_at,
            updated_at: session.updated_at,
            source_reference: document.source_reference().to_string(),
            draft: document.draft().map(str::to_string),
            approved: document.approved(),
            feedback: document.feedback().map(str::to_string),
            error: None,
        }
    }

    fn with_error(mut self, error: &BlogError) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

#[derive(Serialize)]
struct SessionSummary {
    id: Uuid,
    state: ReviewState,
    revisions: u32,
    created_at: DateTime<Utc>,
    source_reference: String,
    draft_preview: String,
}

#[derive(Serialize)]
struct SessionListResponse {
    sessions: Vec<SessionSummary>,
    total: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<Stage>,
}

/// HTTP status for a library error.
fn status_for(error: &BlogError) -> StatusCode {
    match error {
        BlogError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
        BlogError::Generation { .. } => StatusCode::BAD_GATEWAY,
        BlogError::InvalidTransition { .. } => StatusCode::CONFLICT,
        BlogError::Validation { .. } | BlogError::InvalidReference(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &BlogError) -> Response {
    (
        status_for(error),
        Json(ErrorResponse {
            error: error.to_string(),
            stage: error.stage(),
        }),
    )
        .into_response()
}

fn not_found(id: Uuid) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Session not found: {}", id),
            stage: None,
        }),
    )
        .into_response()
}

async fn lookup(state: &AppState, id: Uuid) -> Option<SessionHandle> {
    state.sessions.read().await.get(&id).cloned()
}

/// Drop sessions idle for longer than the TTL. Sessions locked by a request
/// in flight are kept.
async fn evict_idle(state: &AppState, now: DateTime<Utc>) -> usize {
    let Some(ttl) = state.session_ttl else {
        return 0;
    };

    let mut sessions = state.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, handle| match handle.try_lock() {
        Ok(session) => (now - session.updated_at)
            .to_std()
            .map_or(true, |idle| idle <= ttl),
        Err(_) => true,
    });
    before - sessions.len()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Response {
    let document = match state.pipeline.prepare(&req.video_url).await {
        Ok(document) => document,
        Err(e) => {
            warn!("Session for {} failed: {}", req.video_url, e);
            return error_response(&e);
        }
    };

    let controller = match ReviewController::new(document, state.max_revisions) {
        Ok(controller) => controller,
        Err(e) => return error_response(&e),
    };

    let id = Uuid::new_v4();
    let session = Session::new(controller);
    let response = SessionResponse::from_session(id, &session);

    state
        .sessions
        .write()
        .await
        .insert(id, Arc::new(Mutex::new(session)));
    info!("Created session {} for {}", id, req.video_url);

    (StatusCode::CREATED, Json(response)).into_response()
}

async fn list_sessions(State(state): State<Arc<AppState>>) -> Response {
    let handles: Vec<(Uuid, SessionHandle)> = state
        .sessions
        .read()
        .await
        .iter()
        .map(|(id, handle)| (*id, handle.clone()))
        .collect();

    let mut sessions = Vec::with_capacity(handles.len());
    for (id, handle) in handles {
        let session = handle.lock().await;
        sessions.push(SessionSummary {
            id,
            state: session.controller.state(),
            revisions: session.controller.revisions(),
            created_at: session.created_at,
            source_reference: session.controller.document().source_reference().to_string(),
            draft_preview: content_preview(
                session.controller.document().draft().unwrap_or_default(),
                120,
            ),
        });
    }
    sessions.sort_by_key(|s| s.created_at);

    Json(SessionListResponse {
        total: sessions.len(),
        sessions,
    })
    .into_response()
}

async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    let Some(handle) = lookup(&state, id).await else {
        return not_found(id);
    };
    let session = handle.lock().await;
    Json(SessionResponse::from_session(id, &session)).into_response()
}

async fn review_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(decision): Json<ReviewDecision>,
) -> Response {
    let Some(handle) = lookup(&state, id).await else {
        return not_found(id);
    };
    let mut session = handle.lock().await;
    session.touch();

    if let Err(e) = session.controller.submit(decision) {
        return error_response(&e);
    }

    // A rejection is followed by exactly one revision attempt.
    revise_locked(&state.pipeline, id, &mut session).await
}

async fn retry_revision(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    let Some(handle) = lookup(&state, id).await else {
        return not_found(id);
    };
    let mut session = handle.lock().await;
    session.touch();

    if session.controller.state() != ReviewState::Revising {
        let error = BlogError::InvalidTransition {
            state: session.controller.state(),
            event: "revise".to_string(),
        };
        return error_response(&error);
    }

    revise_locked(&state.pipeline, id, &mut session).await
}

/// Revise if a revision is pending and render the session.
async fn revise_locked(pipeline: &Pipeline, id: Uuid, session: &mut Session) -> Response {
    if session.controller.state() == ReviewState::Revising {
        if let Err(e) = session.controller.revise(pipeline).await {
            let body = SessionResponse::from_session(id, session).with_error(&e);
            return (status_for(&e), Json(body)).into_response();
        }
    }
    Json(SessionResponse::from_session(id, session)).into_response()
}

async fn delete_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    match state.sessions.write().await.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(id),
    }
}
