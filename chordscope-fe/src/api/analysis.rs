//! Analysis API handlers
//!
//! POST /analysis/file, POST /analysis/url, GET /analysis/status,
//! POST /analysis/cancel, plus the results-view actions.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chordscope_common::events::{FailureKind, InputSource, ViewKind};
use chordscope_common::time::elapsed_seconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{AnalysisRequest, AnalysisSession, AnalysisState, AudioUpload, Instrument};
use crate::services::presenter::{self, ExportKind, ResultsView};
use crate::services::ValidationError;
use crate::AppState;

/// Largest accepted upload (audio files routinely exceed axum's 2 MB default)
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Name used when the browser sends a file part without a file name
const UNNAMED_UPLOAD: &str = "upload";

/// POST /analysis/url request
#[derive(Debug, Deserialize)]
pub struct UrlAnalysisRequest {
    pub url: String,
}

/// Response to either submit endpoint
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub session_id: Uuid,
    pub state: AnalysisState,
    pub view: ViewKind,
    pub started_at: DateTime<Utc>,
}

impl From<AnalysisSession> for SubmitResponse {
    fn from(session: AnalysisSession) -> Self {
        Self {
            session_id: session.session_id,
            state: session.state,
            view: session.view,
            started_at: session.started_at,
        }
    }
}

/// Failure details in a status response
#[derive(Debug, Serialize)]
pub struct FailureInfo {
    pub kind: FailureKind,
    pub message: String,
}

/// GET /analysis/status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub session_id: Uuid,
    pub source: InputSource,
    pub state: AnalysisState,
    pub progress: f64,
    pub view: ViewKind,
    pub title: Option<String>,
    pub note_count: Option<usize>,
    pub error: Option<FailureInfo>,
    pub instrument: Instrument,
    pub is_playing: bool,
    pub started_at: DateTime<Utc>,
    pub elapsed_seconds: u64,
}

impl From<&AnalysisSession> for StatusResponse {
    fn from(session: &AnalysisSession) -> Self {
        Self {
            session_id: session.session_id,
            source: session.source,
            state: session.state,
            progress: session.progress().value(),
            view: session.view,
            title: session.title().map(str::to_string),
            note_count: session.result().map(|r| r.len()),
            error: session.failure().map(|(kind, message)| FailureInfo {
                kind,
                message: message.to_string(),
            }),
            instrument: session.instrument,
            is_playing: session.is_playing,
            started_at: session.started_at,
            elapsed_seconds: elapsed_seconds(
                session.started_at,
                session.ended_at.unwrap_or_else(Utc::now),
            ),
        }
    }
}

/// POST /analysis/:session_id/playback response
#[derive(Debug, Serialize)]
pub struct PlaybackResponse {
    pub session_id: Uuid,
    pub is_playing: bool,
}

/// POST /analysis/:session_id/instrument request
#[derive(Debug, Deserialize)]
pub struct InstrumentRequest {
    pub instrument: Instrument,
}

/// GET /analysis/:session_id/export query
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub kind: ExportKind,
}

/// POST /analysis/file
///
/// Multipart upload with the audio under field `file`. Submits immediately.
pub async fn submit_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<SubmitResponse>> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| UNNAMED_UPLOAD.to_string());
        let media_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Could not read upload: {}", e)))?;

        upload = Some(AudioUpload {
            file_name,
            media_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload = upload.ok_or(ValidationError::MissingInput)?;
    tracing::info!(
        file_name = %upload.file_name,
        media_type = %upload.media_type,
        bytes = upload.bytes.len(),
        "File submitted for analysis"
    );

    let session = state
        .input_collector
        .submit(AnalysisRequest::File(upload))
        .await?;

    Ok(Json(session.into()))
}

/// POST /analysis/url
pub async fn submit_url(
    State(state): State<AppState>,
    Json(request): Json<UrlAnalysisRequest>,
) -> ApiResult<Json<SubmitResponse>> {
    tracing::info!(url = %request.url.trim(), "URL submitted for analysis");

    let session = state
        .input_collector
        .submit(AnalysisRequest::Url(request.url))
        .await?;

    Ok(Json(session.into()))
}

/// GET /analysis/status/:session_id
pub async fn get_status(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<StatusResponse>> {
    let session = load_session(&state, session_id).await?;
    tracing::debug!(session_id = %session_id, state = ?session.state, "Status query");
    Ok(Json(StatusResponse::from(&session)))
}

/// GET /analysis/active
///
/// The session currently in flight, so a reloaded input page can rejoin it.
pub async fn get_active(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    let session = state
        .orchestrator
        .active_session()
        .await
        .ok_or_else(|| ApiError::NotFound("No analysis in progress".to_string()))?;
    Ok(Json(StatusResponse::from(&session)))
}

/// POST /analysis/cancel/:session_id
///
/// "Go back": tears down a pending analysis, or just returns to the input
/// view once it has finished.
pub async fn cancel_analysis(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<StatusResponse>> {
    let session = state.orchestrator.cancel(session_id).await?;
    tracing::info!(session_id = %session_id, state = ?session.state, "Returned to input view");
    Ok(Json(StatusResponse::from(&session)))
}

/// GET /analysis/:session_id/results
pub async fn get_results(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ResultsView>> {
    let session = load_session(&state, session_id).await?;
    let view = presenter::render_results(&session).ok_or_else(|| {
        ApiError::NotFound(format!("Results not available for session {}", session_id))
    })?;
    Ok(Json(view))
}

/// POST /analysis/:session_id/playback
pub async fn toggle_playback(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<PlaybackResponse>> {
    let is_playing = state.orchestrator.toggle_playback(session_id).await?;
    Ok(Json(PlaybackResponse {
        session_id,
        is_playing,
    }))
}

/// POST /analysis/:session_id/instrument
pub async fn set_instrument(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<InstrumentRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let session = state
        .orchestrator
        .set_instrument(session_id, request.instrument)
        .await?;
    Ok(Json(StatusResponse::from(&session)))
}

/// GET /analysis/:session_id/export?kind=chords|notes
///
/// Plain-text download of the sequence joined with " - ".
pub async fn export_results(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let session = load_session(&state, session_id).await?;
    let (result, title) = session
        .result()
        .zip(session.title())
        .ok_or_else(|| {
            ApiError::NotFound(format!("Results not available for session {}", session_id))
        })?;

    let export = presenter::export(result, title, query.kind);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export.file_name.replace('"', "'")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.content,
    )
        .into_response())
}

async fn load_session(state: &AppState, session_id: Uuid) -> ApiResult<AnalysisSession> {
    state
        .orchestrator
        .session(session_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Analysis session not found: {}", session_id)))
}

/// Build analysis routes
pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/analysis/file",
            post(submit_file).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/analysis/url", post(submit_url))
        .route("/analysis/active", get(get_active))
        .route("/analysis/status/:session_id", get(get_status))
        .route("/analysis/cancel/:session_id", post(cancel_analysis))
        .route("/analysis/:session_id/results", get(get_results))
        .route("/analysis/:session_id/playback", post(toggle_playback))
        .route("/analysis/:session_id/instrument", post(set_instrument))
        .route("/analysis/:session_id/export", get(export_results))
}
