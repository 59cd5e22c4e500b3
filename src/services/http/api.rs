//! HTTP+JSON surface of the relay.
//!
//! Handlers are thin: decode, call one `Relay` operation, encode. Domain
//! errors become status codes in one place, `ApiError::into_response`.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::kernel::error::RelayError;
use crate::kernel::relay::Relay;
use crate::kernel::telemetry::TelemetrySample;

pub type ApiState = Arc<Relay>;

#[derive(Debug, Serialize)]
pub struct PlayersResponse {
    pub players: Vec<TelemetrySample>,
}

pub fn create_api_routes() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health))
        .route("/telemetry", post(ingest))
        .route("/players", get(players))
        .route("/recording", get(recording_status))
        .route("/recording/start", post(start_recording))
        .route("/recording/stop", post(stop_recording))
        .route("/replays", get(list_replays))
        .route("/replays/:id", get(get_replay))
}

pub fn router(relay: Arc<Relay>) -> Router {
    create_api_routes().with_state(relay)
}

/// POST /telemetry. Takes raw bytes so shape errors surface as our own 400.
pub async fn ingest(State(relay): State<ApiState>, body: Bytes) -> Result<impl IntoResponse, ApiError> {
    let report = relay.ingest(&body)?;
    Ok(Json(json!({
        "status": "ok",
        "count": report.accepted,
        "skipped": report.skipped,
    })))
}

pub async fn players(State(relay): State<ApiState>) -> Json<PlayersResponse> {
    Json(PlayersResponse { players: relay.poll() })
}

pub async fn start_recording(State(relay): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let started_at = relay.start_recording()?;
    Ok(Json(json!({
        "status": "recording_started",
        "startedAt": started_at,
    })))
}

/// POST /recording/stop. Sealing may write the archive file, so it runs on
/// the blocking pool rather than a runtime worker.
pub async fn stop_recording(State(relay): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let summary = tokio::task::spawn_blocking(move || relay.stop_recording())
        .await
        .map_err(|e| ApiError::Internal(format!("stop task failed: {}", e)))??;
    Ok(Json(json!({
        "status": "recording_stopped",
        "id": summary.id,
        "frameCount": summary.frame_count,
    })))
}

pub async fn recording_status(State(relay): State<ApiState>) -> impl IntoResponse {
    Json(relay.recording_status())
}

pub async fn list_replays(State(relay): State<ApiState>) -> impl IntoResponse {
    Json(relay.list_replays())
}

pub async fn get_replay(
    State(relay): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = relay.get_replay(&id)?;
    let body = serde_json::to_vec(&*record).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

pub async fn health(State(relay): State<ApiState>) -> impl IntoResponse {
    Json(relay.health())
}

#[derive(Debug)]
pub enum ApiError {
    Relay(RelayError),
    Internal(String),
}

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        ApiError::Relay(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Relay(e) => {
                let (status, code) = match &e {
                    RelayError::MalformedPayload(_) => (StatusCode::BAD_REQUEST, "MALFORMED_PAYLOAD"),
                    RelayError::AlreadyRecording => (StatusCode::CONFLICT, "ALREADY_RECORDING"),
                    RelayError::NotRecording => (StatusCode::CONFLICT, "NOT_RECORDING"),
                    RelayError::NotFound(_) => (StatusCode::NOT_FOUND, "REPLAY_NOT_FOUND"),
                    RelayError::Archive(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
                };
                (status, code, e.to_string())
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        if status.is_server_error() {
            tracing::error!(code, %message, "Request failed");
        }

        let body = json!({
            "error": {
                "code": code,
                "message": message,
            }
        });
        (status, Json(body)).into_response()
    }
}
