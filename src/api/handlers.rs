use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::RequestId;
use crate::models::Feedback;
use crate::services::{ActionOutcome, FeedSnapshot, History};

use super::AppState;

const MAX_FIELD_LEN: usize = 200;

// Request/Response types

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub outcome: ActionOutcome,
    pub feed: FeedSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct SetFieldRequest {
    #[serde(default)]
    pub field: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShowHistoryRequest {
    pub show: bool,
}

// Handlers

pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

pub async fn get_feed(State(state): State<AppState>) -> Json<FeedSnapshot> {
    Json(state.feed.snapshot().await)
}

pub async fn like(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Json<ActionResponse> {
    record(state, request_id, Feedback::Like).await
}

pub async fn dislike(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Json<ActionResponse> {
    record(state, request_id, Feedback::Dislike).await
}

pub async fn skip(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Json<ActionResponse> {
    record(state, request_id, Feedback::Skip).await
}

async fn record(state: AppState, request_id: RequestId, feedback: Feedback) -> Json<ActionResponse> {
    let outcome = state.feed.record(feedback).await;

    tracing::debug!(
        request_id = %request_id,
        feedback = %feedback,
        outcome = ?outcome,
        "Feedback request handled"
    );

    Json(ActionResponse {
        outcome,
        feed: state.feed.snapshot().await,
    })
}

pub async fn refresh(State(state): State<AppState>) -> Json<FeedSnapshot> {
    state.queue().refresh().await;
    Json(state.feed.snapshot().await)
}

pub async fn reset_session(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Json<FeedSnapshot> {
    tracing::info!(request_id = %request_id, "Session reset requested");
    state.feed.reset_session().await;
    Json(state.feed.snapshot().await)
}

pub async fn get_history(State(state): State<AppState>) -> Json<History> {
    Json(state.queue().history().await)
}

pub async fn set_field(
    State(state): State<AppState>,
    Json(request): Json<SetFieldRequest>,
) -> AppResult<Json<FeedSnapshot>> {
    if let Some(field) = &request.field {
        if field.len() > MAX_FIELD_LEN {
            return Err(AppError::InvalidInput(format!(
                "Field must be at most {} characters",
                MAX_FIELD_LEN
            )));
        }
    }

    state.queue().select_field(request.field).await;
    Ok(Json(state.feed.snapshot().await))
}

pub async fn set_history_visibility(
    State(state): State<AppState>,
    Json(request): Json<ShowHistoryRequest>,
) -> Json<History> {
    state.queue().set_show_history(request.show).await;
    Json(state.queue().history().await)
}
