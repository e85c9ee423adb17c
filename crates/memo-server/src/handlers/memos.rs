//! Memo endpoint handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use memo_core::{Memo, MemoStatus, NewMemo, TtlDays};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::extractors::{PageQuery, UserEmail};
use crate::state::AppState;

/// Body of `POST /api/memos`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMemoRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_broadcast: bool,
    pub ttl_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SendMemoResponse {
    pub id: String,
    pub status: MemoStatus,
    pub message: String,
}

/// Body of `PUT /api/memos/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: MemoStatus,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Handler for POST /api/memos.
#[instrument(skip_all, fields(from = %sender.0))]
pub async fn send_memo(
    State(state): State<AppState>,
    sender: UserEmail,
    payload: Result<Json<SendMemoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SendMemoResponse>), AppError> {
    let req = body(payload)?;
    let ttl = req.ttl_days.map(TtlDays::new).transpose()?;

    let draft = NewMemo::new(sender.0, req.to, req.subject, req.message)
        .broadcast(req.is_broadcast)
        .ttl_days(ttl);
    let broadcast = draft.is_broadcast();

    let id = state.store().add(draft).await?;

    info!(id = %id, broadcast, "Memo created");

    Ok((
        StatusCode::CREATED,
        Json(SendMemoResponse {
            id,
            status: MemoStatus::Sent,
            message: "Memo sent successfully".to_string(),
        }),
    ))
}

/// Handler for GET /api/memos/sent.
#[instrument(skip_all, fields(user = %user.0))]
pub async fn get_sent_memos(
    State(state): State<AppState>,
    user: UserEmail,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Memo>>, AppError> {
    let memos = state.store().get_sent_memos(&user.0, query.page()).await?;
    Ok(Json(memos))
}

/// Handler for GET /api/memos/received.
#[instrument(skip_all, fields(user = %user.0))]
pub async fn get_received_memos(
    State(state): State<AppState>,
    user: UserEmail,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Memo>>, AppError> {
    let memos = state
        .store()
        .get_received_memos(&user.0, query.page())
        .await?;
    Ok(Json(memos))
}

/// Handler for GET /api/memos/{id}.
#[instrument(skip_all, fields(id = %id))]
pub async fn get_memo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Memo>, AppError> {
    Ok(Json(state.store().get(&id).await?))
}

/// Handler for PUT /api/memos/{id}/status.
#[instrument(skip_all, fields(id = %id))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let req = body(payload)?;

    if !state.store().update_status(&id, req.status).await? {
        return Err(AppError::NotFound(id));
    }

    info!(status = %req.status, "Memo status updated");
    Ok(MessageResponse::new("Status updated successfully"))
}

/// Handler for DELETE /api/memos/{id}.
#[instrument(skip_all, fields(id = %id))]
pub async fn delete_memo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store().delete(&id).await? {
        return Err(AppError::NotFound(id));
    }

    info!("Memo deleted");
    Ok(MessageResponse::new("Memo deleted successfully"))
}
