use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Handler for GET /api/users.
#[instrument(skip_all)]
pub async fn get_active_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.store().active_users().await?))
}
