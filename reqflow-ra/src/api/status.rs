//! Task status API handler
//!
//! Read-only projection of the task registry for polling clients. Safe to
//! call arbitrarily often, concurrently with the in-flight analysis of the
//! same id.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::TaskRecord,
    AppState,
};

/// GET /api/status/{task_id}
///
/// Poll analysis progress. Returns the full task record.
pub async fn get_status(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskRecord>> {
    let record = state
        .registry
        .get(task_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Task not found: {}", task_id)))?;

    tracing::debug!(task_id = %task_id, status = ?record.status, "Status query");

    Ok(Json(record))
}

/// Build status routes
pub fn status_routes() -> Router<AppState> {
    Router::new().route("/api/status/:task_id", get(get_status))
}
