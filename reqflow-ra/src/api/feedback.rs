//! Feedback submission API handler

use axum::{extract::State, routing::post, Json, Router};
use reqflow_common::genome::RequirementGenome;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// POST /api/feedback request
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    /// Conversational feedback for this refinement round
    pub feedback: String,
    /// Full prior genome, as last returned to the client
    #[serde(default)]
    pub state: RequirementGenome,
}

/// POST /api/feedback response
#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub task_id: Uuid,
}

/// POST /api/feedback
///
/// Register one refinement round. Returns the task id immediately; the
/// analysis runs in the background and is observed via /api/status.
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<Json<FeedbackResponse>> {
    if request.feedback.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "feedback must not be empty".to_string(),
        ));
    }

    let task_id = state
        .orchestrator
        .submit(request.feedback, request.state)
        .await;

    Ok(Json(FeedbackResponse { task_id }))
}

/// Build feedback routes
pub fn feedback_routes() -> Router<AppState> {
    Router::new().route("/api/feedback", post(submit_feedback))
}
