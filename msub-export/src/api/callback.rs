//! Import result callback endpoint
//!
//! The downstream system reports its import verdict asynchronously, some
//! time after delivery. Only the two literal tokens `"success"` and
//! `"failure"` are accepted; anything else is rejected before it can touch
//! the submission.

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::import_result;
use crate::AppState;

/// POST /api/meca-result/:id request
#[derive(Debug, Deserialize)]
pub struct ImportResultRequest {
    pub result: String,
}

/// POST /api/meca-result/:id response
#[derive(Debug, Serialize)]
pub struct ImportResultResponse {
    pub submission_id: Uuid,
    pub status: String,
}

/// POST /api/meca-result/:id
pub async fn receive_import_result(
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
    Json(request): Json<ImportResultRequest>,
) -> ApiResult<Json<ImportResultResponse>> {
    if !import_result::validate_response(&request.result) {
        return Err(ApiError::BadRequest(format!(
            "unexpected result token: {:?}",
            request.result
        )));
    }

    let status = import_result::store_result(
        &state.db,
        state.mailer.as_ref(),
        &state.config.mail.import_failure_recipient,
        submission_id,
        &request.result,
    )
    .await?;

    Ok(Json(ImportResultResponse {
        submission_id,
        status: status.as_str().to_string(),
    }))
}

/// Build callback routes
pub fn callback_routes() -> Router<AppState> {
    Router::new().route("/api/meca-result/:id", post(receive_import_result))
}
