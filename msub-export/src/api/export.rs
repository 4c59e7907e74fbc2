//! Export trigger endpoint

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::delivery::DeliveryLocation;
use crate::error::ApiResult;
use crate::AppState;

/// POST /api/submissions/:id/export response
#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub submission_id: Uuid,
    pub status: String,
    pub locations: Vec<DeliveryLocation>,
}

/// POST /api/submissions/:id/export
///
/// Assemble the submission's package and deliver it to every configured
/// destination. The response lists where the package landed.
pub async fn trigger_export(
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<ExportResponse>> {
    let client_ip = client_ip(&headers);

    let outcome = crate::export::run_export(
        &state.db,
        &state.assembler,
        &state.store,
        submission_id,
        &client_ip,
    )
    .await?;

    Ok(Json(ExportResponse {
        submission_id,
        status: outcome.status.as_str().to_string(),
        locations: outcome.locations,
    }))
}

/// Requesting address from the forwarding header; multi-hop lists keep the
/// first (client) hop.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Build export routes
pub fn export_routes() -> Router<AppState> {
    Router::new().route("/api/submissions/:id/export", post(trigger_export))
}
