use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;

use service::tracking::{TrackingEvent, TrackingRecord, WebhookOutcome};

use crate::errors::ApiError;
use crate::state::AppState;

#[utoipa::path(
    get, path = "/api/tracking/{order_id}", tag = "tracking",
    params(("order_id" = String, Path, description = "Order id")),
    responses((status = 200, description = "Tracking record"), (status = 404, description = "No tracking for order"))
)]
pub async fn get(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<TrackingRecord>, ApiError> {
    state
        .tracking
        .get(&order_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("tracking record"))
}

#[utoipa::path(
    post, path = "/api/tracking/{order_id}/events", tag = "tracking",
    params(("order_id" = String, Path, description = "Order id")),
    request_body = crate::openapi::TrackingEventDoc,
    responses((status = 200, description = "Updated tracking record"), (status = 400, description = "Invalid event"))
)]
pub async fn record_event(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    body: Result<Json<TrackingEvent>, JsonRejection>,
) -> Result<Json<TrackingRecord>, ApiError> {
    let Json(event) = body?;
    Ok(Json(state.tracking.record_event(&order_id, event).await?))
}

/// Upstream webhook receiver.
pub async fn webhook(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<WebhookOutcome>, ApiError> {
    let Json(payload) = body?;
    Ok(Json(state.tracking.ingest_webhook(&payload).await?))
}
