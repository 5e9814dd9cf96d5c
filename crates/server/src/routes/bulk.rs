use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use service::bulk::{BulkOperationResult, BulkRequest};

use crate::errors::ApiError;
use crate::state::AppState;

/// Runs the operation to completion; per-item failures are reported in the
/// body, so a partially failed run still answers 200.
#[utoipa::path(
    post, path = "/api/bulk", tag = "bulk",
    request_body = crate::openapi::BulkRequestDoc,
    responses((status = 200, description = "Operation result"), (status = 400, description = "Invalid request"))
)]
pub async fn execute(
    State(state): State<AppState>,
    body: Result<Json<BulkRequest>, JsonRejection>,
) -> Result<Json<BulkOperationResult>, ApiError> {
    let Json(req) = body?;
    Ok(Json(state.bulk.execute(req).await?))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<BulkOperationResult>>, ApiError> {
    Ok(Json(state.bulk.list().await?))
}

#[utoipa::path(
    get, path = "/api/bulk/{id}", tag = "bulk",
    params(("id" = String, Path, description = "Bulk operation id")),
    responses((status = 200, description = "Operation result"), (status = 404, description = "Unknown operation"))
)]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BulkOperationResult>, ApiError> {
    state
        .bulk
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("bulk operation"))
}
