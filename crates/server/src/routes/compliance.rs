//! GPSR compliance endpoints; all local, no upstream calls.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use service::compliance::{ComplianceInput, ComplianceRecord, ComplianceReport};
use service::storage::Document;

use crate::errors::ApiError;
use crate::state::AppState;

#[utoipa::path(
    get, path = "/api/compliance/{product_id}", tag = "compliance",
    params(("product_id" = String, Path, description = "Product id")),
    responses((status = 200, description = "Compliance report; INCOMPLETE when no record exists"))
)]
pub async fn get(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<ComplianceReport>, ApiError> {
    Ok(Json(state.compliance.status(&product_id).await?))
}

#[utoipa::path(
    put, path = "/api/compliance/{product_id}", tag = "compliance",
    params(("product_id" = String, Path, description = "Product id")),
    request_body = crate::openapi::ComplianceInputDoc,
    responses((status = 200, description = "Stored record"), (status = 400, description = "Invalid record"))
)]
pub async fn upsert(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    body: Result<Json<ComplianceInput>, JsonRejection>,
) -> Result<Json<ComplianceRecord>, ApiError> {
    let Json(input) = body?;
    Ok(Json(state.compliance.upsert(&product_id, input).await?))
}

pub async fn patch(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<Json<ComplianceRecord>, ApiError> {
    let Json(fields) = body?;
    Ok(Json(state.compliance.patch(&product_id, fields).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.compliance.delete(&product_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("compliance record"))
    }
}
