use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use service::mockups::{GenerateMockupsInput, Mockup};

use crate::errors::ApiError;
use crate::state::AppState;

#[utoipa::path(
    post, path = "/api/mockups", tag = "mockups",
    request_body = crate::openapi::GenerateMockupsDoc,
    responses((status = 201, description = "Generated mockups"), (status = 404, description = "No matching product images"))
)]
pub async fn generate(
    State(state): State<AppState>,
    body: Result<Json<GenerateMockupsInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<Mockup>>), ApiError> {
    let Json(input) = body?;
    let made = state.mockups.generate(input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(made)))
}

pub async fn list(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<Mockup>>, ApiError> {
    Ok(Json(state.mockups.list(&product_id, Utc::now()).await?))
}

pub async fn purge_expired(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let removed = state.mockups.purge_expired(Utc::now()).await?;
    Ok(Json(json!({ "removed": removed })))
}
