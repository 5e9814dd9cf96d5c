use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use service::{merch::SubmitOrderInput, pagination::Pagination};

use crate::errors::ApiError;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    page: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(page) = page?;
    Ok(Json(state.merch.list_orders(page).await?))
}

#[utoipa::path(
    post, path = "/api/orders", tag = "orders",
    request_body = crate::openapi::SubmitOrderDoc,
    responses((status = 201, description = "Order submitted upstream"), (status = 400, description = "Invalid order"), (status = 502, description = "Upstream failure"))
)]
pub async fn submit(
    State(state): State<AppState>,
    body: Result<Json<SubmitOrderInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(input) = body?;
    Ok((StatusCode::CREATED, Json(state.merch.submit_order(input).await?)))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.merch.get_order(&id).await?))
}

pub async fn cancel(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.merch.cancel_order(&id).await?))
}
