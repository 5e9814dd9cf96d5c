use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use service::{merch::CreateProductInput, pagination::Pagination};

use crate::errors::ApiError;
use crate::state::AppState;

#[utoipa::path(
    get, path = "/api/products", tag = "products",
    params(("page" = Option<u32>, Query, description = "1-based page"), ("limit" = Option<u32>, Query, description = "Page size, at most 50")),
    responses((status = 200, description = "Upstream product page"), (status = 401, description = "Credentials not configured"), (status = 502, description = "Upstream failure"))
)]
pub async fn list(
    State(state): State<AppState>,
    page: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(page) = page?;
    Ok(Json(state.merch.list_products(page).await?))
}

#[utoipa::path(
    post, path = "/api/products", tag = "products",
    request_body = crate::openapi::CreateProductDoc,
    responses((status = 201, description = "Product created"), (status = 400, description = "Invalid product"))
)]
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateProductInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(input) = body?;
    Ok((StatusCode::CREATED, Json(state.merch.create_product(input).await?)))
}

#[utoipa::path(
    get, path = "/api/products/{id}", tag = "products",
    params(("id" = String, Path, description = "Upstream product id")),
    responses((status = 200, description = "Product"), (status = 502, description = "Upstream failure"))
)]
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.merch.get_product(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    Ok(Json(state.merch.update_product(&id, body).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    state.merch.delete_product(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    state.merch.publish_product(&id).await?;
    Ok(Json(json!({ "product_id": id, "published": true })))
}

pub async fn unpublish(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    state.merch.unpublish_product(&id).await?;
    Ok(Json(json!({ "product_id": id, "published": false })))
}
