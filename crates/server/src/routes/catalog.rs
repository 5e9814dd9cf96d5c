//! Shops, catalog, image uploads and upstream webhook subscriptions.

use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use service::merch::{CreateWebhookInput, UploadImageInput};

use crate::errors::ApiError;
use crate::state::AppState;

pub async fn shops(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.merch.list_shops().await?))
}

pub async fn blueprints(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.merch.list_blueprints().await?))
}

pub async fn providers(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.merch.list_print_providers(id).await?))
}

pub async fn upload(
    State(state): State<AppState>,
    body: Result<Json<UploadImageInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(input) = body?;
    Ok((StatusCode::CREATED, Json(state.merch.upload_image(input).await?)))
}

pub async fn list_webhooks(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.merch.list_webhooks().await?))
}

pub async fn create_webhook(
    State(state): State<AppState>,
    body: Result<Json<CreateWebhookInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(input) = body?;
    Ok((StatusCode::CREATED, Json(state.merch.create_webhook(input).await?)))
}
