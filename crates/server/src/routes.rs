pub mod bulk;
pub mod catalog;
pub mod compliance;
pub mod mockups;
pub mod orders;
pub mod products;
pub mod shipping;
pub mod tracking;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use crate::errors::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> (StatusCode, String) {
    common::metrics::encode_metrics()
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn fallback() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "route not found")
}

/// Build the full application router.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api-docs/openapi.json", get(openapi_json));

    let merch = Router::new()
        .route("/api/products", get(products::list).post(products::create))
        .route(
            "/api/products/:id",
            get(products::get).put(products::update).delete(products::delete),
        )
        .route("/api/products/:id/publish", post(products::publish))
        .route("/api/products/:id/unpublish", post(products::unpublish))
        .route("/api/orders", get(orders::list).post(orders::submit))
        .route("/api/orders/:id", get(orders::get))
        .route("/api/orders/:id/cancel", post(orders::cancel))
        .route("/api/shops", get(catalog::shops))
        .route("/api/catalog/blueprints", get(catalog::blueprints))
        .route("/api/catalog/blueprints/:id/providers", get(catalog::providers))
        .route("/api/uploads", post(catalog::upload))
        .route("/api/webhooks", get(catalog::list_webhooks).post(catalog::create_webhook));

    let local = Router::new()
        .route("/api/shipping/quote", post(shipping::quote))
        .route("/api/shipping/options/:country", get(shipping::options))
        .route(
            "/api/compliance/:product_id",
            get(compliance::get)
                .put(compliance::upsert)
                .patch(compliance::patch)
                .delete(compliance::delete),
        )
        .route("/api/mockups", post(mockups::generate).delete(mockups::purge_expired))
        .route("/api/mockups/:product_id", get(mockups::list))
        .route("/api/tracking/:order_id", get(tracking::get))
        .route("/api/tracking/:order_id/events", post(tracking::record_event))
        .route("/api/webhooks/printify", post(tracking::webhook))
        .route("/api/bulk", get(bulk::list).post(bulk::execute))
        .route("/api/bulk/:id", get(bulk::get));

    public
        .merge(merch)
        .merge(local)
        .fallback(fallback)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
