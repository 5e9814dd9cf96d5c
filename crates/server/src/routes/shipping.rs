use axum::{
    extract::{rejection::JsonRejection, Path},
    Json,
};
use serde::Serialize;

use service::shipping::{self, Rate, ShippingMethod, ShippingQuote, ShippingQuoteRequest};

use crate::errors::ApiError;

#[derive(Serialize)]
pub struct ShippingOption {
    pub method: ShippingMethod,
    #[serde(flatten)]
    pub rate: Rate,
}

#[utoipa::path(
    post, path = "/api/shipping/quote", tag = "shipping",
    request_body = crate::openapi::ShippingQuoteDoc,
    responses((status = 200, description = "Quote in US cents"), (status = 400, description = "Invalid request or method unavailable"))
)]
pub async fn quote(body: Result<Json<ShippingQuoteRequest>, JsonRejection>) -> Result<Json<ShippingQuote>, ApiError> {
    let Json(req) = body?;
    Ok(Json(shipping::quote(&req)?))
}

pub async fn options(Path(country): Path<String>) -> Result<Json<Vec<ShippingOption>>, ApiError> {
    let opts = shipping::options(&country)?
        .into_iter()
        .map(|(method, rate)| ShippingOption { method, rate })
        .collect();
    Ok(Json(opts))
}
