//! Print-on-demand upstream (Printify REST API v1).
//!
//! Requests and responses are passed through as raw JSON; this crate only
//! shapes what it sends and reads the few fields the domain services need.

pub mod client;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ServiceError;
use crate::pagination::Pagination;
pub use client::HttpPrintifyClient;

/// Operations consumed from the upstream API. Every call is single-shot.
#[async_trait]
pub trait PrintifyApi: Send + Sync {
    async fn list_shops(&self) -> Result<Value, ServiceError>;

    async fn list_products(&self, page: Pagination) -> Result<Value, ServiceError>;
    async fn get_product(&self, product_id: &str) -> Result<Value, ServiceError>;
    async fn create_product(&self, body: &Value) -> Result<Value, ServiceError>;
    async fn update_product(&self, product_id: &str, body: &Value) -> Result<Value, ServiceError>;
    async fn delete_product(&self, product_id: &str) -> Result<(), ServiceError>;
    async fn publish_product(&self, product_id: &str) -> Result<(), ServiceError>;
    async fn unpublish_product(&self, product_id: &str) -> Result<(), ServiceError>;

    async fn list_orders(&self, page: Pagination) -> Result<Value, ServiceError>;
    async fn get_order(&self, order_id: &str) -> Result<Value, ServiceError>;
    async fn submit_order(&self, body: &Value) -> Result<Value, ServiceError>;
    async fn cancel_order(&self, order_id: &str) -> Result<Value, ServiceError>;

    async fn list_blueprints(&self) -> Result<Value, ServiceError>;
    async fn list_print_providers(&self, blueprint_id: u64) -> Result<Value, ServiceError>;
    async fn upload_image(&self, file_name: &str, url: &str) -> Result<Value, ServiceError>;

    async fn list_webhooks(&self) -> Result<Value, ServiceError>;
    async fn create_webhook(&self, topic: &str, url: &str) -> Result<Value, ServiceError>;
}

/// Pull a human-readable message out of an upstream error body.
/// Upstream ids become URL path segments; only `[A-Za-z0-9_-]` is accepted.
pub fn validate_id<'a>(id: &'a str, field: &str) -> Result<&'a str, ServiceError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ServiceError::Validation(format!("{field} is required")));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(ServiceError::Validation(format!("{field} may only contain letters, digits, '_' and '-'")));
    }
    Ok(id)
}

pub(crate) fn upstream_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|v| {
        v.get("message")
            .or_else(|| v.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    match from_json {
        Some(msg) => msg,
        None => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response body".to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{upstream_message, validate_id};
    use crate::errors::ServiceError;

    #[test]
    fn message_prefers_json_fields() {
        assert_eq!(upstream_message(r#"{"status":"error","message":"Product not found"}"#), "Product not found");
        assert_eq!(upstream_message(r#"{"error":"Unauthenticated"}"#), "Unauthenticated");
        assert_eq!(upstream_message("  "), "empty response body");
        assert_eq!(upstream_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn ids_are_single_path_segments() {
        assert_eq!(validate_id(" 5a96f649b2439217d070f507 ", "product id").unwrap(), "5a96f649b2439217d070f507");
        assert_eq!(validate_id("ext_1-a", "id").unwrap(), "ext_1-a");
        for bad in ["", "  ", "x/../../v1/shops/999/products/victim", "abc?x=", "a.json", "a b", "%2F"] {
            assert!(matches!(validate_id(bad, "product id"), Err(ServiceError::Validation(_))), "{bad}");
        }
    }
}
