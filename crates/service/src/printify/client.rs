use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use common::metrics::{UPSTREAM_ERRORS_TOTAL, UPSTREAM_REQUESTS_TOTAL};
use configs::PrintifyConfig;

use super::{upstream_message, validate_id, PrintifyApi};
use crate::errors::ServiceError;
use crate::pagination::Pagination;

/// reqwest-backed client with a single fixed timeout and no retries.
#[derive(Clone)]
pub struct HttpPrintifyClient {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    shop_id: Option<String>,
}

impl HttpPrintifyClient {
    pub fn new(cfg: &PrintifyConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(cfg.user_agent.clone())
            .build()
            .map_err(|e| ServiceError::Internal(format!("build http client: {e}")))?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_token: cfg.api_token.clone(),
            shop_id: cfg.shop_id.clone(),
        })
    }

    fn token(&self) -> Result<&str, ServiceError> {
        self.api_token
            .as_deref()
            .ok_or_else(|| ServiceError::MissingCredentials("Printify API token is not configured".into()))
    }

    fn shop_path(&self, rest: &str) -> Result<String, ServiceError> {
        let shop = self
            .shop_id
            .as_deref()
            .ok_or_else(|| ServiceError::MissingCredentials("Printify shop id is not configured".into()))?;
        Ok(format!("/shops/{shop}{rest}"))
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, ServiceError> {
        let token = self.token()?;
        let url = format!("{}{}", self.base_url, path);
        UPSTREAM_REQUESTS_TOTAL.inc();
        debug!(%method, %path, "upstream request");

        let mut req = self.http.request(method.clone(), &url).bearer_auth(token);
        if let Some(b) = body {
            req = req.json(b);
        }
        let resp = req.send().await.map_err(|e| {
            UPSTREAM_ERRORS_TOTAL.inc();
            warn!(%method, %path, error = %e, "upstream request failed");
            ServiceError::Upstream(format!("{method} {path}: {e}"))
        })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ServiceError::Upstream(format!("{method} {path}: reading body: {e}")))?;
        if !status.is_success() {
            UPSTREAM_ERRORS_TOTAL.inc();
            let msg = upstream_message(&text);
            warn!(%method, %path, status = status.as_u16(), message = %msg, "upstream returned error");
            return Err(ServiceError::Upstream(format!("{method} {path} returned {status}: {msg}")));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| ServiceError::Upstream(format!("{method} {path}: invalid JSON from upstream: {e}")))
    }
}

#[async_trait]
impl PrintifyApi for HttpPrintifyClient {
    async fn list_shops(&self) -> Result<Value, ServiceError> {
        self.send(Method::GET, "/shops.json", None).await
    }

    async fn list_products(&self, page: Pagination) -> Result<Value, ServiceError> {
        let path = self.shop_path(&format!("/products.json?{}", page.to_query()))?;
        self.send(Method::GET, &path, None).await
    }

    async fn get_product(&self, product_id: &str) -> Result<Value, ServiceError> {
        let product_id = validate_id(product_id, "product id")?;
        let path = self.shop_path(&format!("/products/{product_id}.json"))?;
        self.send(Method::GET, &path, None).await
    }

    async fn create_product(&self, body: &Value) -> Result<Value, ServiceError> {
        let path = self.shop_path("/products.json")?;
        self.send(Method::POST, &path, Some(body)).await
    }

    async fn update_product(&self, product_id: &str, body: &Value) -> Result<Value, ServiceError> {
        let product_id = validate_id(product_id, "product id")?;
        let path = self.shop_path(&format!("/products/{product_id}.json"))?;
        self.send(Method::PUT, &path, Some(body)).await
    }

    async fn delete_product(&self, product_id: &str) -> Result<(), ServiceError> {
        let product_id = validate_id(product_id, "product id")?;
        let path = self.shop_path(&format!("/products/{product_id}.json"))?;
        self.send(Method::DELETE, &path, None).await.map(|_| ())
    }

    async fn publish_product(&self, product_id: &str) -> Result<(), ServiceError> {
        let product_id = validate_id(product_id, "product id")?;
        let path = self.shop_path(&format!("/products/{product_id}/publish.json"))?;
        let body = json!({
            "title": true,
            "description": true,
            "images": true,
            "variants": true,
            "tags": true,
            "keyFeatures": true,
            "shipping_template": true
        });
        self.send(Method::POST, &path, Some(&body)).await.map(|_| ())
    }

    async fn unpublish_product(&self, product_id: &str) -> Result<(), ServiceError> {
        let product_id = validate_id(product_id, "product id")?;
        let path = self.shop_path(&format!("/products/{product_id}/unpublish.json"))?;
        self.send(Method::POST, &path, None).await.map(|_| ())
    }

    async fn list_orders(&self, page: Pagination) -> Result<Value, ServiceError> {
        let path = self.shop_path(&format!("/orders.json?{}", page.to_query()))?;
        self.send(Method::GET, &path, None).await
    }

    async fn get_order(&self, order_id: &str) -> Result<Value, ServiceError> {
        let order_id = validate_id(order_id, "order id")?;
        let path = self.shop_path(&format!("/orders/{order_id}.json"))?;
        self.send(Method::GET, &path, None).await
    }

    async fn submit_order(&self, body: &Value) -> Result<Value, ServiceError> {
        let path = self.shop_path("/orders.json")?;
        self.send(Method::POST, &path, Some(body)).await
    }

    async fn cancel_order(&self, order_id: &str) -> Result<Value, ServiceError> {
        let order_id = validate_id(order_id, "order id")?;
        let path = self.shop_path(&format!("/orders/{order_id}/cancel.json"))?;
        self.send(Method::POST, &path, None).await
    }

    async fn list_blueprints(&self) -> Result<Value, ServiceError> {
        self.send(Method::GET, "/catalog/blueprints.json", None).await
    }

    async fn list_print_providers(&self, blueprint_id: u64) -> Result<Value, ServiceError> {
        let path = format!("/catalog/blueprints/{blueprint_id}/print_providers.json");
        self.send(Method::GET, &path, None).await
    }

    async fn upload_image(&self, file_name: &str, url: &str) -> Result<Value, ServiceError> {
        let body = json!({ "file_name": file_name, "url": url });
        self.send(Method::POST, "/uploads/images.json", Some(&body)).await
    }

    async fn list_webhooks(&self) -> Result<Value, ServiceError> {
        let path = self.shop_path("/webhooks.json")?;
        self.send(Method::GET, &path, None).await
    }

    async fn create_webhook(&self, topic: &str, url: &str) -> Result<Value, ServiceError> {
        let path = self.shop_path("/webhooks.json")?;
        let body = json!({ "topic": topic, "url": url });
        self.send(Method::POST, &path, Some(&body)).await
    }
}
