//! Merchandise, orders and catalog: boundary validation, then pass-through.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::printify::{validate_id, PrintifyApi};

/// Webhook topics the upstream can deliver.
pub const WEBHOOK_TOPICS: &[&str] = &[
    "order:created",
    "order:updated",
    "order:sent-to-production",
    "order:shipment:created",
    "order:shipment:delivered",
    "product:deleted",
    "product:publish:started",
    "shop:disconnected",
];

fn yes() -> bool { true }

fn require(value: &str, field: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn require_url(value: &str, field: &str) -> Result<(), ServiceError> {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ServiceError::Validation(format!("{field} must start with http(s)")));
    }
    Ok(())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariantInput {
    pub id: u64,
    /// Minor units (cents).
    pub price: u64,
    #[serde(default = "yes")]
    pub is_enabled: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrintAreaInput {
    pub variant_ids: Vec<u64>,
    pub placeholders: Vec<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateProductInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub blueprint_id: u64,
    pub print_provider_id: u64,
    pub variants: Vec<VariantInput>,
    pub print_areas: Vec<PrintAreaInput>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateProductInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        require(&self.title, "title")?;
        if self.blueprint_id == 0 || self.print_provider_id == 0 {
            return Err(ServiceError::Validation("blueprint_id and print_provider_id are required".into()));
        }
        if self.variants.is_empty() {
            return Err(ServiceError::Validation("at least one variant is required".into()));
        }
        if self.variants.iter().any(|v| v.price == 0) {
            return Err(ServiceError::Validation("variant price must be greater than zero".into()));
        }
        if self.print_areas.is_empty() {
            return Err(ServiceError::Validation("at least one print area is required".into()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineItemInput {
    pub product_id: String,
    pub variant_id: u64,
    pub quantity: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddressInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub country: String,
    #[serde(default)]
    pub region: String,
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    pub city: String,
    pub zip: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmitOrderInput {
    pub external_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub line_items: Vec<LineItemInput>,
    #[serde(default = "default_shipping_method")]
    pub shipping_method: u32,
    #[serde(default)]
    pub send_shipping_notification: bool,
    pub address_to: AddressInput,
}

fn default_shipping_method() -> u32 { 1 }

impl SubmitOrderInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        require(&self.external_id, "external_id")?;
        if self.line_items.is_empty() {
            return Err(ServiceError::Validation("line_items must not be empty".into()));
        }
        for item in &self.line_items {
            validate_id(&item.product_id, "line_items.product_id")?;
            if item.quantity == 0 {
                return Err(ServiceError::Validation("line_items.quantity must be at least 1".into()));
            }
        }
        let a = &self.address_to;
        for (value, field) in [
            (&a.first_name, "address_to.first_name"),
            (&a.last_name, "address_to.last_name"),
            (&a.country, "address_to.country"),
            (&a.address1, "address_to.address1"),
            (&a.city, "address_to.city"),
            (&a.zip, "address_to.zip"),
        ] {
            require(value, field)?;
        }
        if let Some(email) = &a.email {
            if !email.contains('@') {
                return Err(ServiceError::Validation("address_to.email is not a valid address".into()));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct UploadImageInput {
    pub file_name: String,
    pub url: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreateWebhookInput {
    pub topic: String,
    pub url: String,
}

/// Thin forwarding layer over the upstream API.
pub struct MerchService {
    api: Arc<dyn PrintifyApi>,
}

impl MerchService {
    pub fn new(api: Arc<dyn PrintifyApi>) -> Self { Self { api } }

    pub async fn list_shops(&self) -> Result<Value, ServiceError> {
        self.api.list_shops().await
    }

    pub async fn list_products(&self, page: Pagination) -> Result<Value, ServiceError> {
        self.api.list_products(page).await
    }

    pub async fn get_product(&self, id: &str) -> Result<Value, ServiceError> {
        let id = validate_id(id, "product id")?;
        self.api.get_product(id).await
    }

    pub async fn create_product(&self, input: CreateProductInput) -> Result<Value, ServiceError> {
        input.validate()?;
        let created = self.api.create_product(&serde_json::to_value(&input)?).await?;
        info!(title = %input.title, id = ?created.get("id"), "product created");
        Ok(created)
    }

    /// Partial update; only a JSON object is accepted and `title`, if
    /// present, must be non-empty.
    pub async fn update_product(&self, id: &str, body: Value) -> Result<Value, ServiceError> {
        let id = validate_id(id, "product id")?;
        let obj = body
            .as_object()
            .ok_or_else(|| ServiceError::Validation("update body must be a JSON object".into()))?;
        if obj.is_empty() {
            return Err(ServiceError::Validation("update body must not be empty".into()));
        }
        if let Some(title) = obj.get("title") {
            if title.as_str().map_or(true, |t| t.trim().is_empty()) {
                return Err(ServiceError::Validation("title must be a non-empty string".into()));
            }
        }
        self.api.update_product(id, &body).await
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), ServiceError> {
        let id = validate_id(id, "product id")?;
        self.api.delete_product(id).await?;
        info!(product_id = id, "product deleted");
        Ok(())
    }

    pub async fn publish_product(&self, id: &str) -> Result<(), ServiceError> {
        let id = validate_id(id, "product id")?;
        self.api.publish_product(id).await
    }

    pub async fn unpublish_product(&self, id: &str) -> Result<(), ServiceError> {
        let id = validate_id(id, "product id")?;
        self.api.unpublish_product(id).await
    }

    pub async fn list_orders(&self, page: Pagination) -> Result<Value, ServiceError> {
        self.api.list_orders(page).await
    }

    pub async fn get_order(&self, id: &str) -> Result<Value, ServiceError> {
        let id = validate_id(id, "order id")?;
        self.api.get_order(id).await
    }

    pub async fn submit_order(&self, input: SubmitOrderInput) -> Result<Value, ServiceError> {
        input.validate()?;
        let created = self.api.submit_order(&serde_json::to_value(&input)?).await?;
        info!(external_id = %input.external_id, items = input.line_items.len(), "order submitted");
        Ok(created)
    }

    pub async fn cancel_order(&self, id: &str) -> Result<Value, ServiceError> {
        let id = validate_id(id, "order id")?;
        let res = self.api.cancel_order(id).await?;
        info!(order_id = id, "order canceled");
        Ok(res)
    }

    pub async fn list_blueprints(&self) -> Result<Value, ServiceError> {
        self.api.list_blueprints().await
    }

    pub async fn list_print_providers(&self, blueprint_id: u64) -> Result<Value, ServiceError> {
        self.api.list_print_providers(blueprint_id).await
    }

    pub async fn upload_image(&self, input: UploadImageInput) -> Result<Value, ServiceError> {
        require(&input.file_name, "file_name")?;
        require_url(&input.url, "url")?;
        self.api.upload_image(input.file_name.trim(), &input.url).await
    }

    pub async fn list_webhooks(&self) -> Result<Value, ServiceError> {
        self.api.list_webhooks().await
    }

    pub async fn create_webhook(&self, input: CreateWebhookInput) -> Result<Value, ServiceError> {
        if !WEBHOOK_TOPICS.contains(&input.topic.as_str()) {
            return Err(ServiceError::Validation(format!("unknown webhook topic {}", input.topic)));
        }
        require_url(&input.url, "url")?;
        self.api.create_webhook(&input.topic, &input.url).await
    }
}
