//! Product mockups derived from the upstream product images.
//!
//! Mockups carry an `expires_at`; expiry is applied here when listing, the
//! collection itself never drops documents on its own.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::printify::{validate_id, PrintifyApi};
use crate::storage::{from_document, to_document, Document, DocumentStore};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Mockup {
    pub id: String,
    pub product_id: String,
    pub src: String,
    #[serde(default)]
    pub variant_ids: Vec<u64>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Mockup {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GenerateMockupsInput {
    pub product_id: String,
    /// Only keep images that show at least one of these variants.
    #[serde(default)]
    pub variant_ids: Option<Vec<u64>>,
}

pub struct MockupService {
    store: Arc<dyn DocumentStore>,
    api: Arc<dyn PrintifyApi>,
    ttl_hours: i64,
}

fn same_product(product_id: &str) -> impl Fn(&Document) -> bool + Send + Sync + '_ {
    move |d: &Document| d.get("product_id").and_then(Value::as_str) == Some(product_id)
}

impl MockupService {
    pub fn new(store: Arc<dyn DocumentStore>, api: Arc<dyn PrintifyApi>, ttl_hours: i64) -> Self {
        Self { store, api, ttl_hours }
    }

    /// Fetch the product upstream and store one mockup per matching image,
    /// replacing any mockups previously generated for that product.
    pub async fn generate(&self, input: GenerateMockupsInput, now: DateTime<Utc>) -> Result<Vec<Mockup>, ServiceError> {
        let product_id = validate_id(&input.product_id, "product_id")?;
        if matches!(&input.variant_ids, Some(v) if v.is_empty()) {
            return Err(ServiceError::Validation("variant_ids must not be empty when given".into()));
        }

        let expires_at = Duration::try_hours(self.ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| ServiceError::Internal(format!("mockup ttl of {} hours is out of range", self.ttl_hours)))?;

        let product = self.api.get_product(product_id).await?;
        let images = product.get("images").and_then(Value::as_array).cloned().unwrap_or_default();

        let mockups: Vec<Mockup> = images
            .iter()
            .filter_map(|img| {
                let src = img.get("src").and_then(Value::as_str)?;
                let variant_ids: Vec<u64> = img
                    .get("variant_ids")
                    .and_then(Value::as_array)
                    .map(|ids| ids.iter().filter_map(Value::as_u64).collect())
                    .unwrap_or_default();
                if let Some(wanted) = &input.variant_ids {
                    if !variant_ids.iter().any(|v| wanted.contains(v)) {
                        return None;
                    }
                }
                Some(Mockup {
                    id: format!("mockup-{}", Uuid::new_v4()),
                    product_id: product_id.to_string(),
                    src: src.to_string(),
                    variant_ids,
                    position: img.get("position").and_then(Value::as_str).map(str::to_string),
                    is_default: img.get("is_default").and_then(Value::as_bool).unwrap_or(false),
                    created_at: now,
                    expires_at,
                })
            })
            .collect();

        if mockups.is_empty() {
            warn!(product_id, "no product images matched for mockups");
            return Err(ServiceError::NotFound(format!("no images available for product {product_id}")));
        }

        for old in self.store.find_by_query(&same_product(product_id)).await {
            if let Some(id) = old.get("id").and_then(Value::as_str) {
                self.store.delete(id).await?;
            }
        }
        for m in &mockups {
            self.store.create(&m.id, to_document(m)?).await?;
        }
        info!(product_id, count = mockups.len(), "mockups generated");
        Ok(mockups)
    }

    /// Live (non-expired) mockups for a product.
    pub async fn list(&self, product_id: &str, now: DateTime<Utc>) -> Result<Vec<Mockup>, ServiceError> {
        let docs = self.store.find_by_query(&same_product(product_id)).await;
        let mut out = Vec::with_capacity(docs.len());
        for d in docs {
            let m: Mockup = from_document(d)?;
            if !m.is_expired(now) {
                out.push(m);
            }
        }
        Ok(out)
    }

    /// Delete every expired mockup; returns how many were removed.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, ServiceError> {
        let expired = self
            .store
            .find_by_query(&move |d: &Document| {
                d.get("expires_at")
                    .and_then(Value::as_str)
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map_or(false, |t| t.with_timezone(&Utc) <= now)
            })
            .await;
        let mut removed = 0;
        for d in expired {
            if let Some(id) = d.get("id").and_then(Value::as_str) {
                if self.store.delete(id).await? {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            info!(removed, "expired mockups purged");
        }
        Ok(removed)
    }
}
