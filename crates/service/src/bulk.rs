//! Bulk per-product operations executed sequentially against the upstream.
//!
//! Each item succeeds or fails on its own; successes are never rolled back
//! when a later item fails. The outcome is stored under `bulk-<uuid>`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use common::metrics::BULK_ITEMS_TOTAL;

use crate::errors::ServiceError;
use crate::printify::{validate_id, PrintifyApi};
use crate::storage::{from_document, to_document, Document, DocumentStore};

pub const MAX_ITEMS: usize = 100;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BulkOperation {
    Publish,
    Unpublish,
    Delete,
    /// Price in minor units (cents).
    UpdatePrice {
        price: u64,
        #[serde(default)]
        variant_ids: Option<Vec<u64>>,
    },
    /// Sets each selected variant's SKU to `<prefix>-<variant_id>`.
    UpdateSku {
        sku_prefix: String,
        #[serde(default)]
        variant_ids: Option<Vec<u64>>,
    },
    EnableVariants { variant_ids: Vec<u64> },
    DisableVariants { variant_ids: Vec<u64> },
}

impl BulkOperation {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Unpublish => "unpublish",
            Self::Delete => "delete",
            Self::UpdatePrice { .. } => "update_price",
            Self::UpdateSku { .. } => "update_sku",
            Self::EnableVariants { .. } => "enable_variants",
            Self::DisableVariants { .. } => "disable_variants",
        }
    }

    fn validate(&self) -> Result<(), ServiceError> {
        let empty_selection = |ids: &Option<Vec<u64>>| matches!(ids, Some(v) if v.is_empty());
        match self {
            Self::UpdatePrice { price, variant_ids } => {
                if *price == 0 {
                    return Err(ServiceError::Validation("price must be greater than zero".into()));
                }
                if empty_selection(variant_ids) {
                    return Err(ServiceError::Validation("variant_ids must not be empty when given".into()));
                }
            }
            Self::UpdateSku { sku_prefix, variant_ids } => {
                if sku_prefix.trim().is_empty() {
                    return Err(ServiceError::Validation("sku_prefix is required".into()));
                }
                if empty_selection(variant_ids) {
                    return Err(ServiceError::Validation("variant_ids must not be empty when given".into()));
                }
            }
            Self::EnableVariants { variant_ids } | Self::DisableVariants { variant_ids } => {
                if variant_ids.is_empty() {
                    return Err(ServiceError::Validation("variant_ids is required".into()));
                }
            }
            Self::Publish | Self::Unpublish | Self::Delete => {}
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BulkRequest {
    pub product_ids: Vec<String>,
    pub operation: BulkOperation,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BulkStatus {
    /// Items are still being applied. A record left in this state by a
    /// process exit is marked `Interrupted` at the next startup.
    Running,
    Completed,
    PartiallyFailed,
    Failed,
    /// The process stopped mid-run; some items may have been applied upstream.
    Interrupted,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BulkItemError {
    pub product_id: String,
    pub error: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BulkOperationResult {
    pub id: String,
    pub operation: BulkOperation,
    pub status: BulkStatus,
    pub total_items: usize,
    pub successful_items: usize,
    pub failed_items: usize,
    pub succeeded: Vec<String>,
    pub errors: Vec<BulkItemError>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

pub struct BulkService {
    store: Arc<dyn DocumentStore>,
    api: Arc<dyn PrintifyApi>,
}

impl BulkService {
    pub fn new(store: Arc<dyn DocumentStore>, api: Arc<dyn PrintifyApi>) -> Self {
        Self { store, api }
    }

    fn normalize_ids(ids: Vec<String>) -> Result<Vec<String>, ServiceError> {
        let mut out: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            let id = validate_id(&id, "product_ids entry")?.to_string();
            if !out.contains(&id) {
                out.push(id);
            }
        }
        if out.is_empty() {
            return Err(ServiceError::Validation("product_ids must not be empty".into()));
        }
        if out.len() > MAX_ITEMS {
            return Err(ServiceError::Validation(format!("at most {MAX_ITEMS} products per bulk operation")));
        }
        Ok(out)
    }

    #[instrument(skip(self, req), fields(operation = req.operation.kind()))]
    pub async fn execute(&self, req: BulkRequest) -> Result<BulkOperationResult, ServiceError> {
        req.operation.validate()?;
        let product_ids = Self::normalize_ids(req.product_ids)?;

        let mut result = BulkOperationResult {
            id: format!("bulk-{}", Uuid::new_v4()),
            operation: req.operation,
            status: BulkStatus::Running,
            total_items: product_ids.len(),
            successful_items: 0,
            failed_items: 0,
            succeeded: Vec::new(),
            errors: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        };
        // persisted up front so an interrupted run is still visible
        self.store.create(&result.id, to_document(&result)?).await?;

        for product_id in product_ids {
            match self.apply(&result.operation, &product_id).await {
                Ok(()) => {
                    BULK_ITEMS_TOTAL.with_label_values(&["success"]).inc();
                    result.successful_items += 1;
                    result.succeeded.push(product_id);
                }
                Err(e) => {
                    BULK_ITEMS_TOTAL.with_label_values(&["failure"]).inc();
                    warn!(%product_id, error = %e, "bulk item failed");
                    result.failed_items += 1;
                    result.errors.push(BulkItemError { product_id, error: e.to_string() });
                }
            }
        }

        result.status = match (result.successful_items, result.failed_items) {
            (_, 0) => BulkStatus::Completed,
            (0, _) => BulkStatus::Failed,
            _ => BulkStatus::PartiallyFailed,
        };
        result.completed_at = Some(Utc::now());
        if let Err(e) = self.store.create(&result.id, to_document(&result)?).await {
            // upstream changes are already applied; keep the outcome in the log
            let failed: Vec<&str> = result.errors.iter().map(|item| item.product_id.as_str()).collect();
            error!(
                id = %result.id,
                succeeded = ?result.succeeded,
                failed = ?failed,
                error = %e,
                "bulk operation finished but its result could not be saved"
            );
            return Err(ServiceError::Storage(format!(
                "bulk operation {} finished ({} succeeded, {} failed) but its result could not be saved: {e}",
                result.id, result.successful_items, result.failed_items
            )));
        }
        info!(
            id = %result.id,
            successful = result.successful_items,
            failed = result.failed_items,
            "bulk operation finished"
        );
        Ok(result)
    }

    async fn apply(&self, op: &BulkOperation, product_id: &str) -> Result<(), ServiceError> {
        match op {
            BulkOperation::Publish => self.api.publish_product(product_id).await,
            BulkOperation::Unpublish => self.api.unpublish_product(product_id).await,
            BulkOperation::Delete => self.api.delete_product(product_id).await,
            BulkOperation::UpdatePrice { price, variant_ids } => {
                self.patch_variants(product_id, variant_ids.as_deref(), |v| {
                    v.insert("price".into(), json!(price));
                })
                .await
            }
            BulkOperation::UpdateSku { sku_prefix, variant_ids } => {
                let prefix = sku_prefix.trim();
                self.patch_variants(product_id, variant_ids.as_deref(), |v| {
                    let id = v.get("id").cloned().unwrap_or(Value::Null);
                    v.insert("sku".into(), json!(format!("{prefix}-{id}")));
                })
                .await
            }
            BulkOperation::EnableVariants { variant_ids } => {
                self.patch_variants(product_id, Some(variant_ids.as_slice()), |v| {
                    v.insert("is_enabled".into(), json!(true));
                })
                .await
            }
            BulkOperation::DisableVariants { variant_ids } => {
                self.patch_variants(product_id, Some(variant_ids.as_slice()), |v| {
                    v.insert("is_enabled".into(), json!(false));
                })
                .await
            }
        }
    }

    /// Fetch the product, edit the selected variants, and send the full
    /// variant list back upstream.
    async fn patch_variants<F>(&self, product_id: &str, selection: Option<&[u64]>, edit: F) -> Result<(), ServiceError>
    where
        F: Fn(&mut serde_json::Map<String, Value>) + Send + Sync,
    {
        let product = self.api.get_product(product_id).await?;
        let mut variants = product
            .get("variants")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| ServiceError::Upstream(format!("product {product_id} has no variants")))?;

        let mut touched = 0;
        for v in variants.iter_mut() {
            let selected = match (selection, v.get("id").and_then(Value::as_u64)) {
                (None, _) => true,
                (Some(ids), Some(id)) => ids.contains(&id),
                (Some(_), None) => false,
            };
            if let (true, Some(obj)) = (selected, v.as_object_mut()) {
                edit(obj);
                touched += 1;
            }
        }
        if touched == 0 {
            return Err(ServiceError::Validation(format!("none of the requested variants exist on product {product_id}")));
        }
        self.api.update_product(product_id, &json!({ "variants": variants })).await?;
        Ok(())
    }

    /// Mark records still `running` as `interrupted`. Called once at startup,
    /// before any new operation can be running.
    pub async fn mark_interrupted(&self) -> Result<usize, ServiceError> {
        let stale = self
            .store
            .find_by_query(&|d: &Document| d.get("status").and_then(Value::as_str) == Some("running"))
            .await;
        let mut marked = 0;
        for doc in stale {
            if let Some(id) = doc.get("id").and_then(Value::as_str) {
                let mut patch = Document::new();
                patch.insert("status".into(), serde_json::to_value(BulkStatus::Interrupted)?);
                if self.store.update(id, patch).await?.is_some() {
                    warn!(%id, "bulk operation was interrupted before finishing");
                    marked += 1;
                }
            }
        }
        Ok(marked)
    }

    pub async fn get(&self, id: &str) -> Result<Option<BulkOperationResult>, ServiceError> {
        self.store.find_by_id(id).await.map(from_document).transpose()
    }

    /// Most recent first.
    pub async fn list(&self) -> Result<Vec<BulkOperationResult>, ServiceError> {
        let mut out = self
            .store
            .find_all()
            .await
            .into_iter()
            .map(from_document)
            .collect::<Result<Vec<BulkOperationResult>, _>>()?;
        out.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonCollection;
    use crate::test_support::{temp_collection, FakePrintify};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Delegates to a real collection but fails every `create` after the first.
    struct FirstWriteOnly {
        inner: Arc<JsonCollection>,
        creates: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for FirstWriteOnly {
        fn name(&self) -> &str { self.inner.name() }
        async fn create(&self, key: &str, doc: Document) -> Result<Document, ServiceError> {
            if self.creates.fetch_add(1, Ordering::SeqCst) > 0 {
                return Err(ServiceError::Storage("disk full".into()));
            }
            self.inner.create(key, doc).await
        }
        async fn find_by_id(&self, key: &str) -> Option<Document> { self.inner.find_by_id(key).await }
        async fn find_all(&self) -> Vec<Document> { self.inner.find_all().await }
        async fn find_by_query(&self, predicate: &(dyn for<'a> Fn(&'a Document) -> bool + Send + Sync)) -> Vec<Document> {
            self.inner.find_by_query(predicate).await
        }
        async fn update(&self, key: &str, partial: Document) -> Result<Option<Document>, ServiceError> {
            self.inner.update(key, partial).await
        }
        async fn delete(&self, key: &str) -> Result<bool, ServiceError> { self.inner.delete(key).await }
        async fn clear(&self) -> Result<(), ServiceError> { self.inner.clear().await }
        async fn len(&self) -> usize { self.inner.len().await }
    }

    #[tokio::test]
    async fn unsaved_result_reports_outcome_and_is_marked_interrupted() -> Result<(), anyhow::Error> {
        let (dir, coll) = temp_collection("bulk_unsaved").await?;
        let api = FakePrintify::with_products(&["A", "B"]);
        api.fail_on("B");
        let store = Arc::new(FirstWriteOnly { inner: coll.clone(), creates: AtomicUsize::new(0) });
        let svc = BulkService::new(store, api.clone());

        let res = svc
            .execute(BulkRequest { product_ids: vec!["A".into(), "B".into()], operation: BulkOperation::Publish })
            .await;
        match res {
            Err(ServiceError::Storage(msg)) => assert!(msg.contains("1 succeeded, 1 failed"), "{msg}"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(api.published.lock().unwrap().contains("A"));

        // the up-front record is still `running` until the next startup sweep
        let listed = svc.list().await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, BulkStatus::Running);

        let restarted = BulkService::new(coll.clone(), api);
        assert_eq!(restarted.mark_interrupted().await?, 1);
        assert_eq!(restarted.list().await?[0].status, BulkStatus::Interrupted);
        assert_eq!(restarted.mark_interrupted().await?, 0);

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn partial_failure_is_reported_per_item() -> Result<(), anyhow::Error> {
        let (dir, coll) = temp_collection("bulk_partial").await?;
        let api = FakePrintify::with_products(&["A", "B"]);
        api.fail_on("B");
        let svc = BulkService::new(coll, api.clone());

        let res = svc
            .execute(BulkRequest {
                product_ids: vec!["A".into(), "B".into()],
                operation: BulkOperation::UpdatePrice { price: 2599, variant_ids: None },
            })
            .await?;

        assert_eq!(res.total_items, 2);
        assert_eq!(res.successful_items, 1);
        assert_eq!(res.failed_items, 1);
        assert_eq!(res.status, BulkStatus::PartiallyFailed);
        assert_eq!(res.errors.len(), 1);
        assert_eq!(res.errors[0].product_id, "B");
        assert_eq!(res.succeeded, vec!["A".to_string()]);

        let a = api.products.lock().unwrap()["A"].clone();
        assert_eq!(a["variants"][0]["price"], 2599);
        assert_eq!(a["variants"][1]["price"], 2599);

        let stored = svc.get(&res.id).await?.unwrap();
        assert_eq!(stored, res);

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn variant_selection_and_sku() -> Result<(), anyhow::Error> {
        let (dir, coll) = temp_collection("bulk_variants").await?;
        let api = FakePrintify::with_products(&["A"]);
        let svc = BulkService::new(coll, api.clone());

        svc.execute(BulkRequest {
            product_ids: vec!["A".into()],
            operation: BulkOperation::DisableVariants { variant_ids: vec![2] },
        })
        .await?;
        svc.execute(BulkRequest {
            product_ids: vec!["A".into(), "A".into()],
            operation: BulkOperation::UpdateSku { sku_prefix: "TEE".into(), variant_ids: Some(vec![1]) },
        })
        .await?;

        let a = api.products.lock().unwrap()["A"].clone();
        assert_eq!(a["variants"][0]["is_enabled"], true);
        assert_eq!(a["variants"][1]["is_enabled"], false);
        assert_eq!(a["variants"][0]["sku"], "TEE-1");
        assert_eq!(a["variants"][1]["sku"], "OLD-2");

        let missing = svc
            .execute(BulkRequest {
                product_ids: vec!["A".into()],
                operation: BulkOperation::EnableVariants { variant_ids: vec![99] },
            })
            .await?;
        assert_eq!(missing.status, BulkStatus::Failed);

        assert_eq!(svc.list().await?.len(), 3);
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn publish_and_delete_forward_to_upstream() -> Result<(), anyhow::Error> {
        let (dir, coll) = temp_collection("bulk_publish").await?;
        let api = FakePrintify::with_products(&["A", "B"]);
        let svc = BulkService::new(coll, api.clone());

        let res = svc
            .execute(BulkRequest { product_ids: vec!["A".into(), "B".into()], operation: BulkOperation::Publish })
            .await?;
        assert_eq!(res.status, BulkStatus::Completed);
        assert_eq!(api.published.lock().unwrap().len(), 2);

        svc.execute(BulkRequest { product_ids: vec!["B".into()], operation: BulkOperation::Delete }).await?;
        assert!(!api.products.lock().unwrap().contains_key("B"));
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected_before_any_call() -> Result<(), anyhow::Error> {
        let (dir, coll) = temp_collection("bulk_invalid").await?;
        let api = FakePrintify::with_products(&["A"]);
        let svc = BulkService::new(coll.clone(), api.clone());

        let cases = vec![
            BulkRequest { product_ids: vec![], operation: BulkOperation::Publish },
            BulkRequest { product_ids: vec![" ".into()], operation: BulkOperation::Publish },
            BulkRequest {
                product_ids: vec!["A".into(), "x/../../../../v1/shops/999/products/victim".into()],
                operation: BulkOperation::Delete,
            },
            BulkRequest { product_ids: vec!["A?force=1".into()], operation: BulkOperation::Publish },
            BulkRequest { product_ids: vec!["A".into()], operation: BulkOperation::UpdatePrice { price: 0, variant_ids: None } },
            BulkRequest { product_ids: vec!["A".into()], operation: BulkOperation::UpdateSku { sku_prefix: "".into(), variant_ids: None } },
            BulkRequest { product_ids: vec!["A".into()], operation: BulkOperation::EnableVariants { variant_ids: vec![] } },
        ];
        for req in cases {
            assert!(matches!(svc.execute(req).await, Err(ServiceError::Validation(_))));
        }
        assert!(api.calls.lock().unwrap().is_empty());
        assert_eq!(coll.len().await, 0);
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[test]
    fn operation_wire_format() {
        let op: BulkOperation = serde_json::from_value(json!({"type": "update_price", "price": 1500})).unwrap();
        assert_eq!(op, BulkOperation::UpdatePrice { price: 1500, variant_ids: None });
        assert!(serde_json::from_value::<BulkOperation>(json!({"type": "explode"})).is_err());
    }
}
