#![cfg(test)]
use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::printify::PrintifyApi;
use crate::storage::{JsonCollection, Stores};

/// Unique scratch directory per test; callers remove it when done.
pub fn temp_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("svc_{tag}_{}", uuid::Uuid::new_v4()))
}

pub async fn temp_stores(tag: &str) -> Result<(PathBuf, Stores), anyhow::Error> {
    let dir = temp_dir(tag);
    let stores = Stores::open(&dir).await?;
    Ok((dir, stores))
}

pub async fn temp_collection(tag: &str) -> Result<(PathBuf, Arc<JsonCollection>), anyhow::Error> {
    let dir = temp_dir(tag);
    let coll = JsonCollection::open(tag, dir.join(format!("{tag}.json"))).await?;
    Ok((dir, coll))
}

/// In-memory stand-in for the upstream API.
#[derive(Default)]
pub struct FakePrintify {
    pub products: Mutex<HashMap<String, Value>>,
    pub failing: Mutex<HashSet<String>>,
    pub published: Mutex<HashSet<String>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakePrintify {
    pub fn with_products(ids: &[&str]) -> Arc<Self> {
        let fake = Self::default();
        {
            let mut products = fake.products.lock().unwrap();
            for id in ids {
                products.insert((*id).to_string(), sample_product(id));
            }
        }
        Arc::new(fake)
    }

    pub fn fail_on(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, id: &str) -> Result<(), ServiceError> {
        if self.failing.lock().unwrap().contains(id) {
            return Err(ServiceError::Upstream(format!("product {id} rejected by upstream")));
        }
        if !self.products.lock().unwrap().contains_key(id) {
            return Err(ServiceError::Upstream(format!("returned 404 Not Found: product {id}")));
        }
        Ok(())
    }
}

pub fn sample_product(id: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Tee {id}"),
        "variants": [
            {"id": 1, "price": 2000, "sku": "OLD-1", "is_enabled": true},
            {"id": 2, "price": 2200, "sku": "OLD-2", "is_enabled": true}
        ],
        "images": [
            {"src": format!("https://img.example/{id}/front.png"), "variant_ids": [1, 2], "position": "front", "is_default": true},
            {"src": format!("https://img.example/{id}/back.png"), "variant_ids": [1], "position": "back", "is_default": false}
        ]
    })
}

#[async_trait]
impl PrintifyApi for FakePrintify {
    async fn list_shops(&self) -> Result<Value, ServiceError> {
        Ok(json!([{"id": 1, "title": "Fake shop"}]))
    }

    async fn list_products(&self, _page: Pagination) -> Result<Value, ServiceError> {
        let products: Vec<Value> = self.products.lock().unwrap().values().cloned().collect();
        Ok(json!({ "data": products }))
    }

    async fn get_product(&self, product_id: &str) -> Result<Value, ServiceError> {
        self.record(format!("get {product_id}"));
        self.check(product_id)?;
        Ok(self.products.lock().unwrap()[product_id].clone())
    }

    async fn create_product(&self, body: &Value) -> Result<Value, ServiceError> {
        let mut created = body.clone();
        created["id"] = json!("new-product");
        Ok(created)
    }

    async fn update_product(&self, product_id: &str, body: &Value) -> Result<Value, ServiceError> {
        self.record(format!("update {product_id}"));
        self.check(product_id)?;
        let mut products = self.products.lock().unwrap();
        let product = products.get_mut(product_id).expect("checked above");
        if let (Some(target), Some(patch)) = (product.as_object_mut(), body.as_object()) {
            for (k, v) in patch {
                target.insert(k.clone(), v.clone());
            }
        }
        Ok(product.clone())
    }

    async fn delete_product(&self, product_id: &str) -> Result<(), ServiceError> {
        self.record(format!("delete {product_id}"));
        self.check(product_id)?;
        self.products.lock().unwrap().remove(product_id);
        Ok(())
    }

    async fn publish_product(&self, product_id: &str) -> Result<(), ServiceError> {
        self.record(format!("publish {product_id}"));
        self.check(product_id)?;
        self.published.lock().unwrap().insert(product_id.to_string());
        Ok(())
    }

    async fn unpublish_product(&self, product_id: &str) -> Result<(), ServiceError> {
        self.record(format!("unpublish {product_id}"));
        self.check(product_id)?;
        self.published.lock().unwrap().remove(product_id);
        Ok(())
    }

    async fn list_orders(&self, _page: Pagination) -> Result<Value, ServiceError> {
        Ok(json!({ "data": [] }))
    }

    async fn get_order(&self, order_id: &str) -> Result<Value, ServiceError> {
        Ok(json!({ "id": order_id, "status": "pending" }))
    }

    async fn submit_order(&self, body: &Value) -> Result<Value, ServiceError> {
        Ok(json!({ "id": "order-1", "external_id": body["external_id"].clone() }))
    }

    async fn cancel_order(&self, order_id: &str) -> Result<Value, ServiceError> {
        Ok(json!({ "id": order_id, "status": "canceled" }))
    }

    async fn list_blueprints(&self) -> Result<Value, ServiceError> {
        Ok(json!([]))
    }

    async fn list_print_providers(&self, _blueprint_id: u64) -> Result<Value, ServiceError> {
        Ok(json!([]))
    }

    async fn upload_image(&self, file_name: &str, url: &str) -> Result<Value, ServiceError> {
        Ok(json!({ "id": "upload-1", "file_name": file_name, "preview_url": url }))
    }

    async fn list_webhooks(&self) -> Result<Value, ServiceError> {
        Ok(json!([]))
    }

    async fn create_webhook(&self, topic: &str, url: &str) -> Result<Value, ServiceError> {
        Ok(json!({ "id": "hook-1", "topic": topic, "url": url }))
    }
}
