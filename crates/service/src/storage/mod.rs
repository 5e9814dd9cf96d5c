//! Storage abstractions for service layer
//!
//! Documents are JSON objects keyed by string id. Each logical dataset lives
//! in its own collection persisted as one JSON file under the data directory.

pub mod json_collection;

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::errors::ServiceError;
pub use json_collection::JsonCollection;

/// A stored record. The `id` field always equals the key it is stored under.
pub type Document = Map<String, Value>;

/// Trait abstraction for a named document collection.
/// Implementations can be file-backed, database-backed, or remote KV.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &str;
    /// Insert or overwrite the document at `key`, forcing its `id` to `key`.
    async fn create(&self, key: &str, doc: Document) -> Result<Document, ServiceError>;
    async fn find_by_id(&self, key: &str) -> Option<Document>;
    /// All documents in insertion order.
    async fn find_all(&self) -> Vec<Document>;
    async fn find_by_query(&self, predicate: &(dyn for<'a> Fn(&'a Document) -> bool + Send + Sync)) -> Vec<Document>;
    /// Shallow-merge `partial` onto an existing document; `None` if absent.
    async fn update(&self, key: &str, partial: Document) -> Result<Option<Document>, ServiceError>;
    async fn delete(&self, key: &str) -> Result<bool, ServiceError>;
    async fn clear(&self) -> Result<(), ServiceError>;
    async fn len(&self) -> usize;
}

/// Serialize a typed record into a document. Non-object values are rejected.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, ServiceError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(ServiceError::Internal(format!("expected JSON object, got {other}"))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, ServiceError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// The collections opened once per process and shared by all handlers.
#[derive(Clone)]
pub struct Stores {
    pub compliance: Arc<dyn DocumentStore>,
    pub mockups: Arc<dyn DocumentStore>,
    pub tracking: Arc<dyn DocumentStore>,
    pub bulk_operations: Arc<dyn DocumentStore>,
}

impl Stores {
    pub const COMPLIANCE: &'static str = "gpsr";
    pub const MOCKUPS: &'static str = "mockups";
    pub const TRACKING: &'static str = "tracking";
    pub const BULK_OPERATIONS: &'static str = "bulk_operations";

    /// Open (or create) every collection under `data_dir`.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let dir = data_dir.as_ref();
        let open = |name: &'static str| JsonCollection::open(name, dir.join(format!("{name}.json")));
        Ok(Self {
            compliance: open(Self::COMPLIANCE).await?,
            mockups: open(Self::MOCKUPS).await?,
            tracking: open(Self::TRACKING).await?,
            bulk_operations: open(Self::BULK_OPERATIONS).await?,
        })
    }
}
