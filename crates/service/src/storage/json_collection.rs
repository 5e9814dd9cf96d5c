use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use tokio::{fs, sync::RwLock};
use tracing::{debug, error, info, instrument};

use common::metrics::{STORE_WRITES_TOTAL, STORE_WRITE_FAILURES_TOTAL};

use super::{Document, DocumentStore};
use crate::errors::ServiceError;

type DocMap = IndexMap<String, Document>;

/// JSON file-backed document collection.
///
/// Holds the whole collection in memory as an insertion-ordered map and
/// rewrites the backing file on every mutation. Writers are serialized by the
/// lock, which is held across mutate-and-persist; the in-memory map is only
/// replaced once the new file has been renamed into place.
pub struct JsonCollection {
    name: String,
    inner: RwLock<DocMap>,
    file_path: PathBuf,
}

impl JsonCollection {
    /// Load the collection from `path`. Creates the file with an empty object if missing.
    /// A file that exists but cannot be parsed is an error, never silently emptied.
    pub async fn open<P: Into<PathBuf>>(name: &str, path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(ServiceError::storage)?;
        }

        let map: DocMap = match fs::read(&file_path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => DocMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                error!(collection = name, path = %file_path.display(), error = %e, "collection file is corrupt");
                ServiceError::Storage(format!("collection {name} at {}: {e}", file_path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty = DocMap::new();
                write_atomic(&file_path, &empty).await?;
                empty
            }
            Err(e) => return Err(ServiceError::storage(e)),
        };

        info!(collection = name, documents = map.len(), path = %file_path.display(), "collection loaded");
        Ok(Arc::new(Self { name: name.to_string(), inner: RwLock::new(map), file_path }))
    }

    pub fn file_path(&self) -> &std::path::Path {
        &self.file_path
    }

    /// Run `f` against a copy of the map and persist the copy when `f`
    /// reports a change. Memory is swapped only after a successful write.
    async fn apply<R, F>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut DocMap) -> (R, bool),
    {
        let mut guard = self.inner.write().await;
        let mut next = guard.clone();
        let (out, changed) = f(&mut next);
        if changed {
            if let Err(e) = write_atomic(&self.file_path, &next).await {
                STORE_WRITE_FAILURES_TOTAL.with_label_values(&[self.name.as_str()]).inc();
                error!(collection = %self.name, error = %e, "collection write failed; in-memory state kept");
                return Err(e);
            }
            STORE_WRITES_TOTAL.with_label_values(&[self.name.as_str()]).inc();
            *guard = next;
        }
        Ok(out)
    }
}

async fn write_atomic(path: &std::path::Path, map: &DocMap) -> Result<(), ServiceError> {
    let data = serde_json::to_vec_pretty(map).map_err(ServiceError::storage)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, data).await.map_err(ServiceError::storage)?;
    fs::rename(&tmp, path).await.map_err(ServiceError::storage)?;
    Ok(())
}

#[async_trait]
impl DocumentStore for JsonCollection {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, doc), fields(collection = %self.name))]
    async fn create(&self, key: &str, mut doc: Document) -> Result<Document, ServiceError> {
        if key.trim().is_empty() {
            return Err(ServiceError::Validation("document key must not be empty".into()));
        }
        doc.insert("id".into(), Value::String(key.to_string()));
        let stored = self
            .apply(|map| {
                map.insert(key.to_string(), doc.clone());
                (doc, true)
            })
            .await?;
        debug!(key, "document stored");
        Ok(stored)
    }

    async fn find_by_id(&self, key: &str) -> Option<Document> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    async fn find_all(&self) -> Vec<Document> {
        let map = self.inner.read().await;
        map.values().cloned().collect()
    }

    async fn find_by_query(&self, predicate: &(dyn for<'a> Fn(&'a Document) -> bool + Send + Sync)) -> Vec<Document> {
        let map = self.inner.read().await;
        map.values().filter(|d| predicate(d)).cloned().collect()
    }

    #[instrument(skip(self, partial), fields(collection = %self.name))]
    async fn update(&self, key: &str, partial: Document) -> Result<Option<Document>, ServiceError> {
        self.apply(|map| match map.get_mut(key) {
            Some(existing) => {
                for (field, value) in partial {
                    if field != "id" {
                        existing.insert(field, value);
                    }
                }
                (Some(existing.clone()), true)
            }
            None => (None, false),
        })
        .await
    }

    #[instrument(skip(self), fields(collection = %self.name))]
    async fn delete(&self, key: &str) -> Result<bool, ServiceError> {
        self.apply(|map| {
            let existed = map.shift_remove(key).is_some();
            (existed, existed)
        })
        .await
    }

    async fn clear(&self) -> Result<(), ServiceError> {
        self.apply(|map| {
            map.clear();
            ((), true)
        })
        .await?;
        info!(collection = %self.name, "collection cleared");
        Ok(())
    }

    async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
