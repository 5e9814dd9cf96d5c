//! GPSR (General Product Safety Regulation) compliance records.
//!
//! One record per product, stored under `gpsr-<product_id>`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::info;

use crate::errors::ServiceError;
use crate::storage::{from_document, to_document, Document, DocumentStore};

/// Fields that must be present for a product to be sold in the EU.
pub const REQUIRED_FIELDS: &[&str] = &["manufacturer_name"];
/// Fields reported when absent, without affecting the status.
pub const RECOMMENDED_FIELDS: &[&str] = &[
    "manufacturer_address",
    "manufacturer_email",
    "eu_representative",
    "safety_information",
];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ComplianceRecord {
    pub product_id: String,
    #[serde(default)]
    pub manufacturer_name: Option<String>,
    #[serde(default)]
    pub manufacturer_address: Option<String>,
    #[serde(default)]
    pub manufacturer_email: Option<String>,
    #[serde(default)]
    pub eu_representative: Option<String>,
    #[serde(default)]
    pub safety_information: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request body for create/replace; the product id comes from the path.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ComplianceInput {
    pub manufacturer_name: Option<String>,
    pub manufacturer_address: Option<String>,
    pub manufacturer_email: Option<String>,
    pub eu_representative: Option<String>,
    pub safety_information: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Complete,
    Incomplete,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ComplianceReport {
    pub product_id: String,
    pub compliance_status: ComplianceStatus,
    pub missing_fields: Vec<String>,
    pub recommended_missing: Vec<String>,
    pub record: Option<ComplianceRecord>,
}

pub fn compliance_key(product_id: &str) -> String {
    format!("gpsr-{product_id}")
}

fn clean(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl ComplianceInput {
    fn into_record(self, product_id: &str) -> Result<ComplianceRecord, ServiceError> {
        let manufacturer_email = clean(self.manufacturer_email);
        if let Some(email) = &manufacturer_email {
            if !email.contains('@') {
                return Err(ServiceError::Validation("manufacturer_email is not a valid address".into()));
            }
        }
        Ok(ComplianceRecord {
            product_id: product_id.to_string(),
            manufacturer_name: clean(self.manufacturer_name),
            manufacturer_address: clean(self.manufacturer_address),
            manufacturer_email,
            eu_representative: clean(self.eu_representative),
            safety_information: clean(self.safety_information),
            warnings: self.warnings.into_iter().map(|w| w.trim().to_string()).filter(|w| !w.is_empty()).collect(),
            updated_at: Some(Utc::now()),
        })
    }
}

impl ComplianceRecord {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "manufacturer_name" => self.manufacturer_name.as_deref(),
            "manufacturer_address" => self.manufacturer_address.as_deref(),
            "manufacturer_email" => self.manufacturer_email.as_deref(),
            "eu_representative" => self.eu_representative.as_deref(),
            "safety_information" => self.safety_information.as_deref(),
            _ => None,
        }
    }

    fn absent(&self, fields: &[&str]) -> Vec<String> {
        fields
            .iter()
            .filter(|f| self.field(f).map_or(true, |v| v.trim().is_empty()))
            .map(|f| f.to_string())
            .collect()
    }
}

pub struct ComplianceService {
    store: Arc<dyn DocumentStore>,
    // serializes patch read-merge-write
    write_lock: Mutex<()>,
}

impl ComplianceService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self { Self { store, write_lock: Mutex::new(()) } }

    fn validate_product_id(product_id: &str) -> Result<(), ServiceError> {
        if product_id.trim().is_empty() {
            return Err(ServiceError::Validation("product_id is required".into()));
        }
        Ok(())
    }

    /// Create or replace the record for a product.
    pub async fn upsert(&self, product_id: &str, input: ComplianceInput) -> Result<ComplianceRecord, ServiceError> {
        Self::validate_product_id(product_id)?;
        let record = input.into_record(product_id)?;
        let _guard = self.write_lock.lock().await;
        let stored = self.store.create(&compliance_key(product_id), to_document(&record)?).await?;
        info!(product_id, "compliance record saved");
        from_document(stored)
    }

    /// Shallow-merge fields onto an existing record. The merged record is
    /// type-checked before anything is written.
    pub async fn patch(&self, product_id: &str, fields: Document) -> Result<ComplianceRecord, ServiceError> {
        Self::validate_product_id(product_id)?;
        let key = compliance_key(product_id);

        let _guard = self.write_lock.lock().await;
        let mut merged = self
            .store
            .find_by_id(&key)
            .await
            .ok_or_else(|| ServiceError::not_found("compliance record"))?;
        for (field, value) in fields {
            if field != "product_id" && field != "id" {
                merged.insert(field, value);
            }
        }
        let mut record: ComplianceRecord = serde_json::from_value(Value::Object(merged))
            .map_err(|e| ServiceError::Validation(format!("invalid compliance fields: {e}")))?;
        if let Some(email) = &record.manufacturer_email {
            if !email.contains('@') {
                return Err(ServiceError::Validation("manufacturer_email is not a valid address".into()));
            }
        }
        record.updated_at = Some(Utc::now());

        let stored = self.store.create(&key, to_document(&record)?).await?;
        info!(product_id, "compliance record patched");
        from_document(stored)
    }

    pub async fn get(&self, product_id: &str) -> Result<Option<ComplianceRecord>, ServiceError> {
        self.store
            .find_by_id(&compliance_key(product_id))
            .await
            .map(from_document)
            .transpose()
    }

    pub async fn status(&self, product_id: &str) -> Result<ComplianceReport, ServiceError> {
        Self::validate_product_id(product_id)?;
        let record = self.get(product_id).await?;
        let (missing_fields, recommended_missing) = match &record {
            Some(r) => (r.absent(REQUIRED_FIELDS), r.absent(RECOMMENDED_FIELDS)),
            None => (
                REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
                RECOMMENDED_FIELDS.iter().map(|f| f.to_string()).collect(),
            ),
        };
        let compliance_status = if record.is_some() && missing_fields.is_empty() {
            ComplianceStatus::Complete
        } else {
            ComplianceStatus::Incomplete
        };
        Ok(ComplianceReport {
            product_id: product_id.to_string(),
            compliance_status,
            missing_fields,
            recommended_missing,
            record,
        })
    }

    pub async fn delete(&self, product_id: &str) -> Result<bool, ServiceError> {
        self.store.delete(&compliance_key(product_id)).await
    }
}
