//! Fulfillment tracking per order, fed manually or by upstream webhooks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::errors::ServiceError;
use crate::storage::{from_document, to_document, DocumentStore};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    Pending,
    OnHold,
    SendingToProduction,
    InProduction,
    Shipped,
    Delivered,
    Canceled,
    Failed,
}

impl FulfillmentStatus {
    /// Map an upstream order status (kebab-case) onto our status set.
    pub fn from_upstream(status: &str) -> Option<Self> {
        Some(match status {
            "pending" => Self::Pending,
            "on-hold" | "payment-not-received" => Self::OnHold,
            "sending-to-production" => Self::SendingToProduction,
            "in-production" => Self::InProduction,
            "partially-fulfilled" => Self::Shipped,
            "fulfilled" => Self::Delivered,
            "canceled" | "cancelled" => Self::Canceled,
            "has-issues" => Self::Failed,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    #[default]
    Manual,
    Webhook,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrackingEvent {
    pub status: FulfillmentStatus,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default = "Utc::now")]
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub source: EventSource,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrackingRecord {
    pub order_id: String,
    pub current_status: FulfillmentStatus,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub events: Vec<TrackingEvent>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    Recorded { order_id: String, status: FulfillmentStatus },
    Ignored { topic: String },
}

pub fn tracking_key(order_id: &str) -> String {
    format!("tracking-{order_id}")
}

pub struct TrackingService {
    store: Arc<dyn DocumentStore>,
    // serializes read-modify-write of a record's event list
    write_lock: Mutex<()>,
}

impl TrackingService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, write_lock: Mutex::new(()) }
    }

    pub async fn get(&self, order_id: &str) -> Result<Option<TrackingRecord>, ServiceError> {
        self.store.find_by_id(&tracking_key(order_id)).await.map(from_document).transpose()
    }

    /// Append an event and refresh the derived shipment fields.
    pub async fn record_event(&self, order_id: &str, event: TrackingEvent) -> Result<TrackingRecord, ServiceError> {
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(ServiceError::Validation("order_id is required".into()));
        }
        if let Some(url) = &event.tracking_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ServiceError::Validation("tracking_url must start with http(s)".into()));
            }
        }

        let _guard = self.write_lock.lock().await;
        let now = Utc::now();
        let mut record = match self.get(order_id).await? {
            Some(r) => r,
            None => TrackingRecord {
                order_id: order_id.to_string(),
                current_status: event.status,
                carrier: None,
                tracking_number: None,
                tracking_url: None,
                events: Vec::new(),
                created_at: now,
                updated_at: now,
            },
        };

        if event.carrier.is_some() {
            record.carrier = event.carrier.clone();
        }
        if event.tracking_number.is_some() {
            record.tracking_number = event.tracking_number.clone();
        }
        if event.tracking_url.is_some() {
            record.tracking_url = event.tracking_url.clone();
        }
        record.events.push(event);
        record.events.sort_by_key(|e| e.occurred_at);
        if let Some(latest) = record.events.last() {
            record.current_status = latest.status;
        }
        record.updated_at = now;

        self.store.create(&tracking_key(order_id), to_document(&record)?).await?;
        info!(order_id, status = ?record.current_status, events = record.events.len(), "tracking event recorded");
        Ok(record)
    }

    /// Translate an upstream webhook payload into a tracking event.
    /// Topics that carry no fulfillment information are acknowledged and ignored.
    pub async fn ingest_webhook(&self, payload: &Value) -> Result<WebhookOutcome, ServiceError> {
        let topic = payload
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ServiceError::Validation("webhook payload has no type".into()))?;
        let resource = payload.get("resource").unwrap_or(&Value::Null);
        let data = resource.get("data").unwrap_or(&Value::Null);

        let status = match topic {
            "order:created" => Some(FulfillmentStatus::Pending),
            "order:updated" => data.get("status").and_then(Value::as_str).and_then(FulfillmentStatus::from_upstream),
            "order:sent-to-production" => Some(FulfillmentStatus::SendingToProduction),
            "order:shipment:created" => Some(FulfillmentStatus::Shipped),
            "order:shipment:delivered" => Some(FulfillmentStatus::Delivered),
            _ => None,
        };
        let Some(status) = status else {
            debug!(topic, "webhook ignored");
            return Ok(WebhookOutcome::Ignored { topic: topic.to_string() });
        };

        let order_id = match resource.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(ServiceError::Validation("webhook resource has no id".into())),
        };
        let carrier = data.get("carrier").unwrap_or(&Value::Null);
        let text = |v: &Value, k: &str| v.get(k).and_then(Value::as_str).map(str::to_string);
        let occurred_at = payload
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let event = TrackingEvent {
            status,
            carrier: text(carrier, "code"),
            tracking_number: text(carrier, "tracking_number"),
            tracking_url: text(carrier, "tracking_url"),
            note: Some(format!("webhook {topic}")),
            occurred_at,
            source: EventSource::Webhook,
        };
        self.record_event(&order_id, event).await?;
        Ok(WebhookOutcome::Recorded { order_id, status })
    }
}
