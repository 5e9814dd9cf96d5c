use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static STORE_WRITES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "storefront_store_writes_total",
        "Successful collection writes to disk",
        &["collection"]
    )
    .expect("register store_writes_total")
});

pub static STORE_WRITE_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "storefront_store_write_failures_total",
        "Collection writes that failed and were rejected",
        &["collection"]
    )
    .expect("register store_write_failures_total")
});

pub static UPSTREAM_REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "storefront_upstream_requests_total",
        "Total requests sent to the print-on-demand API"
    )
    .expect("register upstream_requests_total")
});

pub static UPSTREAM_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "storefront_upstream_errors_total",
        "Upstream requests that failed or returned non-2xx"
    )
    .expect("register upstream_errors_total")
});

pub static BULK_ITEMS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "storefront_bulk_items_total",
        "Bulk operation items processed, by outcome",
        &["outcome"]
    )
    .expect("register bulk_items_total")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
