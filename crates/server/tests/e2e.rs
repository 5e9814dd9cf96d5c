use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use configs::AppConfig;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use server::{routes, startup};

fn cors() -> CorsLayer { CorsLayer::very_permissive() }

struct TestApp {
    base_url: String,
    data_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

/// Stand-in for the print provider: product `A` exists, everything else is 404.
async fn spawn_upstream() -> anyhow::Result<String> {
    fn not_found() -> (StatusCode, Json<Value>) {
        (StatusCode::NOT_FOUND, Json(json!({"status": "error", "message": "Product not found"})))
    }
    async fn product(Path((_shop, id)): Path<(String, String)>) -> (StatusCode, Json<Value>) {
        if id != "A.json" {
            return not_found();
        }
        (
            StatusCode::OK,
            Json(json!({
                "id": "A",
                "title": "Tee",
                "variants": [{"id": 1, "price": 2000}],
                "images": [{"src": "https://img.example/a.png", "variant_ids": [1], "position": "front", "is_default": true}]
            })),
        )
    }
    async fn publish(Path((_shop, id)): Path<(String, String)>) -> (StatusCode, Json<Value>) {
        if id != "A" {
            return not_found();
        }
        (StatusCode::OK, Json(json!({})))
    }
    async fn submit_order(Json(body): Json<Value>) -> Json<Value> {
        Json(json!({"id": "order-1", "external_id": body["external_id"]}))
    }

    let app = Router::new()
        .route("/shops/:shop/products/:id", get(product))
        .route("/shops/:shop/products/:id/publish.json", post(publish))
        .route("/shops/:shop/orders.json", post(submit_order));
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("upstream error: {}", e); }
    });
    Ok(format!("http://{}", addr))
}

fn config(data_dir: &PathBuf, upstream: &str, with_credentials: bool) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.storage.data_dir = data_dir.to_string_lossy().into_owned();
    cfg.printify.base_url = upstream.to_string();
    if with_credentials {
        cfg.printify.api_token = Some("test-token".into());
        cfg.printify.shop_id = Some("77".into());
    }
    cfg
}

async fn start_server_in(data_dir: PathBuf, with_credentials: bool) -> anyhow::Result<TestApp> {
    let upstream = spawn_upstream().await?;
    let state = startup::build_state(&config(&data_dir, &upstream, with_credentials)).await?;

    let app: Router = routes::build_router(state, cors());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url, data_dir })
}

async fn start_server(with_credentials: bool) -> anyhow::Result<TestApp> {
    let data_dir = std::env::temp_dir().join(format!("storefront_e2e_{}", Uuid::new_v4()));
    start_server_in(data_dir, with_credentials).await
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn e2e_public_endpoints() -> anyhow::Result<()> {
    let app = start_server(true).await?;
    let res = client().get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.json::<Value>().await?["status"], "ok");

    let res = client().get(format!("{}/metrics", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let doc: Value = client().get(format!("{}/api-docs/openapi.json", app.base_url)).send().await?.json().await?;
    assert!(doc["paths"]["/api/bulk"].is_object());

    let res = client().get(format!("{}/nope", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    assert!(res.json::<Value>().await?["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn e2e_gpsr_lifecycle() -> anyhow::Result<()> {
    let app = start_server(true).await?;
    let url = format!("{}/api/compliance/p1", app.base_url);

    let report: Value = client().get(&url).send().await?.json().await?;
    assert_eq!(report["compliance_status"], "INCOMPLETE");
    assert_eq!(report["missing_fields"], json!(["manufacturer_name"]));
    assert!(report["record"].is_null());

    let res = client()
        .put(&url)
        .json(&json!({"manufacturer_name": "Acme GmbH", "manufacturer_email": "ops@acme.example"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let report: Value = client().get(&url).send().await?.json().await?;
    assert_eq!(report["compliance_status"], "COMPLETE");
    assert_eq!(report["record"]["manufacturer_name"], "Acme GmbH");
    assert!(report["recommended_missing"].as_array().map_or(false, |a| a.len() == 3));

    let patched: Value = client()
        .patch(&url)
        .json(&json!({"safety_information": "Keep away from fire"}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(patched["safety_information"], "Keep away from fire");
    assert_eq!(patched["manufacturer_name"], "Acme GmbH");

    let wrong_type = client().patch(&url).json(&json!({"manufacturer_name": 5})).send().await?;
    assert_eq!(wrong_type.status(), HttpStatusCode::BAD_REQUEST);
    let report: Value = client().get(&url).send().await?.json().await?;
    assert_eq!(report["compliance_status"], "COMPLETE");
    assert_eq!(report["record"]["manufacturer_name"], "Acme GmbH");

    let bad = client().put(&url).json(&json!({"manufacturer_email": "nope"})).send().await?;
    assert_eq!(bad.status(), HttpStatusCode::BAD_REQUEST);

    assert_eq!(client().delete(&url).send().await?.status(), HttpStatusCode::NO_CONTENT);
    assert_eq!(client().delete(&url).send().await?.status(), HttpStatusCode::NOT_FOUND);
    let res = client().patch(&url).json(&json!({"eu_representative": "x"})).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn e2e_records_survive_restart() -> anyhow::Result<()> {
    let data_dir = std::env::temp_dir().join(format!("storefront_e2e_{}", Uuid::new_v4()));
    let first = start_server_in(data_dir.clone(), true).await?;
    client()
        .put(format!("{}/api/compliance/p9", first.base_url))
        .json(&json!({"manufacturer_name": "Acme"}))
        .send()
        .await?
        .error_for_status()?;
    assert!(data_dir.join("gpsr.json").exists());

    let second = start_server_in(data_dir.clone(), true).await?;
    let report: Value = client().get(format!("{}/api/compliance/p9", second.base_url)).send().await?.json().await?;
    assert_eq!(report["compliance_status"], "COMPLETE");
    drop(second);
    drop(first);
    Ok(())
}

#[tokio::test]
async fn e2e_bulk_partial_failure() -> anyhow::Result<()> {
    let app = start_server(true).await?;
    let res = client()
        .post(format!("{}/api/bulk", app.base_url))
        .json(&json!({"product_ids": ["A", "B"], "operation": {"type": "publish"}}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let result: Value = res.json().await?;
    assert_eq!(result["status"], "partially_failed");
    assert_eq!(result["total_items"], 2);
    assert_eq!(result["successful_items"], 1);
    assert_eq!(result["failed_items"], 1);
    assert_eq!(result["succeeded"], json!(["A"]));
    assert_eq!(result["errors"][0]["product_id"], "B");

    let id = result["id"].as_str().unwrap_or_default();
    let stored: Value = client().get(format!("{}/api/bulk/{}", app.base_url, id)).send().await?.json().await?;
    assert_eq!(stored["status"], "partially_failed");

    let listed: Value = client().get(format!("{}/api/bulk", app.base_url)).send().await?.json().await?;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let missing = client().get(format!("{}/api/bulk/bulk-unknown", app.base_url)).send().await?;
    assert_eq!(missing.status(), HttpStatusCode::NOT_FOUND);

    let empty = client()
        .post(format!("{}/api/bulk", app.base_url))
        .json(&json!({"product_ids": [], "operation": {"type": "publish"}}))
        .send()
        .await?;
    assert_eq!(empty.status(), HttpStatusCode::BAD_REQUEST);

    let escaping = client()
        .post(format!("{}/api/bulk", app.base_url))
        .json(&json!({"product_ids": ["A", "../../shops/999/products/B"], "operation": {"type": "delete"}}))
        .send()
        .await?;
    assert_eq!(escaping.status(), HttpStatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn e2e_mockups_and_tracking() -> anyhow::Result<()> {
    let app = start_server(true).await?;
    let res = client()
        .post(format!("{}/api/mockups", app.base_url))
        .json(&json!({"product_id": "A"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let listed: Value = client().get(format!("{}/api/mockups/A", app.base_url)).send().await?.json().await?;
    assert_eq!(listed[0]["src"], "https://img.example/a.png");

    let upstream_missing = client()
        .post(format!("{}/api/mockups", app.base_url))
        .json(&json!({"product_id": "B"}))
        .send()
        .await?;
    assert_eq!(upstream_missing.status(), HttpStatusCode::BAD_GATEWAY);

    let hook = json!({
        "type": "order:shipment:created",
        "resource": {"id": "o-1", "data": {"carrier": {"code": "dhl", "tracking_number": "JD01"}}}
    });
    let res = client().post(format!("{}/api/webhooks/printify", app.base_url)).json(&hook).send().await?;
    assert_eq!(res.json::<Value>().await?["outcome"], "recorded");

    let record: Value = client().get(format!("{}/api/tracking/o-1", app.base_url)).send().await?.json().await?;
    assert_eq!(record["current_status"], "shipped");
    assert_eq!(record["tracking_number"], "JD01");

    let res = client()
        .post(format!("{}/api/tracking/o-1/events", app.base_url))
        .json(&json!({"status": "delivered"}))
        .send()
        .await?;
    assert_eq!(res.json::<Value>().await?["current_status"], "delivered");

    let none = client().get(format!("{}/api/tracking/o-2", app.base_url)).send().await?;
    assert_eq!(none.status(), HttpStatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn e2e_orders_and_shipping() -> anyhow::Result<()> {
    let app = start_server(true).await?;
    let order = json!({
        "external_id": "ext-9",
        "line_items": [{"product_id": "A", "variant_id": 1, "quantity": 1}],
        "address_to": {"first_name": "Ada", "last_name": "L", "country": "GB", "address1": "1 Main", "city": "London", "zip": "N1"}
    });
    let res = client().post(format!("{}/api/orders", app.base_url)).json(&order).send().await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    assert_eq!(res.json::<Value>().await?["external_id"], "ext-9");

    let quote: Value = client()
        .post(format!("{}/api/shipping/quote", app.base_url))
        .json(&json!({"country": "US", "items": [{"quantity": 2}]}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(quote["cost"], 475 + 240);
    assert_eq!(quote["region"], "US");

    let bad = client()
        .post(format!("{}/api/shipping/quote", app.base_url))
        .json(&json!({"country": "USA", "items": [{"quantity": 1}]}))
        .send()
        .await?;
    assert_eq!(bad.status(), HttpStatusCode::BAD_REQUEST);
    assert!(bad.json::<Value>().await?["error"].is_string());

    let malformed = client()
        .post(format!("{}/api/shipping/quote", app.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(malformed.status(), HttpStatusCode::BAD_REQUEST);
    assert!(malformed.json::<Value>().await?["error"].is_string());

    let opts: Value = client().get(format!("{}/api/shipping/options/br", app.base_url)).send().await?.json().await?;
    assert_eq!(opts.as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn e2e_missing_credentials_is_401() -> anyhow::Result<()> {
    let app = start_server(false).await?;
    let res = client().get(format!("{}/api/products", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);
    assert!(res.json::<Value>().await?["error"].as_str().map_or(false, |m| m.contains("not configured")));

    // local features keep working without upstream credentials
    let res = client().get(format!("{}/api/compliance/p1", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(())
}
