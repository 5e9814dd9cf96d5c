use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::{
    printify::{HttpPrintifyClient, PrintifyApi},
    runtime,
    storage::Stores,
};

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Open the collections and wire services into handler state.
pub async fn build_state(cfg: &AppConfig) -> Result<AppState, StartupError> {
    runtime::ensure_env(&cfg.storage.data_dir).await?;
    // 损坏的数据文件会在这里直接失败，不会以空集合启动
    let stores = Stores::open(&cfg.storage.data_dir).await?;

    if !cfg.printify.has_credentials() {
        warn!("printify credentials not configured; upstream routes will answer 401");
    }
    let api: Arc<dyn PrintifyApi> = Arc::new(HttpPrintifyClient::new(&cfg.printify)?);
    let state = AppState::new(stores, api, cfg);

    let interrupted = state.bulk.mark_interrupted().await?;
    if interrupted > 0 {
        warn!(interrupted, "bulk operations left running by a previous process marked interrupted");
    }
    Ok(state)
}

/// Public entry: build the app and run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg)?;
    info!(%addr, data_dir = %cfg.storage.data_dir, "starting storefront server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
