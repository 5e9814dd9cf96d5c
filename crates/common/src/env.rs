//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::{info, warn};

/// Ensure the data directory exists and is writable.
pub async fn ensure_data_dir(data_dir: &str) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
    let meta = tokio::fs::metadata(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot stat {data_dir}: {e}"))?;
    if meta.permissions().readonly() {
        warn!(%data_dir, "data directory is read-only; every store mutation will fail");
    } else {
        info!(%data_dir, "data directory ready");
    }
    Ok(())
}
