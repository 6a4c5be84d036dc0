use std::sync::Arc;

use anyhow::Result;
use greendao_engine::config::Config;
use greendao_engine::{logger, scanner, Dashboard};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load local .env if present (no-op when the environment is already set)
    let _ = dotenvy::dotenv();

    logger::init_tracing();

    let cfg = Config::from_env()?;
    info!(?cfg, "boot");

    let dashboard = Arc::new(Dashboard::from_config(cfg)?);
    dashboard.init().await;

    let result = scanner::run(Arc::clone(&dashboard)).await;
    dashboard.shutdown().await;
    result
}
