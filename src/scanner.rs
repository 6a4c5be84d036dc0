use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::dashboard::Dashboard;
use crate::logger::heartbeat_line;

/// Poll market data until ctrl-c. Each cycle is tagged so a slow, older fetch
/// can never overwrite a newer board.
pub async fn run(dashboard: Arc<Dashboard>) -> Result<()> {
    let cfg = dashboard.config();
    info!(
        okx = %cfg.okx_base_url,
        proxy = cfg.active_proxy().unwrap_or(""),
        refresh_secs = cfg.refresh_interval_secs,
        allow_list = ?cfg.allow_list,
        "scanner.start"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(cfg.refresh_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let seq = dashboard.feed().begin_refresh();
                let d = Arc::clone(&dashboard);
                tokio::spawn(async move {
                    if d.refresh_market_tagged(seq).await {
                        log_board(&d).await;
                    }
                });

                let expired = dashboard.expire_due().await;
                info!(seq, expired, "scanner.heartbeat");
                debug!("{}", heartbeat_line(seq));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("scanner.stop");
                return Ok(());
            }
        }
    }
}

async fn log_board(dashboard: &Dashboard) {
    let Some(board) = dashboard.board().await else {
        return;
    };
    for row in &board.rows {
        info!(
            seq = board.seq,
            symbol = %row.symbol,
            price = row.price,
            change_pct = row.change_24h_pct,
            eco_score = row.eco_score,
            action = ?row.signal.action,
            confidence = row.signal.confidence,
            risk = ?row.risk,
            source = ?row.source,
            "scanner.signal"
        );
    }
    info!(
        seq = board.seq,
        total_value = board.metrics.total_value,
        carbon_offset = board.metrics.carbon_offset,
        "scanner.portfolio"
    );
}
