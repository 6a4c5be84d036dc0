use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::{DataSource, EcoTokenView, PortfolioMetrics, TokenMarketSnapshot};
use crate::eco;
use crate::okx::{OkxTicker, TickerSource};
use crate::strategy::eco_signal::{risk_level, trend};
use crate::strategy::{SignalEngine, SignalInput};

/// Mock holdings per token used for the portfolio value.
const MOCK_HOLDING_UNITS: f64 = 100.0;

/// Fixed dataset served whenever live data is unavailable.
pub fn fallback_dataset() -> Vec<TokenMarketSnapshot> {
    let now = Utc::now();
    [
        ("SOL", 95.32, 5.7, 2_500_000.0, 98.50, 92.10),
        ("ETH", 2342.15, 3.2, 1_800_000.0, 2380.00, 2290.50),
        ("ADA", 0.89, -2.1, 950_000.0, 0.92, 0.86),
    ]
    .into_iter()
    .map(|(symbol, price, change, volume, high, low)| TokenMarketSnapshot {
        symbol: symbol.to_string(),
        inst_id: format!("{symbol}-USDT"),
        price,
        change_24h_pct: change,
        volume_24h: volume,
        high_24h: high,
        low_24h: low,
        timestamp: now,
        source: DataSource::Fallback,
    })
    .collect()
}

/// One published refresh cycle.
#[derive(Debug, Clone)]
pub struct Board {
    pub seq: u64,
    pub rows: Vec<EcoTokenView>,
    pub metrics: PortfolioMetrics,
}

pub struct MarketFeed {
    source: Arc<dyn TickerSource>,
    inst_ids: Vec<String>,
    /// Quote currency for single-token lookups, e.g. `USDT`.
    quote: String,
    next_seq: AtomicU64,
    board: RwLock<Option<Board>>,
}

impl MarketFeed {
    pub fn new(source: Arc<dyn TickerSource>, inst_ids: Vec<String>, quote: &str) -> Self {
        Self {
            source,
            inst_ids,
            quote: quote.to_uppercase(),
            next_seq: AtomicU64::new(0),
            board: RwLock::new(None),
        }
    }

    /// All spot tickers, or the fallback dataset if the fetch fails in any way.
    pub async fn market_tickers(&self) -> Vec<TokenMarketSnapshot> {
        match self.source.spot_tickers().await {
            Ok(raw) => {
                debug!(count = raw.len(), "feed.tickers");
                normalize(&raw, DataSource::Live)
            }
            Err(e) => {
                warn!(error = %e, "feed.fetch_failed, serving fallback");
                fallback_dataset()
            }
        }
    }

    /// Tickers restricted to the allow-list; never empty.
    pub async fn eco_friendly_tokens(&self) -> Vec<TokenMarketSnapshot> {
        let all = self.market_tickers().await;
        let picked: Vec<_> = all
            .into_iter()
            .filter(|s| self.inst_ids.iter().any(|id| id == &s.inst_id))
            .collect();
        if picked.is_empty() {
            warn!("feed.no_allow_listed_tokens, serving fallback");
            return fallback_dataset();
        }
        picked
    }

    /// Last price of `{symbol}-{quote}`, 0 when absent.
    pub async fn token_price(&self, symbol: &str) -> f64 {
        self.lookup(symbol).await.map(|s| s.price).unwrap_or(0.0)
    }

    /// 24h volume of `{symbol}-{quote}`, 0 when absent.
    pub async fn token_volume(&self, symbol: &str) -> f64 {
        self.lookup(symbol).await.map(|s| s.volume_24h).unwrap_or(0.0)
    }

    async fn lookup(&self, symbol: &str) -> Option<TokenMarketSnapshot> {
        let inst_id = format!("{}-{}", symbol.to_uppercase(), self.quote);
        let found = self
            .market_tickers()
            .await
            .into_iter()
            .find(|s| s.inst_id == inst_id);
        if found.is_none() {
            warn!(%inst_id, "feed.token_not_found");
        }
        found
    }

    /// Reserve a sequence number for a refresh about to start.
    pub fn begin_refresh(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Fetch, score and build the board for a refresh tagged `seq`.
    pub async fn build_board(&self, seq: u64, engine: &dyn SignalEngine) -> Board {
        let snapshots = self.eco_friendly_tokens().await;
        debug!(seq, engine = engine.name(), tokens = snapshots.len(), "feed.scoring");
        let rows: Vec<EcoTokenView> = snapshots.iter().map(|s| score_row(s, engine)).collect();
        let metrics = portfolio_metrics(&rows);
        Board { seq, rows, metrics }
    }

    /// Publish `board` unless a newer one is already in place. Returns whether it was applied.
    pub async fn publish(&self, board: Board) -> bool {
        let mut slot = self.board.write().await;
        if let Some(current) = slot.as_ref() {
            if current.seq >= board.seq {
                debug!(stale = board.seq, current = current.seq, "feed.discard_stale");
                return false;
            }
        }
        info!(seq = board.seq, rows = board.rows.len(), "feed.published");
        *slot = Some(board);
        true
    }

    /// Begin, build and publish in one go.
    pub async fn refresh(&self, engine: &dyn SignalEngine) -> bool {
        let seq = self.begin_refresh();
        let board = self.build_board(seq, engine).await;
        self.publish(board).await
    }

    pub async fn board(&self) -> Option<Board> {
        self.board.read().await.clone()
    }
}

/// Parse raw tickers, skipping malformed records.
pub fn normalize(raw: &[OkxTicker], source: DataSource) -> Vec<TokenMarketSnapshot> {
    raw.iter()
        .filter_map(|t| match t.to_snapshot(source) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(inst_id = %t.inst_id, error = %e, "feed.skip_malformed");
                None
            }
        })
        .collect()
}

pub fn score_row(snap: &TokenMarketSnapshot, engine: &dyn SignalEngine) -> EcoTokenView {
    let eco_score = eco::eco_score(&snap.symbol);
    let signal = engine.evaluate(&SignalInput {
        symbol: &snap.symbol,
        price: snap.price,
        change_24h_pct: snap.change_24h_pct,
        volume_24h: snap.volume_24h,
        eco_score,
    });
    EcoTokenView {
        symbol: snap.symbol.clone(),
        name: eco::token_name(&snap.symbol),
        price: snap.price,
        change_24h_pct: snap.change_24h_pct,
        volume_24h: snap.volume_24h,
        eco_score,
        grade: eco::grade(eco_score),
        eco_impact: eco::eco_impact(&snap.symbol),
        energy_per_tx: eco::energy_per_tx(&snap.symbol),
        market_cap_billions: eco::market_cap_billions(&snap.symbol, snap.price),
        trend: trend(snap.change_24h_pct),
        risk: risk_level(signal.confidence),
        signal,
        source: snap.source,
    }
}

pub fn portfolio_metrics(rows: &[EcoTokenView]) -> PortfolioMetrics {
    if rows.is_empty() {
        return PortfolioMetrics::default();
    }
    let total_value = rows.iter().map(|r| r.price * MOCK_HOLDING_UNITS).sum();
    let avg_score = rows.iter().map(|r| f64::from(r.eco_score)).sum::<f64>() / rows.len() as f64;
    PortfolioMetrics {
        total_value,
        carbon_offset: avg_score * 10.0,
    }
}
