use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a market snapshot came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataSource {
    Live,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenMarketSnapshot {
    pub symbol: String,
    pub inst_id: String,
    pub price: f64,
    pub change_24h_pct: f64,
    pub volume_24h: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub timestamp: DateTime<Utc>,
    pub source: DataSource,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

/// How a signal was produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SignalOrigin {
    RuleTable,
    /// Inputs were unusable; the signal is a placeholder.
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeSignal {
    pub action: TradeAction,
    pub confidence: u8,
    pub reasoning: String,
    /// Estimated kg CO2, negative for carbon-heavy assets.
    pub carbon_benefit: i32,
    pub timeframe: String,
    pub origin: SignalOrigin,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// One display row: market data joined with the static eco tables and a signal.
#[derive(Debug, Clone, Serialize)]
pub struct EcoTokenView {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_24h_pct: f64,
    pub volume_24h: f64,
    pub eco_score: u8,
    pub grade: &'static str,
    pub eco_impact: &'static str,
    pub energy_per_tx: &'static str,
    pub market_cap_billions: f64,
    pub trend: Trend,
    pub risk: RiskLevel,
    pub signal: TradeSignal,
    pub source: DataSource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PortfolioMetrics {
    pub total_value: f64,
    pub carbon_offset: f64,
}
