pub mod eco_signal;

use crate::domain::TradeSignal;

/// Inputs for one signal evaluation.
#[derive(Debug, Clone)]
pub struct SignalInput<'a> {
    pub symbol: &'a str,
    pub price: f64,
    pub change_24h_pct: f64,
    pub volume_24h: f64,
    pub eco_score: u8,
}

pub trait SignalEngine: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, input: &SignalInput<'_>) -> TradeSignal;
}
