use tracing::warn;

use crate::domain::{RiskLevel, SignalOrigin, TradeAction, TradeSignal, Trend};

use super::{SignalEngine, SignalInput};

pub const TIMEFRAME: &str = "1-4 weeks";

#[derive(Debug, Clone)]
pub struct EcoSignalParams {
    /// Eco-score at or above which a token is "premium green".
    pub premium_tier: u8,
    /// Eco-score at or above which a token is "solid green".
    pub solid_tier: u8,
    pub premium_momentum_pct: f64,
    pub premium_dip_pct: f64,
    pub solid_overbought_pct: f64,
}

impl Default for EcoSignalParams {
    fn default() -> Self {
        Self {
            premium_tier: 90,
            solid_tier: 80,
            premium_momentum_pct: 5.0,
            premium_dip_pct: -10.0,
            solid_overbought_pct: 8.0,
        }
    }
}

/// Rule-table signal engine. Same inputs always give the same signal.
#[derive(Debug, Clone, Default)]
pub struct EcoSignalEngine {
    pub params: EcoSignalParams,
}

impl SignalEngine for EcoSignalEngine {
    fn name(&self) -> &'static str {
        "eco_signal"
    }

    fn evaluate(&self, input: &SignalInput<'_>) -> TradeSignal {
        if !input.price.is_finite() || !input.change_24h_pct.is_finite() {
            warn!(
                symbol = input.symbol,
                price = input.price,
                change = input.change_24h_pct,
                volume = input.volume_24h,
                "signal.unusable_inputs"
            );
            return offline_signal();
        }

        let p = &self.params;
        let score = input.eco_score;
        let change = input.change_24h_pct;

        let (action, confidence, carbon_benefit, reasoning) = if score >= p.premium_tier {
            if change > p.premium_momentum_pct {
                (
                    TradeAction::Buy,
                    85,
                    45,
                    format!("[HIGH_ECO_MOMENTUM] Strong uptrend on a top-tier carbon score ({score}). Green narrative is pulling in flows."),
                )
            } else if change < p.premium_dip_pct {
                (
                    TradeAction::Buy,
                    90,
                    50,
                    format!("[ECO_DIP_OPPORTUNITY] Oversold high-quality green asset. Carbon score {score} makes this an accumulation zone."),
                )
            } else {
                (
                    TradeAction::Hold,
                    75,
                    30,
                    format!("[GREEN_STABILITY] Premium eco-token consolidating. Carbon score {score} carries long-term value."),
                )
            }
        } else if score >= p.solid_tier {
            if change > p.solid_overbought_pct {
                (
                    TradeAction::Hold,
                    70,
                    25,
                    format!("[MODERATE_ECO_PUMP] Decent green credentials but overbought. Wait for a pullback on this score {score} asset."),
                )
            } else {
                (
                    TradeAction::Buy,
                    75,
                    35,
                    format!("[SOLID_GREEN_PLAY] Good carbon efficiency ({score}) at a reasonable entry."),
                )
            }
        } else {
            (
                TradeAction::Sell,
                80,
                -20,
                format!("[CARBON_WARNING] Low eco-score ({score}) means regulatory risk. Rotate to green alternatives."),
            )
        };

        TradeSignal {
            action,
            confidence,
            reasoning,
            carbon_benefit,
            timeframe: TIMEFRAME.to_string(),
            origin: SignalOrigin::RuleTable,
        }
    }
}

/// Placeholder returned when inputs can't be analysed.
pub fn offline_signal() -> TradeSignal {
    TradeSignal {
        action: TradeAction::Hold,
        confidence: 60,
        reasoning: "[AI_OFFLINE] Market analysis unavailable. Recommend manual eco-assessment.".to_string(),
        carbon_benefit: 20,
        timeframe: "Unknown".to_string(),
        origin: SignalOrigin::Offline,
    }
}

pub fn risk_level(confidence: u8) -> RiskLevel {
    if confidence > 80 {
        RiskLevel::Low
    } else if confidence > 60 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

pub fn trend(change_24h_pct: f64) -> Trend {
    if change_24h_pct > 0.0 {
        Trend::Up
    } else if change_24h_pct < 0.0 {
        Trend::Down
    } else {
        Trend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eco::eco_score;

    fn eval(score: u8, change: f64) -> TradeSignal {
        EcoSignalEngine::default().evaluate(&SignalInput {
            symbol: "TEST",
            price: 1.0,
            change_24h_pct: change,
            volume_24h: 1_000.0,
            eco_score: score,
        })
    }

    fn pair(score: u8, change: f64) -> (TradeAction, u8) {
        let s = eval(score, change);
        (s.action, s.confidence)
    }

    #[test]
    fn premium_tier_branches() {
        assert_eq!(pair(92, 5.7), (TradeAction::Buy, 85));
        assert_eq!(pair(92, -12.0), (TradeAction::Buy, 90));
        assert_eq!(pair(92, 0.0), (TradeAction::Hold, 75));
    }

    #[test]
    fn solid_tier_branches() {
        assert_eq!(pair(85, 9.0), (TradeAction::Hold, 70));
        assert_eq!(pair(85, 3.0), (TradeAction::Buy, 75));
        assert_eq!(pair(85, -30.0), (TradeAction::Buy, 75));
    }

    #[test]
    fn low_tier_always_sells() {
        for change in [-50.0, 0.0, 5.1, 50.0] {
            let s = eval(79, change);
            assert_eq!((s.action, s.confidence), (TradeAction::Sell, 80));
            assert_eq!(s.carbon_benefit, -20);
        }
    }

    #[test]
    fn boundaries_use_strict_comparisons() {
        // exactly +5% at tier 90 is not momentum
        assert_eq!(pair(90, 5.0), (TradeAction::Hold, 75));
        // exactly -10% at tier 90 is not a dip
        assert_eq!(pair(90, -10.0), (TradeAction::Hold, 75));
        // exactly +8% at tier 80 is not overbought
        assert_eq!(pair(80, 8.0), (TradeAction::Buy, 75));
        // tier edges
        assert_eq!(pair(89, 5.1), (TradeAction::Buy, 75));
        assert_eq!(pair(90, 5.1), (TradeAction::Buy, 85));
        assert_eq!(pair(80, 8.01), (TradeAction::Hold, 70));
        assert_eq!(pair(79, 3.0), (TradeAction::Sell, 80));
    }

    #[test]
    fn signals_are_deterministic() {
        for (score, change) in [(92, 5.7), (88, 1.0), (75, -3.0), (95, -11.0)] {
            assert_eq!(eval(score, change), eval(score, change));
        }
    }

    #[test]
    fn sol_end_to_end() {
        let s = EcoSignalEngine::default().evaluate(&SignalInput {
            symbol: "SOL",
            price: 95.32,
            change_24h_pct: 5.7,
            volume_24h: 2_500_000.0,
            eco_score: eco_score("SOL"),
        });
        assert_eq!(s.action, TradeAction::Buy);
        assert_eq!(s.confidence, 85);
        assert_eq!(s.carbon_benefit, 45);
        assert_eq!(s.timeframe, TIMEFRAME);
        assert!(s.reasoning.starts_with("[HIGH_ECO_MOMENTUM]"));
        assert_eq!(s.origin, SignalOrigin::RuleTable);
    }

    #[test]
    fn unknown_symbol_end_to_end() {
        let score = eco_score("XYZ");
        assert_eq!(score, 75);
        for change in [-20.0, 0.0, 12.5] {
            assert_eq!(pair(score, change), (TradeAction::Sell, 80));
        }
    }

    #[test]
    fn unusable_inputs_go_offline() {
        let s = eval(92, f64::NAN);
        assert_eq!(s, offline_signal());
        assert_eq!((s.action, s.confidence), (TradeAction::Hold, 60));
        assert_eq!(s.timeframe, "Unknown");
        assert_eq!(s.origin, SignalOrigin::Offline);
    }

    #[test]
    fn risk_and_trend_derivation() {
        assert_eq!(risk_level(85), RiskLevel::Low);
        assert_eq!(risk_level(80), RiskLevel::Medium);
        assert_eq!(risk_level(70), RiskLevel::Medium);
        assert_eq!(risk_level(60), RiskLevel::High);
        assert_eq!(trend(0.1), Trend::Up);
        assert_eq!(trend(-0.1), Trend::Down);
        assert_eq!(trend(0.0), Trend::Stable);
    }
}
