//! Static eco tables keyed by base symbol (`SOL`, `ETH`, ...).
//!
//! Everything here is a pure lookup. Unknown symbols fall back to documented
//! defaults rather than failing.

pub const DEFAULT_ECO_SCORE: u8 = 75;
pub const DEFAULT_ECO_IMPACT: &str = "Standard blockchain efficiency";
pub const DEFAULT_SUPPLY: f64 = 1_000_000_000.0;

pub const UNKNOWN_ENERGY: &str = "N/A";

pub fn eco_score(symbol: &str) -> u8 {
    match symbol {
        "SOL" => 92,
        "ETH" => 88,
        "ADA" => 95,
        "DOT" => 89,
        "ALGO" => 94,
        "MATIC" => 85,
        "BTC" => 23,
        _ => DEFAULT_ECO_SCORE,
    }
}

pub fn eco_impact(symbol: &str) -> &'static str {
    match symbol {
        "SOL" => "99.9% less energy than Bitcoin",
        "ETH" => "99.95% reduction post-merge",
        "ADA" => "Research-driven sustainability",
        "DOT" => "Efficient nominated PoS",
        "ALGO" => "Carbon negative blockchain",
        "MATIC" => "Layer 2 scaling efficiency",
        _ => DEFAULT_ECO_IMPACT,
    }
}

pub fn energy_per_tx(symbol: &str) -> &'static str {
    match symbol {
        "SOL" => "0.00051 kWh/tx",
        "ETH" => "0.0026 kWh/tx",
        "ADA" => "0.0017 kWh/tx",
        "DOT" => "0.0021 kWh/tx",
        "ALGO" => "0.0008 kWh/tx",
        "MATIC" => "0.0079 kWh/tx",
        _ => UNKNOWN_ENERGY,
    }
}

/// Human name, or the symbol itself when we don't know it.
pub fn token_name(symbol: &str) -> String {
    let name = match symbol {
        "SOL" => "Solana",
        "ETH" => "Ethereum",
        "ADA" => "Cardano",
        "DOT" => "Polkadot",
        "ALGO" => "Algorand",
        "MATIC" => "Polygon",
        "BTC" => "Bitcoin",
        other => other,
    };
    name.to_string()
}

fn circulating_supply(symbol: &str) -> f64 {
    match symbol {
        "SOL" => 471_000_000.0,
        "ETH" => 120_000_000.0,
        "ADA" => 35_000_000_000.0,
        "DOT" => 1_400_000_000.0,
        "ALGO" => 10_000_000_000.0,
        "MATIC" => 10_000_000_000.0,
        _ => DEFAULT_SUPPLY,
    }
}

/// Rough market cap in billions of quote units.
pub fn market_cap_billions(symbol: &str, price: f64) -> f64 {
    price * circulating_supply(symbol) / 1_000_000_000.0
}

pub fn grade(score: u8) -> &'static str {
    match score {
        90.. => "EXCELLENT",
        80..=89 => "GOOD",
        70..=79 => "FAIR",
        _ => "POOR",
    }
}

/// `SOL-USDT` -> `SOL`.
pub fn base_symbol(inst_id: &str) -> &str {
    inst_id.split('-').next().unwrap_or(inst_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_scores_match_table() {
        assert_eq!(eco_score("SOL"), 92);
        assert_eq!(eco_score("ETH"), 88);
        assert_eq!(eco_score("ADA"), 95);
        assert_eq!(eco_score("DOT"), 89);
        assert_eq!(eco_score("ALGO"), 94);
        assert_eq!(eco_score("MATIC"), 85);
        assert_eq!(eco_score("BTC"), 23);
    }

    #[test]
    fn unknown_symbols_get_defaults() {
        for sym in ["XYZ", "", "sol", "DOGE"] {
            assert_eq!(eco_score(sym), DEFAULT_ECO_SCORE);
            assert_eq!(eco_impact(sym), DEFAULT_ECO_IMPACT);
        }
        assert_eq!(energy_per_tx("XYZ"), UNKNOWN_ENERGY);
        assert_eq!(token_name("XYZ"), "XYZ");
        // BTC is scored but has no impact blurb.
        assert_eq!(eco_impact("BTC"), DEFAULT_ECO_IMPACT);
    }

    #[test]
    fn grades_follow_tiers() {
        assert_eq!(grade(95), "EXCELLENT");
        assert_eq!(grade(90), "EXCELLENT");
        assert_eq!(grade(89), "GOOD");
        assert_eq!(grade(75), "FAIR");
        assert_eq!(grade(23), "POOR");
    }

    #[test]
    fn market_cap_uses_supply_table() {
        let cap = market_cap_billions("SOL", 100.0);
        assert!((cap - 47.1).abs() < 1e-9);
        let cap = market_cap_billions("XYZ", 2.0);
        assert!((cap - 2.0).abs() < 1e-9);
    }

    #[test]
    fn base_symbol_strips_quote() {
        assert_eq!(base_symbol("SOL-USDT"), "SOL");
        assert_eq!(base_symbol("ALGO"), "ALGO");
    }
}
