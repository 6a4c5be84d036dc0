use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Upper bound on a voting period; keeps deadline arithmetic in range.
pub const MAX_PROPOSAL_DAYS: i64 = 3650;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WalletMode {
    /// Keypair-backed local signer standing in for an injected browser wallet.
    Local,
    /// No wallet capability at all; every wallet action reports "wallet required".
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Market data
    pub okx_base_url: String,
    pub okx_proxy_url: Option<String>,
    pub use_proxy: bool,
    pub allow_list: Vec<String>,
    pub quote_symbol: String,
    pub refresh_interval_secs: u64,
    pub http_timeout_secs: u64,

    // Governance
    pub proposal_duration_days: i64,
    pub seed_proposals: bool,
    pub tz: String,

    // Wallet
    pub wallet_mode: WalletMode,
    pub sol_keypair_path: Option<String>,
    pub solana_rpc_url: String,
    pub rpc_balance: bool,

    // Alerts
    pub notify_webhook_url: Option<String>,
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().map(|s| s.trim().to_lowercase()) {
        None => default,
        Some(v) if v.is_empty() => default,
        Some(v) if v == "1" || v == "true" || v == "yes" || v == "y" || v == "on" => true,
        Some(v) if v == "0" || v == "false" || v == "no" || v == "n" || v == "off" => false,
        Some(_) => default,
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|x| x.trim().parse().ok())
}

fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_wallet_mode(raw: &str) -> Result<WalletMode> {
    match raw.trim().to_lowercase().as_str() {
        "" | "local" => Ok(WalletMode::Local),
        "none" | "off" => Ok(WalletMode::None),
        other => Err(anyhow!("unknown GREENDAO_WALLET mode: {other}")),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            okx_base_url: "https://www.okx.com/api/v5".to_string(),
            okx_proxy_url: None,
            use_proxy: false,
            allow_list: parse_symbol_list("SOL,ETH,ADA,DOT,ALGO,MATIC"),
            quote_symbol: "USDT".to_string(),
            refresh_interval_secs: 30,
            http_timeout_secs: 10,
            proposal_duration_days: 30,
            seed_proposals: true,
            tz: "UTC".to_string(),
            wallet_mode: WalletMode::Local,
            sol_keypair_path: None,
            solana_rpc_url: "https://api.devnet.solana.com".to_string(),
            rpc_balance: false,
            notify_webhook_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        // Market data
        let okx_base_url = std::env::var("OKX_BASE_URL").unwrap_or(defaults.okx_base_url);
        let okx_proxy_url = std::env::var("OKX_PROXY_URL").ok().filter(|s| !s.trim().is_empty());
        let use_proxy = env_bool("GREENDAO_USE_PROXY", false);
        let allow_list = std::env::var("GREENDAO_ALLOW_LIST")
            .map(|raw| parse_symbol_list(&raw))
            .unwrap_or(defaults.allow_list);
        let quote_symbol = std::env::var("GREENDAO_QUOTE")
            .map(|s| s.trim().to_uppercase())
            .unwrap_or(defaults.quote_symbol);
        let refresh_interval_secs =
            env_parse::<u64>("GREENDAO_REFRESH_SECS").unwrap_or(defaults.refresh_interval_secs);
        let http_timeout_secs =
            env_parse::<u64>("GREENDAO_HTTP_TIMEOUT_SECS").unwrap_or(defaults.http_timeout_secs);

        // Governance
        let proposal_duration_days =
            env_parse::<i64>("GREENDAO_PROPOSAL_DAYS").unwrap_or(defaults.proposal_duration_days);
        let seed_proposals = env_bool("GREENDAO_SEED_PROPOSALS", true);
        let tz = std::env::var("GREENDAO_TZ").unwrap_or(defaults.tz);

        // Wallet
        let wallet_mode = parse_wallet_mode(&std::env::var("GREENDAO_WALLET").unwrap_or_default())?;
        let sol_keypair_path = std::env::var("SOL_KEYPAIR_PATH").ok();
        let solana_rpc_url = std::env::var("SOLANA_RPC_URL").unwrap_or(defaults.solana_rpc_url);
        let rpc_balance = env_bool("GREENDAO_RPC_BALANCE", false);

        let notify_webhook_url = std::env::var("NOTIFY_WEBHOOK_URL").ok();

        let cfg = Self {
            okx_base_url,
            okx_proxy_url,
            use_proxy,
            allow_list,
            quote_symbol,
            refresh_interval_secs,
            http_timeout_secs,
            proposal_duration_days,
            seed_proposals,
            tz,
            wallet_mode,
            sol_keypair_path,
            solana_rpc_url,
            rpc_balance,
            notify_webhook_url,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_secs == 0 {
            return Err(anyhow!("GREENDAO_REFRESH_SECS must be > 0"));
        }
        if !(1..=MAX_PROPOSAL_DAYS).contains(&self.proposal_duration_days) {
            return Err(anyhow!(
                "GREENDAO_PROPOSAL_DAYS must be between 1 and {MAX_PROPOSAL_DAYS}"
            ));
        }
        if self.allow_list.is_empty() {
            return Err(anyhow!("GREENDAO_ALLOW_LIST cannot be empty"));
        }
        if self.use_proxy && self.okx_proxy_url.is_none() {
            return Err(anyhow!("GREENDAO_USE_PROXY requires OKX_PROXY_URL"));
        }
        self.tz
            .parse::<chrono_tz::Tz>()
            .map_err(|_| anyhow!("invalid GREENDAO_TZ: {}", self.tz))?;
        Ok(())
    }

    /// Instrument ids (e.g. `SOL-USDT`) for the configured allow-list.
    pub fn instrument_ids(&self) -> Vec<String> {
        self.allow_list
            .iter()
            .map(|s| format!("{s}-{}", self.quote_symbol))
            .collect()
    }

    /// Proxy to route market requests through, if enabled.
    pub fn active_proxy(&self) -> Option<&str> {
        if self.use_proxy {
            self.okx_proxy_url.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.refresh_interval_secs, 30);
        assert_eq!(cfg.proposal_duration_days, 30);
        assert_eq!(
            cfg.instrument_ids(),
            vec!["SOL-USDT", "ETH-USDT", "ADA-USDT", "DOT-USDT", "ALGO-USDT", "MATIC-USDT"]
        );
    }

    #[test]
    fn rejects_zero_refresh_and_bad_tz() {
        let cfg = Config { refresh_interval_secs: 0, ..Config::default() };
        assert!(cfg.validate().is_err());

        let cfg = Config { tz: "Mars/Olympus".into(), ..Config::default() };
        assert!(cfg.validate().is_err());

        let cfg = Config { proposal_duration_days: 0, ..Config::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn proposal_days_are_bounded() {
        let cfg = Config { proposal_duration_days: MAX_PROPOSAL_DAYS, ..Config::default() };
        assert!(cfg.validate().is_ok());

        for days in [MAX_PROPOSAL_DAYS + 1, 1_000_000_000, i64::MAX] {
            let cfg = Config { proposal_duration_days: days, ..Config::default() };
            assert!(cfg.validate().is_err(), "{days} days should be rejected");
        }
    }

    #[test]
    fn proxy_requires_url() {
        let cfg = Config { use_proxy: true, ..Config::default() };
        assert!(cfg.validate().is_err());

        let cfg = Config {
            use_proxy: true,
            okx_proxy_url: Some("https://api.allorigins.win/raw".into()),
            ..Config::default()
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.active_proxy(), Some("https://api.allorigins.win/raw"));
    }

    #[test]
    fn symbol_list_is_normalised() {
        assert_eq!(parse_symbol_list(" sol, eth ,,ada "), vec!["SOL", "ETH", "ADA"]);
        assert_eq!(parse_wallet_mode("NONE").ok(), Some(WalletMode::None));
        assert!(parse_wallet_mode("phantom").is_err());
    }
}
