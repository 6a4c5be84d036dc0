use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::domain::{DataSource, TokenMarketSnapshot};
use crate::eco::base_symbol;

/// Anything that can hand back a batch of spot tickers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TickerSource: Send + Sync {
    async fn spot_tickers(&self) -> Result<Vec<OkxTicker>>;
}

#[derive(Clone)]
pub struct OkxClient {
    base_url: String,
    proxy_url: Option<String>,
    http: Client,
}

impl OkxClient {
    pub fn new(base_url: String, proxy_url: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent("greendao_engine/0.1.0")
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            proxy_url,
            http,
        })
    }

    /// Tickers URL, wrapped in the proxy's `?url=` parameter when one is set.
    pub fn tickers_url(&self) -> Result<Url> {
        let target = format!("{}/market/tickers?instType=SPOT", self.base_url);
        match self.proxy_url.as_deref() {
            Some(proxy) => Ok(Url::parse_with_params(proxy, &[("url", target.as_str())])?),
            None => Ok(Url::parse(&target)?),
        }
    }
}

#[async_trait]
impl TickerSource for OkxClient {
    async fn spot_tickers(&self) -> Result<Vec<OkxTicker>> {
        let resp = self
            .http
            .get(self.tickers_url()?)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;
        let envelope: OkxEnvelope = resp.json().await?;
        envelope.into_tickers()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkxEnvelope {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Vec<OkxTicker>,
}

impl OkxEnvelope {
    pub fn into_tickers(self) -> Result<Vec<OkxTicker>> {
        if self.code != "0" {
            bail!("OKX API error (code {}): {}", self.code, self.msg);
        }
        Ok(self.data)
    }
}

/// Raw OKX ticker. OKX sends every number as a string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OkxTicker {
    #[serde(rename = "instId")]
    pub inst_id: String,
    pub last: String,
    /// Read as the 24h change percent.
    #[serde(rename = "sodUtc8")]
    pub sod_utc8: String,
    #[serde(rename = "vol24h")]
    pub vol_24h: String,
    #[serde(rename = "high24h", default)]
    pub high_24h: String,
    #[serde(rename = "low24h", default)]
    pub low_24h: String,
    #[serde(default)]
    pub ts: String,
}

fn parse_num(field: &str, raw: &str) -> Result<f64> {
    let v: f64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid {field}: {raw:?}"))?;
    if !v.is_finite() {
        bail!("non-finite {field}: {raw:?}");
    }
    Ok(v)
}

impl OkxTicker {
    pub fn to_snapshot(&self, source: DataSource) -> Result<TokenMarketSnapshot> {
        let price = parse_num("last", &self.last)?;
        let change_24h_pct = parse_num("sodUtc8", &self.sod_utc8)?;
        let volume_24h = parse_num("vol24h", &self.vol_24h)?;
        // high/low are informational; missing values collapse to the last price.
        let high_24h = parse_num("high24h", &self.high_24h).unwrap_or(price);
        let low_24h = parse_num("low24h", &self.low_24h).unwrap_or(price);
        let timestamp = self
            .ts
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(Utc::now);

        Ok(TokenMarketSnapshot {
            symbol: base_symbol(&self.inst_id).to_string(),
            inst_id: self.inst_id.clone(),
            price,
            change_24h_pct,
            volume_24h,
            high_24h,
            low_24h,
            timestamp,
            source,
        })
    }
}
