//! CoinGecko REST client
//!
//! Polls the `/simple/price` endpoint for price, 24h change, volume and market cap.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::FeedConfig;
use crate::error::{OracleError, Result};
use crate::oracle::sources::{resolve_asset_id, MarketFeed, MarketQuote};

const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";
const SOURCE_NAME: &str = "coingecko";
const PRICE_QUERY: &str =
    "vs_currencies=usd&include_24hr_change=true&include_24hr_vol=true&include_market_cap=true";

#[derive(Debug, Clone, Deserialize)]
struct SimplePrice {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
    usd_24h_vol: Option<f64>,
    usd_market_cap: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CoinGeckoFeed {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoFeed {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| OracleError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &FeedConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    fn price_url(&self, ids: &[String]) -> String {
        let ids = ids.join(",");
        format!("{}/simple/price?ids={ids}&{PRICE_QUERY}", self.base_url)
    }

    fn parse_quotes(body: HashMap<String, SimplePrice>) -> Vec<MarketQuote> {
        let mut quotes: Vec<MarketQuote> = body
            .into_iter()
            .filter_map(|(asset, data)| {
                let price = data.usd?;
                Some(MarketQuote {
                    asset,
                    price,
                    change_24h: data.usd_24h_change.unwrap_or(0.0),
                    volume_24h: data.usd_24h_vol.unwrap_or(0.0),
                    market_cap: data.usd_market_cap.unwrap_or(0.0),
                })
            })
            .collect();
        quotes.sort_by(|a, b| a.asset.cmp(&b.asset));
        quotes
    }
}

impl Default for CoinGeckoFeed {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: COINGECKO_API_URL.to_string(),
        }
    }
}

#[async_trait]
impl MarketFeed for CoinGeckoFeed {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn quotes(&self, assets: &[String]) -> Result<Vec<MarketQuote>> {
        let ids: Vec<String> = assets.iter().map(|a| resolve_asset_id(a)).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.price_url(&ids);
        tracing::debug!(source = %SOURCE_NAME, assets = ?ids, "Fetching quotes");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OracleError::source_unavailable(SOURCE_NAME, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                source = %SOURCE_NAME,
                %status,
                body = %body,
                "Quote request rejected"
            );
            return Err(OracleError::source_unavailable(SOURCE_NAME, format!("HTTP {status}")));
        }

        let body: HashMap<String, SimplePrice> = response
            .json()
            .await
            .map_err(|e| OracleError::source_unavailable(SOURCE_NAME, e.to_string()))?;

        Ok(Self::parse_quotes(body))
    }
}
