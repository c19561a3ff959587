//! Market data sources feeding the signal oracles (CoinGecko)

mod coingecko;

pub use coingecko::CoinGeckoFeed;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Trait for market data clients
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Get the source name
    fn name(&self) -> &'static str;

    /// Fetch current quotes for the given asset ids or tickers
    async fn quotes(&self, assets: &[String]) -> Result<Vec<MarketQuote>>;
}

/// Current market snapshot for one asset, priced in USD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    /// Canonical asset id (e.g. "bitcoin")
    pub asset: String,
    pub price: f64,
    /// 24h percent change
    pub change_24h: f64,
    pub volume_24h: f64,
    pub market_cap: f64,
}

/// Map common tickers to canonical asset ids; unknown symbols pass through lowercased
pub fn resolve_asset_id(symbol: &str) -> String {
    let symbol = symbol.trim().to_lowercase();
    match symbol.as_str() {
        "btc" => "bitcoin",
        "eth" => "ethereum",
        "ada" => "cardano",
        "sol" => "solana",
        "bnb" => "binancecoin",
        "xrp" => "ripple",
        "dot" => "polkadot",
        "doge" => "dogecoin",
        other => other,
    }
    .to_string()
}
