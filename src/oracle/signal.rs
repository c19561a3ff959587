//! Signal oracles - raw price and volume observations
//!
//! Both oracles poll a [`MarketFeed`] and degrade to a single low-confidence
//! fallback signal when the feed is unavailable, so the signal phase never aborts.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::oracle::sources::MarketFeed;
use crate::oracle::Oracle;
use crate::types::{OracleRole, Signal, SignalPayload};

const PRICE_CONFIDENCE: f64 = 0.9;
const PRICE_FALLBACK_CONFIDENCE: f64 = 0.3;
const VOLUME_CONFIDENCE: f64 = 0.85;
const VOLUME_FALLBACK_CONFIDENCE: f64 = 0.2;

/// Observes spot price and 24h change per asset
pub struct PriceSignalOracle {
    feed: Arc<dyn MarketFeed>,
    assets: Vec<String>,
}

impl PriceSignalOracle {
    pub const ID: &'static str = "price-signal";

    pub fn new(feed: Arc<dyn MarketFeed>, assets: Vec<String>) -> Self {
        Self { feed, assets }
    }

    fn fallback() -> Signal {
        let payload = SignalPayload {
            price: Some(0.0),
            change: Some(0.0),
            ..Default::default()
        };
        Signal::seeded("fallback", PRICE_FALLBACK_CONFIDENCE, payload, "fallback")
    }
}

#[async_trait]
impl Oracle for PriceSignalOracle {
    fn id(&self) -> &str {
        Self::ID
    }

    fn role(&self) -> OracleRole {
        OracleRole::Signal
    }

    async fn observe(&self) -> Result<Vec<Signal>> {
        match self.feed.quotes(&self.assets).await {
            Ok(quotes) => Ok(quotes
                .into_iter()
                .map(|q| {
                    let payload = SignalPayload {
                        asset: Some(q.asset),
                        price: Some(q.price),
                        change: Some(q.change_24h),
                        ..Default::default()
                    };
                    Signal::new(self.feed.name(), PRICE_CONFIDENCE, payload)
                })
                .collect()),
            Err(e) => {
                tracing::warn!(
                    oracle_id = %Self::ID,
                    error = %e,
                    "Price feed unavailable, emitting fallback signal"
                );
                Ok(vec![Self::fallback()])
            }
        }
    }
}

/// Observes 24h traded volume per asset
pub struct VolumeSignalOracle {
    feed: Arc<dyn MarketFeed>,
    assets: Vec<String>,
}

impl VolumeSignalOracle {
    pub const ID: &'static str = "volume-signal";

    pub fn new(feed: Arc<dyn MarketFeed>, assets: Vec<String>) -> Self {
        Self { feed, assets }
    }

    fn fallback() -> Signal {
        let payload = SignalPayload {
            volume: Some(0.0),
            ..Default::default()
        };
        Signal::seeded(
            "volume-fallback",
            VOLUME_FALLBACK_CONFIDENCE,
            payload,
            "volume-fallback",
        )
    }
}

#[async_trait]
impl Oracle for VolumeSignalOracle {
    fn id(&self) -> &str {
        Self::ID
    }

    fn role(&self) -> OracleRole {
        OracleRole::Signal
    }

    async fn observe(&self) -> Result<Vec<Signal>> {
        match self.feed.quotes(&self.assets).await {
            Ok(quotes) => {
                let source = format!("{}-volume", self.feed.name());
                Ok(quotes
                    .into_iter()
                    .map(|q| {
                        let payload = SignalPayload {
                            asset: Some(q.asset),
                            volume: Some(q.volume_24h),
                            ..Default::default()
                        };
                        Signal::new(source.clone(), VOLUME_CONFIDENCE, payload)
                    })
                    .collect())
            }
            Err(e) => {
                tracing::warn!(
                    oracle_id = %Self::ID,
                    error = %e,
                    "Volume feed unavailable, emitting fallback signal"
                );
                Ok(vec![Self::fallback()])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use crate::oracle::sources::{MarketQuote, MockMarketFeed};
    use crate::types::content_hash;

    fn quote(asset: &str, price: f64, change: f64, volume: f64) -> MarketQuote {
        MarketQuote {
            asset: asset.to_string(),
            price,
            change_24h: change,
            volume_24h: volume,
            market_cap: 0.0,
        }
    }

    fn healthy_feed() -> Arc<dyn MarketFeed> {
        let mut feed = MockMarketFeed::new();
        feed.expect_name().return_const("coingecko");
        feed.expect_quotes().returning(|_| {
            Ok(vec![
                quote("bitcoin", 50000.0, 2.0, 3.0e10),
                quote("ethereum", 3000.0, -1.0, 1.5e10),
            ])
        });
        Arc::new(feed)
    }

    fn broken_feed() -> Arc<dyn MarketFeed> {
        let mut feed = MockMarketFeed::new();
        feed.expect_name().return_const("coingecko");
        feed.expect_quotes()
            .returning(|_| Err(OracleError::source_unavailable("coingecko", "HTTP 429")));
        Arc::new(feed)
    }

    fn assets() -> Vec<String> {
        vec!["bitcoin".to_string(), "ethereum".to_string()]
    }

    #[tokio::test]
    async fn test_price_oracle_emits_one_signal_per_quote() {
        let oracle = PriceSignalOracle::new(healthy_feed(), assets());
        let signals = oracle.observe().await.unwrap();

        assert_eq!(signals.len(), 2);
        assert!(signals.iter().all(|s| s.source == "coingecko"));
        assert!(signals.iter().all(|s| s.confidence == PRICE_CONFIDENCE));
        assert_eq!(signals[0].payload.price(), Some(50000.0));
        assert_eq!(signals[1].payload.change, Some(-1.0));
        assert_ne!(signals[0].hash, signals[1].hash);
    }

    #[tokio::test]
    async fn test_price_oracle_falls_back_on_feed_error() {
        let oracle = PriceSignalOracle::new(broken_feed(), assets());
        let signals = oracle.observe().await.unwrap();

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].source, "fallback");
        assert_eq!(signals[0].confidence, PRICE_FALLBACK_CONFIDENCE);
        assert_eq!(signals[0].hash, content_hash(b"fallback"));
        assert!(signals[0].payload.price().is_none());
    }

    #[tokio::test]
    async fn test_volume_oracle_emits_volume_payloads() {
        let oracle = VolumeSignalOracle::new(healthy_feed(), assets());
        let signals = oracle.observe().await.unwrap();

        assert_eq!(signals.len(), 2);
        assert!(signals.iter().all(|s| s.source == "coingecko-volume"));
        assert_eq!(signals[0].payload.volume(), Some(3.0e10));
        assert!(signals[0].payload.price.is_none());
    }

    #[tokio::test]
    async fn test_volume_oracle_falls_back_on_feed_error() {
        let oracle = VolumeSignalOracle::new(broken_feed(), assets());
        let signals = oracle.observe().await.unwrap();

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].source, "volume-fallback");
        assert_eq!(signals[0].confidence, VOLUME_FALLBACK_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_signal_oracle_reason_is_sentinel() {
        let oracle = PriceSignalOracle::new(healthy_feed(), assets());
        let verdict = oracle.reason(&[]).await.unwrap();
        assert_eq!(verdict.oracle_id, PriceSignalOracle::ID);
        assert_eq!(verdict.prediction, 0.0);
        assert_eq!(verdict.uncertainty, 1.0);
    }
}
