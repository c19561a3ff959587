//! Meta-Oracle daemon
//!
//! Runs consensus on a fixed cadence. Before each run the previous consensus is
//! credited with the realized direction of the reference asset's price.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use meta_oracle::config::AppConfig;
use meta_oracle::oracle::sources::{resolve_asset_id, CoinGeckoFeed, MarketFeed};
use meta_oracle::MetaOracleEngine;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    tracing::info!(config = %config, "Starting meta-oracle");

    let feed = CoinGeckoFeed::from_config(&config.feed)
        .context("Failed to build market feed")?;
    let feed: Arc<dyn MarketFeed> = Arc::new(feed);
    let engine = MetaOracleEngine::with_default_oracles(&config, feed.clone());
    tracing::info!(
        oracles = engine.oracle_count().await,
        "Oracle network ready"
    );

    let reference_asset = resolve_asset_id(&config.oracles.momentum_asset);
    let mut last_price: Option<f64> = None;
    let interval = Duration::from_secs(config.engine.run_interval_secs.max(1));
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested");
                break;
            }
        }

        let price = reference_price(feed.as_ref(), &reference_asset).await;
        if let (Some(previous), Some(current)) = (last_price, price) {
            let outcome = if current > previous { 1.0 } else { 0.0 };
            if let Err(e) = engine.report_outcome(outcome).await {
                tracing::warn!(error = %e, "Failed to report outcome");
            }
        }
        if price.is_some() {
            last_price = price;
        }

        match engine.run_consensus_detailed().await {
            Ok(run) => {
                let reading = run.result.interpretation();
                tracing::info!(
                    run_id = %run.run_id,
                    signal = %reading.signal,
                    risk = %reading.risk,
                    strength = reading.strength,
                    "Market reading"
                );
            }
            Err(e) => tracing::error!(error = %e, "Consensus run failed"),
        }

        let health = engine.health().await;
        tracing::debug!(
            avg_accuracy = health.network.avg_accuracy,
            stability = health.network.stability,
            status = %health.network.status,
            "Network health"
        );
    }

    let history = engine.history().await;
    tracing::info!(runs = history.len(), "Stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn reference_price(feed: &dyn MarketFeed, asset: &str) -> Option<f64> {
    match feed.quotes(&[asset.to_string()]).await {
        Ok(quotes) => quotes
            .into_iter()
            .find(|q| q.asset == asset)
            .map(|q| q.price),
        Err(e) => {
            tracing::warn!(asset = %asset, error = %e, "Reference price unavailable");
            None
        }
    }
}
