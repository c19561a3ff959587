//! Reasoning oracles - turn the run's signals into a bullishness estimate

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::Result;
use crate::oracle::Oracle;
use crate::types::{OracleRole, Signal, Verdict};

/// Buckets 24h percent change into confidence-weighted bands and confirms with volume
#[derive(Debug, Default)]
pub struct TrendReasoningOracle;

impl TrendReasoningOracle {
    pub const ID: &'static str = "trend-reasoning";

    /// Volume above this (USD) strengthens the trend reading
    const HIGH_VOLUME: f64 = 1e9;

    pub fn new() -> Self {
        Self
    }

    fn band(change: f64) -> f64 {
        if change > 5.0 {
            0.8
        } else if change > 0.0 {
            0.6
        } else if change > -5.0 {
            0.4
        } else {
            0.2
        }
    }

    fn volume_multiplier(signals: &[Signal]) -> f64 {
        let volumes: Vec<f64> = signals.iter().filter_map(|s| s.payload.volume()).collect();
        if volumes.is_empty() {
            return 0.9;
        }
        let avg = volumes.iter().sum::<f64>() / volumes.len() as f64;
        if avg > Self::HIGH_VOLUME {
            1.1
        } else {
            0.9
        }
    }

    pub fn evaluate(signals: &[Signal]) -> Verdict {
        let priced: Vec<&Signal> = signals
            .iter()
            .filter(|s| s.payload.price().is_some())
            .collect();
        if priced.is_empty() {
            return Verdict::new(Self::ID, 0.5, 0.9, "Insufficient price data");
        }

        let mut bullish = 0.0;
        let mut total_weight = 0.0;
        for signal in &priced {
            let change = signal.payload.change.unwrap_or(0.0);
            bullish += Self::band(change) * signal.confidence;
            total_weight += signal.confidence;
        }

        if total_weight <= 0.0 {
            return Verdict::new(Self::ID, 0.5, 0.9, "Price signals carry no confidence");
        }

        let raw = bullish / total_weight * Self::volume_multiplier(signals);
        let prediction = raw.clamp(0.0, 1.0);
        let uncertainty = (1.0 - total_weight / signals.len() as f64).clamp(0.0, 1.0);

        let percent = prediction * 100.0;
        Verdict::new(
            Self::ID,
            prediction,
            uncertainty,
            format!("Trend analysis: {percent:.1}% bullish confidence"),
        )
    }
}

#[async_trait]
impl Oracle for TrendReasoningOracle {
    fn id(&self) -> &str {
        Self::ID
    }

    fn role(&self) -> OracleRole {
        OracleRole::Reasoning
    }

    async fn reason(&self, signals: &[Signal]) -> Result<Verdict> {
        Ok(Self::evaluate(signals))
    }
}

/// Compares the mean of the latest prices against the older part of a rolling window
#[derive(Debug)]
pub struct MomentumReasoningOracle {
    /// Asset whose price is tracked; `None` tracks the first price-bearing signal
    asset: Option<String>,
    window: Mutex<VecDeque<f64>>,
}

impl MomentumReasoningOracle {
    pub const ID: &'static str = "momentum-reasoning";
    pub const WINDOW: usize = 10;
    const RECENT: usize = 3;

    pub fn new() -> Self {
        Self {
            asset: None,
            window: Mutex::new(VecDeque::with_capacity(Self::WINDOW)),
        }
    }

    pub fn tracking(asset: impl Into<String>) -> Self {
        Self {
            asset: Some(asset.into()),
            ..Self::new()
        }
    }

    fn observed_price(&self, signals: &[Signal]) -> Option<f64> {
        let priced = || signals.iter().filter(|s| s.payload.price().is_some());
        self.asset
            .as_deref()
            .and_then(|asset| priced().find(|s| s.payload.asset.as_deref() == Some(asset)))
            .or_else(|| priced().next())
            .and_then(|s| s.payload.price())
    }

    /// Snapshot of the rolling price window, oldest first
    pub fn window(&self) -> Vec<f64> {
        self.window
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .copied()
            .collect()
    }

    fn momentum(window: &VecDeque<f64>) -> Option<f64> {
        if window.len() <= Self::RECENT {
            return None;
        }
        let split = window.len() - Self::RECENT;
        let older = window.iter().take(split);
        let recent = window.iter().skip(split);

        let older_avg = older.sum::<f64>() / split as f64;
        let recent_avg = recent.sum::<f64>() / Self::RECENT as f64;
        if older_avg == 0.0 {
            return None;
        }
        Some((recent_avg - older_avg) / older_avg)
    }
}

impl Default for MomentumReasoningOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Oracle for MomentumReasoningOracle {
    fn id(&self) -> &str {
        Self::ID
    }

    fn role(&self) -> OracleRole {
        OracleRole::Reasoning
    }

    async fn reason(&self, signals: &[Signal]) -> Result<Verdict> {
        let Some(price) = self.observed_price(signals) else {
            return Ok(Verdict::new(Self::ID, 0.5, 0.8, "No price data for momentum analysis"));
        };

        let momentum = {
            let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
            window.push_back(price);
            while window.len() > Self::WINDOW {
                window.pop_front();
            }
            Self::momentum(&window)
        };

        let Some(momentum) = momentum else {
            return Ok(Verdict::new(Self::ID, 0.5, 0.7, "Insufficient history for momentum"));
        };

        let prediction = (0.5 + momentum * 2.0).clamp(0.0, 1.0);
        Ok(Verdict::new(
            Self::ID,
            prediction,
            0.3,
            format!("Momentum: {:.2}% price velocity", momentum * 100.0),
        ))
    }
}
