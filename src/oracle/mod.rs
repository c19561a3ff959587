//! Oracle module - Pluggable consensus participants
//!
//! Every participant implements [`Oracle`]: signal oracles observe raw market
//! data, reasoning oracles turn signals into a prediction, and verification
//! oracles assess the same signals for manipulation.

pub mod reasoning;
pub mod signal;
pub mod sources;
pub mod verification;

pub use reasoning::{MomentumReasoningOracle, TrendReasoningOracle};
pub use signal::{PriceSignalOracle, VolumeSignalOracle};
pub use verification::{AdversarialVerificationOracle, ConsistencyVerificationOracle};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::oracle::sources::MarketFeed;
use crate::types::{OracleRole, Signal, Verdict};

/// Learning rate for the weight update
pub const LEARNING_RATE: f64 = 0.1;
/// Minimum weight, so no oracle is ever fully silenced
pub const WEIGHT_FLOOR: f64 = 0.1;
pub const INITIAL_WEIGHT: f64 = 1.0;
pub const INITIAL_ACCURACY: f64 = 0.5;

/// Capability shared by every oracle variant
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Stable identity, the join key to weight/accuracy state
    fn id(&self) -> &str;

    /// Role fixed at registration
    fn role(&self) -> OracleRole;

    /// Produce raw observations. Only signal oracles return anything.
    async fn observe(&self) -> Result<Vec<Signal>> {
        Ok(Vec::new())
    }

    /// Judge this run's signals. Signal oracles return a zero-confidence sentinel
    /// that must never be aggregated.
    async fn reason(&self, _signals: &[Signal]) -> Result<Verdict> {
        Ok(Verdict::abstain(self.id(), "Signal oracle - no reasoning"))
    }
}

/// Mutable reputation of a registered oracle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OracleState {
    /// Influence multiplier, never below [`WEIGHT_FLOOR`]
    pub weight: f64,
    /// Smoothed correctness estimate (0.0 - 1.0)
    pub accuracy: f64,
}

impl Default for OracleState {
    fn default() -> Self {
        Self {
            weight: INITIAL_WEIGHT,
            accuracy: INITIAL_ACCURACY,
        }
    }
}

impl OracleState {
    /// Bounded state. Non-finite inputs fall back to the initial values.
    pub fn new(weight: f64, accuracy: f64) -> Self {
        let finite_or = |value: f64, initial: f64| if value.is_finite() { value } else { initial };
        Self {
            weight: finite_or(weight, INITIAL_WEIGHT).max(WEIGHT_FLOOR),
            accuracy: finite_or(accuracy, INITIAL_ACCURACY).clamp(0.0, 1.0),
        }
    }

    /// Weight used by the consensus average
    pub fn effective_weight(&self) -> f64 {
        self.weight * self.accuracy
    }

    /// Single gradient step towards `reward`
    pub fn update_weight(&mut self, reward: f64) {
        if !reward.is_finite() {
            tracing::debug!(reward, "Ignoring non-finite reward");
            return;
        }
        self.weight = (self.weight + LEARNING_RATE * reward).max(WEIGHT_FLOOR);
        self.accuracy = (self.accuracy + LEARNING_RATE * reward * 0.1).clamp(0.0, 1.0);
    }
}

/// The standard oracle set, filtered by the `oracles.*_enabled` switches
pub fn default_oracles(config: &AppConfig, feed: Arc<dyn MarketFeed>) -> Vec<Arc<dyn Oracle>> {
    let switches = &config.oracles;
    let assets = &config.feed.assets;
    let mut oracles: Vec<Arc<dyn Oracle>> = Vec::new();

    if switches.price_enabled {
        oracles.push(Arc::new(PriceSignalOracle::new(feed.clone(), assets.clone())));
    }
    if switches.volume_enabled {
        oracles.push(Arc::new(VolumeSignalOracle::new(feed.clone(), assets.clone())));
    }
    if switches.trend_enabled {
        oracles.push(Arc::new(TrendReasoningOracle::new()));
    }
    if switches.momentum_enabled {
        oracles.push(Arc::new(MomentumReasoningOracle::tracking(
            sources::resolve_asset_id(&switches.momentum_asset),
        )));
    }
    if switches.adversarial_enabled {
        oracles.push(Arc::new(AdversarialVerificationOracle::new()));
    }
    if switches.consistency_enabled {
        oracles.push(Arc::new(ConsistencyVerificationOracle::new()));
    }

    oracles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_floor_holds_for_large_negative_reward() {
        let mut state = OracleState::default();
        state.update_weight(-1000.0);
        assert_eq!(state.weight, WEIGHT_FLOOR);
        assert_eq!(state.accuracy, 0.0);
    }

    #[test]
    fn test_accuracy_clamped_for_large_positive_reward() {
        let mut state = OracleState::default();
        state.update_weight(1000.0);
        assert_eq!(state.accuracy, 1.0);
        assert!((state.weight - 101.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_step_nudge() {
        let mut state = OracleState::default();
        state.update_weight(0.52);
        assert!((state.weight - 1.052).abs() < 1e-12);
        assert!((state.accuracy - 0.5052).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_reward_is_ignored() {
        let mut state = OracleState::default();
        state.update_weight(f64::NAN);
        assert_eq!(state, OracleState::default());
    }

    #[test]
    fn test_default_oracles_respect_switches() {
        let mut config = AppConfig::defaults().unwrap();
        let feed: Arc<dyn MarketFeed> = Arc::new(sources::CoinGeckoFeed::default());
        let all = default_oracles(&config, feed.clone());
        assert_eq!(all.len(), 6);
        let signal_oracles = all.iter().filter(|o| o.role() == OracleRole::Signal);
        assert_eq!(signal_oracles.count(), 2);

        config.oracles.volume_enabled = false;
        config.oracles.consistency_enabled = false;
        let ids: Vec<String> = default_oracles(&config, feed)
            .iter()
            .map(|o| o.id().to_string())
            .collect();
        assert!(!ids.contains(&VolumeSignalOracle::ID.to_string()));
        assert!(!ids.contains(&ConsistencyVerificationOracle::ID.to_string()));
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_new_enforces_bounds() {
        let state = OracleState::new(0.0, 1.5);
        assert_eq!(state.weight, WEIGHT_FLOOR);
        assert_eq!(state.accuracy, 1.0);

        let state = OracleState::new(f64::NAN, f64::NEG_INFINITY);
        assert_eq!(state, OracleState::default());
    }
}
