//! Weight Adapter - Rewards or penalizes every oracle once ground truth is known
//!
//! Credit assignment is global: the same reward is applied to every registered
//! oracle regardless of role.

use serde::Serialize;

use crate::engine::registry::OracleRegistry;
use crate::types::ConsensusResult;

const CORRECTNESS_COEF: f64 = 1.0;
const VOLATILITY_COEF: f64 = 0.3;
const LATENCY_COEF: f64 = 0.1;
const CONSENSUS_COEF: f64 = 0.2;

/// Terms of the reward function, kept for logging
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reward {
    pub correctness: f64,
    pub volatility: f64,
    /// Not measured yet, always 0
    pub latency: f64,
    pub consensus: f64,
    pub value: f64,
}

impl Reward {
    /// R = α·correctness − β·volatility − γ·latency + δ·consensus
    pub fn compute(actual_outcome: f64, last: &ConsensusResult) -> Self {
        let correctness = 1.0 - (actual_outcome - last.oracle_consensus).abs();
        let volatility = last.divergence;
        let latency = 0.0;
        let consensus = last.confidence;

        let value = CORRECTNESS_COEF * correctness
            - VOLATILITY_COEF * volatility
            - LATENCY_COEF * latency
            + CONSENSUS_COEF * consensus;

        Self {
            correctness,
            volatility,
            latency,
            consensus,
            value,
        }
    }
}

/// Nudge every oracle's weight and accuracy by the same reward
pub fn apply(registry: &mut OracleRegistry, reward: &Reward) {
    for state in registry.states_mut() {
        state.update_weight(reward.value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{
        AdversarialVerificationOracle, MomentumReasoningOracle, OracleState, TrendReasoningOracle,
    };
    use std::sync::Arc;

    fn last(consensus: f64, confidence: f64, divergence: f64) -> ConsensusResult {
        ConsensusResult {
            oracle_consensus: consensus,
            confidence,
            divergence,
            timestamp: 0,
        }
    }

    #[test]
    fn test_reward_scenario() {
        let reward = Reward::compute(1.0, &last(0.48, 0.3, 0.20));
        assert!((reward.correctness - 0.52).abs() < 1e-12);
        assert!((reward.value - 0.52).abs() < 1e-12);
        assert_eq!(reward.latency, 0.0);
    }

    #[test]
    fn test_wrong_call_is_penalized_relative_to_right_call() {
        let base = last(0.9, 0.5, 0.1);
        let right = Reward::compute(1.0, &base);
        let wrong = Reward::compute(0.0, &base);
        assert!(right.value > wrong.value);
        assert!((wrong.correctness - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_apply_nudges_every_role_equally() {
        let mut registry = OracleRegistry::new();
        registry.register(Arc::new(TrendReasoningOracle::new()));
        registry.register_with_state(
            Arc::new(MomentumReasoningOracle::new()),
            OracleState::new(2.0, 0.9),
        );
        registry.register(Arc::new(AdversarialVerificationOracle::new()));

        let before: Vec<OracleState> = registry.iter().map(|e| e.state).collect();
        let reward = Reward::compute(1.0, &last(0.48, 0.3, 0.20));
        apply(&mut registry, &reward);

        for (old, entry) in before.iter().zip(registry.iter()) {
            assert!((entry.state.weight - old.weight - 0.052).abs() < 1e-12);
            assert!((entry.state.accuracy - old.accuracy - 0.0052).abs() < 1e-12);
        }
    }
}
