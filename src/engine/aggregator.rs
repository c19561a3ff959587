//! Consensus Aggregator - Combines verdicts into a single weighted estimate
//!
//! Reasoning verdicts are averaged by `weight × accuracy`, verification verdicts
//! are turned into an adversarial penalty against that average, and the spread
//! of reasoning predictions is reported as divergence.

use crate::engine::pipeline::ProducedVerdict;
use crate::engine::registry::RegisteredOracle;
use crate::error::{OracleError, Result};
use crate::oracle::OracleState;
use crate::types::{ConsensusResult, OracleRole};

/// Consensus reported when the total effective weight is zero
pub const NEUTRAL_CONSENSUS: f64 = 0.5;
/// Scale of the adversarial penalty subtracted from confidence
pub const PENALTY_SCALE: f64 = 0.1;

/// A verdict paired with its producer's reputation at the start of the run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedVerdict {
    pub prediction: f64,
    pub state: OracleState,
}

/// Attach the producer's reputation to each verdict. A verdict must be signed
/// with its producer's own id, and the producer must belong to `phase`.
pub fn resolve(
    verdicts: &[ProducedVerdict],
    participants: &[RegisteredOracle],
    phase: OracleRole,
) -> Result<Vec<WeightedVerdict>> {
    verdicts
        .iter()
        .map(|produced| {
            let producer_id = produced.producer.as_str();
            let signed = produced.verdict.oracle_id.as_str();
            if signed != producer_id {
                return Err(OracleError::contract_violation(format!(
                    "oracle {producer_id} signed a verdict as {signed}"
                )));
            }
            let producer = participants
                .iter()
                .find(|p| p.id() == signed)
                .ok_or_else(|| {
                    OracleError::contract_violation(format!(
                        "verdict from unregistered oracle {signed}"
                    ))
                })?;
            let role = producer.role();
            if role != phase {
                return Err(OracleError::contract_violation(format!(
                    "{role} oracle {signed} produced a {phase} verdict"
                )));
            }
            Ok(WeightedVerdict {
                prediction: produced.verdict.prediction,
                state: producer.state,
            })
        })
        .collect()
}

/// Combine one run's verdicts. `registry_size` counts oracles of every role.
pub fn aggregate(
    reasoning: &[WeightedVerdict],
    verification: &[WeightedVerdict],
    registry_size: usize,
    timestamp: i64,
) -> ConsensusResult {
    let total_weight: f64 = reasoning.iter().map(|v| v.state.effective_weight()).sum();

    if total_weight <= 0.0 || registry_size == 0 {
        return ConsensusResult {
            oracle_consensus: NEUTRAL_CONSENSUS,
            confidence: 0.0,
            divergence: divergence(reasoning, NEUTRAL_CONSENSUS),
            timestamp,
        };
    }

    let score: f64 = reasoning
        .iter()
        .map(|v| v.prediction * v.state.effective_weight())
        .sum();
    let consensus = score / total_weight;

    let adversarial_penalty: f64 = verification
        .iter()
        .map(|v| (v.prediction - consensus).abs() * v.state.weight)
        .sum();

    let confidence =
        (total_weight / registry_size as f64 - adversarial_penalty * PENALTY_SCALE).max(0.0);

    ConsensusResult {
        oracle_consensus: consensus,
        confidence,
        divergence: divergence(reasoning, consensus),
        timestamp,
    }
}

/// Mean absolute deviation from `center`; 0 for no verdicts
fn divergence(reasoning: &[WeightedVerdict], center: f64) -> f64 {
    if reasoning.is_empty() {
        return 0.0;
    }
    reasoning
        .iter()
        .map(|v| (v.prediction - center).abs())
        .sum::<f64>()
        / reasoning.len() as f64
}
