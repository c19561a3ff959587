//! Three-phase evaluation pipeline
//!
//! Signal oracles observe first. Once every one of them has returned, failed or
//! timed out, reasoning and verification oracles judge the same immutable signal
//! set concurrently.

use futures_util::future::join_all;
use std::future::Future;
use std::time::Duration;

use crate::engine::registry::RegisteredOracle;
use crate::error::{OracleError, Result};
use crate::types::{OracleRole, Signal, Verdict};

/// An oracle that contributed nothing to a phase
#[derive(Debug, Clone, PartialEq)]
pub struct Abstention {
    pub oracle_id: String,
    pub phase: OracleRole,
    pub error: OracleError,
}

/// A verdict together with the id of the oracle that returned it
#[derive(Debug, Clone, PartialEq)]
pub struct ProducedVerdict {
    pub producer: String,
    pub verdict: Verdict,
}

/// Everything one pipeline run produced
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub signals: Vec<Signal>,
    pub reasoning: Vec<ProducedVerdict>,
    pub verification: Vec<ProducedVerdict>,
    pub abstentions: Vec<Abstention>,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    call_timeout: Duration,
}

impl Pipeline {
    pub fn new(call_timeout: Duration) -> Self {
        Self { call_timeout }
    }

    pub async fn run(&self, participants: &[RegisteredOracle]) -> PipelineOutput {
        let mut output = PipelineOutput::default();

        // Phase 1: signal collection
        let observers: Vec<&RegisteredOracle> = participants
            .iter()
            .filter(|p| p.role() == OracleRole::Signal)
            .collect();
        let calls = observers
            .iter()
            .map(|p| self.call(p.id(), OracleRole::Signal, p.oracle.observe()));
        let observed = join_all(calls).await;

        for (participant, result) in observers.iter().zip(observed) {
            match result {
                Ok(signals) => output.signals.extend(signals),
                Err(error) => output.abstain(participant.id(), OracleRole::Signal, error),
            }
        }

        // Phases 2 and 3 only read the signal set
        let signals = output.signals.as_slice();
        let (reasoning, verification) = tokio::join!(
            self.judge(participants, signals, OracleRole::Reasoning),
            self.judge(participants, signals, OracleRole::Verification),
        );

        for (phase, results) in [
            (OracleRole::Reasoning, reasoning),
            (OracleRole::Verification, verification),
        ] {
            for (producer, result) in results {
                match result {
                    Ok(verdict) => {
                        let produced = ProducedVerdict { producer, verdict };
                        if phase == OracleRole::Reasoning {
                            output.reasoning.push(produced);
                        } else {
                            output.verification.push(produced);
                        }
                    }
                    Err(error) => output.abstain(&producer, phase, error),
                }
            }
        }

        output
    }

    async fn judge(
        &self,
        participants: &[RegisteredOracle],
        signals: &[Signal],
        phase: OracleRole,
    ) -> Vec<(String, Result<Verdict>)> {
        let judges: Vec<&RegisteredOracle> =
            participants.iter().filter(|p| p.role() == phase).collect();
        let calls = judges
            .iter()
            .map(|p| self.call(p.id(), phase, p.oracle.reason(signals)));
        let verdicts = join_all(calls).await;

        judges
            .iter()
            .map(|p| p.id().to_string())
            .zip(verdicts)
            .collect()
    }

    /// Await one oracle call, bounded by the call timeout
    async fn call<T>(
        &self,
        oracle_id: &str,
        phase: OracleRole,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout {
                oracle_id: oracle_id.to_string(),
                phase,
                timeout_ms: self.call_timeout.as_millis() as u64,
            }),
        }
    }
}

impl PipelineOutput {
    fn abstain(&mut self, oracle_id: &str, phase: OracleRole, error: OracleError) {
        tracing::warn!(
            oracle_id = %oracle_id,
            phase = %phase,
            error = %error,
            "Oracle abstained"
        );
        self.abstentions.push(Abstention {
            oracle_id: oracle_id.to_string(),
            phase,
            error,
        });
    }
}
