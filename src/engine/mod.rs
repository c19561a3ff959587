//! Engine module - Oracle consensus orchestration
//!
//! [`MetaOracleEngine`] owns the registry and the consensus history. A run
//! snapshots the registry, drives the three-phase pipeline and aggregates the
//! verdicts; an outcome report credits every oracle with the same reward.
//! Runs, outcome reports and registration are serialized against each other;
//! registration is refused rather than queued while a run or report holds the
//! cycle.

pub mod adapter;
pub mod aggregator;
pub mod health;
pub mod pipeline;
pub mod registry;

pub use adapter::Reward;
pub use health::{HealthReport, NetworkHealth, NetworkStatus, OracleHealth, OracleStatus};
pub use pipeline::{Abstention, Pipeline, ProducedVerdict};
pub use registry::{OracleRegistry, RegisteredOracle};

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::{AppConfig, EngineConfig};
use crate::error::{OracleError, Result};
use crate::oracle::sources::MarketFeed;
use crate::oracle::{default_oracles, Oracle, OracleState};
use crate::types::{ConsensusResult, OracleRole};

/// Detailed report of one consensus run
#[derive(Debug, Clone)]
pub struct ConsensusRun {
    pub run_id: Uuid,
    pub result: ConsensusResult,
    pub signal_count: usize,
    pub abstentions: Vec<Abstention>,
}

/// Bounded history of consensus results, newest last
#[derive(Debug)]
struct ConsensusHistory {
    results: VecDeque<ConsensusResult>,
    capacity: usize,
}

impl ConsensusHistory {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            results: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, result: ConsensusResult) {
        self.results.push_back(result);
        while self.results.len() > self.capacity {
            self.results.pop_front();
        }
    }

    fn last(&self) -> Option<ConsensusResult> {
        self.results.back().copied()
    }
}

pub struct MetaOracleEngine {
    registry: RwLock<OracleRegistry>,
    history: Mutex<ConsensusHistory>,
    /// Serializes runs, outcome reports and registration
    cycle: Mutex<()>,
    pipeline: Pipeline,
}

impl MetaOracleEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            registry: RwLock::new(OracleRegistry::new()),
            history: Mutex::new(ConsensusHistory::new(config.history_capacity)),
            cycle: Mutex::new(()),
            pipeline: Pipeline::new(config.call_timeout()),
        }
    }

    /// Build an engine with an initial oracle set
    pub fn with_oracles(config: EngineConfig, oracles: Vec<Arc<dyn Oracle>>) -> Self {
        let mut registry = OracleRegistry::new();
        for oracle in oracles {
            registry.register(oracle);
        }
        Self {
            registry: RwLock::new(registry),
            ..Self::new(config)
        }
    }

    /// Build an engine with the standard oracle set reading from `feed`
    pub fn with_default_oracles(config: &AppConfig, feed: Arc<dyn MarketFeed>) -> Self {
        Self::with_oracles(config.engine.clone(), default_oracles(config, feed))
    }

    /// Register with fresh reputation, replacing any oracle with the same id
    pub async fn register(&self, oracle: Arc<dyn Oracle>) -> Result<()> {
        self.register_with_state(oracle, OracleState::default()).await
    }

    pub async fn register_with_state(
        &self,
        oracle: Arc<dyn Oracle>,
        state: OracleState,
    ) -> Result<()> {
        let _cycle = self
            .cycle
            .try_lock()
            .map_err(|_| OracleError::RunInProgress)?;

        let id = oracle.id().to_string();
        let role = oracle.role();
        let replaced = self
            .registry
            .write()
            .await
            .register_with_state(oracle, state);

        tracing::info!(oracle_id = %id, role = %role, replaced, "Oracle registered");
        Ok(())
    }

    pub async fn run_consensus(&self) -> Result<ConsensusResult> {
        Ok(self.run_consensus_detailed().await?.result)
    }

    /// Run the pipeline once and append the result to history
    pub async fn run_consensus_detailed(&self) -> Result<ConsensusRun> {
        let _cycle = self.cycle.lock().await;
        let run_id = Uuid::new_v4();

        let participants = self.registry.read().await.snapshot();
        let output = self.pipeline.run(&participants).await;

        let reasoning =
            aggregator::resolve(&output.reasoning, &participants, OracleRole::Reasoning)?;
        let verification = aggregator::resolve(
            &output.verification,
            &participants,
            OracleRole::Verification,
        )?;

        let result = aggregator::aggregate(
            &reasoning,
            &verification,
            participants.len(),
            chrono::Utc::now().timestamp_millis(),
        );
        self.history.lock().await.push(result);

        tracing::info!(
            run_id = %run_id,
            consensus = result.oracle_consensus,
            confidence = result.confidence,
            divergence = result.divergence,
            signals = output.signals.len(),
            verdicts = reasoning.len(),
            abstentions = output.abstentions.len(),
            "Consensus reached"
        );

        Ok(ConsensusRun {
            run_id,
            result,
            signal_count: output.signals.len(),
            abstentions: output.abstentions,
        })
    }

    /// Credit every oracle against the latest consensus. Returns the applied
    /// reward, or `None` when no consensus has been reached yet.
    pub async fn report_outcome(&self, actual_outcome: f64) -> Result<Option<f64>> {
        if !(0.0..=1.0).contains(&actual_outcome) {
            return Err(OracleError::InvalidOutcome(actual_outcome));
        }

        let _cycle = self.cycle.lock().await;

        let Some(last) = self.history.lock().await.last() else {
            tracing::debug!("Outcome reported before any consensus, nothing to credit");
            return Ok(None);
        };

        let reward = Reward::compute(actual_outcome, &last);
        adapter::apply(&mut *self.registry.write().await, &reward);

        tracing::info!(
            actual_outcome,
            consensus = last.oracle_consensus,
            correctness = reward.correctness,
            reward = reward.value,
            "Oracle weights updated"
        );

        Ok(Some(reward.value))
    }

    pub async fn health(&self) -> HealthReport {
        HealthReport::from_registry(&*self.registry.read().await)
    }

    /// Retained consensus results, oldest first
    pub async fn history(&self) -> Vec<ConsensusResult> {
        self.history.lock().await.results.iter().copied().collect()
    }

    pub async fn last_result(&self) -> Option<ConsensusResult> {
        self.history.lock().await.last()
    }

    pub async fn oracle_count(&self) -> usize {
        self.registry.read().await.len()
    }
}

impl Default for MetaOracleEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
