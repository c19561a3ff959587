//! Verification oracles - independent checks of the raw signal set
//!
//! They never see the reasoning verdicts. Their predictions are compared with
//! the consensus to derive the adversarial penalty.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Mutex;

use crate::error::Result;
use crate::oracle::Oracle;
use crate::types::{OracleRole, Signal, Verdict};

/// Added once when any two signals share a content hash
pub const DUPLICATE_PENALTY: f64 = 0.3;
/// Scale applied to the fraction of confidence outliers
pub const OUTLIER_PENALTY: f64 = 0.2;
/// Scale applied to the fraction of clustered timestamps
pub const CLUSTER_PENALTY: f64 = 0.1;
/// Distance from the mean confidence that marks an outlier
pub const OUTLIER_THRESHOLD: f64 = 0.4;
/// Signals closer than this (ms) count as clustered
pub const CLUSTER_WINDOW_MS: i64 = 1000;

/// Components of the adversarial suspicion score
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Suspicion {
    pub duplicates: f64,
    pub outliers: f64,
    pub clustering: f64,
}

impl Suspicion {
    pub fn score(&self) -> f64 {
        self.duplicates + self.outliers + self.clustering
    }

    pub fn assess(signals: &[Signal]) -> Self {
        let total = signals.len();
        if total == 0 {
            return Self::default();
        }
        let n = total as f64;

        // Possible replay
        let unique: HashSet<&str> = signals.iter().map(|s| s.hash.as_str()).collect();
        let duplicates = if unique.len() < total {
            DUPLICATE_PENALTY
        } else {
            0.0
        };

        let avg_confidence = signals.iter().map(|s| s.confidence).sum::<f64>() / n;
        let outlier_count = signals
            .iter()
            .filter(|s| (s.confidence - avg_confidence).abs() > OUTLIER_THRESHOLD)
            .count();

        // Possible coordinated injection
        let mut timestamps: Vec<i64> = signals.iter().map(|s| s.timestamp).collect();
        timestamps.sort_unstable();
        let cluster_count = timestamps
            .windows(2)
            .filter(|pair| pair[1] - pair[0] < CLUSTER_WINDOW_MS)
            .count();

        Self {
            duplicates,
            outliers: outlier_count as f64 / n * OUTLIER_PENALTY,
            clustering: cluster_count as f64 / n * CLUSTER_PENALTY,
        }
    }
}

/// Scores replay, confidence outliers and timestamp clustering
#[derive(Debug, Default)]
pub struct AdversarialVerificationOracle;

impl AdversarialVerificationOracle {
    pub const ID: &'static str = "adversarial-verification";

    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(signals: &[Signal]) -> Verdict {
        if signals.is_empty() {
            return Verdict::new(
                Self::ID,
                0.5,
                1.0,
                "Adversarial check: no signals to verify",
            );
        }

        let suspicion = Suspicion::assess(signals).score();
        let level = if suspicion > 0.5 {
            "HIGH RISK - Potential manipulation detected"
        } else if suspicion > 0.2 {
            "MEDIUM RISK - Some anomalies found"
        } else {
            "LOW RISK - Signals appear legitimate"
        };

        Verdict::new(
            Self::ID,
            (1.0 - suspicion).max(0.0),
            suspicion.clamp(0.0, 1.0),
            format!("Adversarial check: {}", level),
        )
    }
}

#[async_trait]
impl Oracle for AdversarialVerificationOracle {
    fn id(&self) -> &str {
        Self::ID
    }

    fn role(&self) -> OracleRole {
        OracleRole::Verification
    }

    async fn reason(&self, signals: &[Signal]) -> Result<Verdict> {
        let verdict = Self::evaluate(signals);
        if verdict.uncertainty > 0.5 && !signals.is_empty() {
            tracing::warn!(
                oracle_id = %Self::ID,
                suspicion = verdict.uncertainty,
                signals = signals.len(),
                "Suspicious signal set"
            );
        }
        Ok(verdict)
    }
}

/// Checks that sources agree on the price of each asset
#[derive(Debug)]
pub struct ConsistencyVerificationOracle {
    scores: Mutex<VecDeque<f64>>,
}

impl ConsistencyVerificationOracle {
    pub const ID: &'static str = "consistency-verification";
    pub const HISTORY: usize = 20;

    pub fn new() -> Self {
        Self {
            scores: Mutex::new(VecDeque::with_capacity(Self::HISTORY)),
        }
    }

    /// Mean coefficient of variation across assets quoted at least twice
    pub fn coefficient_of_variation(signals: &[Signal]) -> Option<f64> {
        let mut by_asset: BTreeMap<Option<&str>, Vec<f64>> = BTreeMap::new();
        for signal in signals {
            if let Some(price) = signal.payload.price() {
                by_asset
                    .entry(signal.payload.asset.as_deref())
                    .or_default()
                    .push(price);
            }
        }

        let cvs: Vec<f64> = by_asset
            .values()
            .filter(|prices| prices.len() >= 2)
            .map(|prices| {
                let n = prices.len() as f64;
                let mean = prices.iter().sum::<f64>() / n;
                let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
                variance.sqrt() / mean
            })
            .collect();

        if cvs.is_empty() {
            None
        } else {
            Some(cvs.iter().sum::<f64>() / cvs.len() as f64)
        }
    }

    /// Recent consistency scores, oldest first
    pub fn recent_scores(&self) -> Vec<f64> {
        self.scores
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .copied()
            .collect()
    }

    fn record(&self, score: f64) -> f64 {
        let mut scores = self.scores.lock().unwrap_or_else(|e| e.into_inner());
        scores.push_back(score);
        while scores.len() > Self::HISTORY {
            scores.pop_front();
        }
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

impl Default for ConsistencyVerificationOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Oracle for ConsistencyVerificationOracle {
    fn id(&self) -> &str {
        Self::ID
    }

    fn role(&self) -> OracleRole {
        OracleRole::Verification
    }

    async fn reason(&self, signals: &[Signal]) -> Result<Verdict> {
        let Some(cv) = Self::coefficient_of_variation(signals) else {
            return Ok(Verdict::new(
                Self::ID,
                0.5,
                0.8,
                "Insufficient signals for consistency check",
            ));
        };

        let score = (1.0 - cv * 10.0).max(0.0);
        let rolling = self.record(score);

        Ok(Verdict::new(
            Self::ID,
            score,
            cv.clamp(0.0, 1.0),
            format!(
                "Consistency score: {:.1}% (CV: {:.2}%, rolling {:.1}%)",
                score * 100.0,
                cv * 100.0,
                rolling * 100.0
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignalPayload;

    fn signal(source: &str, confidence: f64, price: f64, ts: i64) -> Signal {
        Signal::new(
            source,
            confidence,
            SignalPayload {
                asset: Some("bitcoin".to_string()),
                price: Some(price),
                ..Default::default()
            },
        )
        .with_timestamp(ts)
    }

    #[test]
    fn test_clean_signals_have_no_suspicion() {
        let signals = vec![
            signal("a", 0.9, 100.0, 0),
            signal("b", 0.9, 101.0, 5_000),
            signal("c", 0.9, 102.0, 10_000),
        ];
        let suspicion = Suspicion::assess(&signals);
        assert_eq!(suspicion, Suspicion::default());

        let verdict = AdversarialVerificationOracle::evaluate(&signals);
        assert_eq!(verdict.prediction, 1.0);
        assert_eq!(verdict.uncertainty, 0.0);
        assert!(verdict.reasoning.contains("LOW RISK"));
    }

    #[test]
    fn test_duplicate_hash_adds_fixed_penalty() {
        let a = signal("a", 0.9, 100.0, 0);
        let replay = a.clone().with_timestamp(60_000);
        let b = signal("b", 0.9, 101.0, 120_000);

        let without = Suspicion::assess(&[a.clone(), b.clone()]);
        let with = Suspicion::assess(&[a, replay, b]);
        assert_eq!(without.duplicates, 0.0);
        assert_eq!(with.duplicates, DUPLICATE_PENALTY);
    }

    #[test]
    fn test_duplicate_penalty_counted_once() {
        let a = signal("a", 0.9, 100.0, 0);
        let signals = vec![
            a.clone(),
            a.clone().with_timestamp(10_000),
            a.with_timestamp(20_000),
        ];
        assert_eq!(Suspicion::assess(&signals).duplicates, DUPLICATE_PENALTY);
    }

    #[test]
    fn test_confidence_outliers() {
        let signals = vec![
            signal("a", 0.9, 100.0, 0),
            signal("b", 0.9, 101.0, 5_000),
            signal("c", 0.9, 102.0, 10_000),
            signal("d", 0.1, 103.0, 15_000),
        ];
        // mean 0.7: only "d" is further than 0.4 away
        let suspicion = Suspicion::assess(&signals);
        assert!((suspicion.outliers - 0.25 * OUTLIER_PENALTY).abs() < 1e-12);
    }

    #[test]
    fn test_timestamp_clustering() {
        let signals = vec![
            signal("a", 0.9, 100.0, 0),
            signal("b", 0.9, 101.0, 200),
            signal("c", 0.9, 102.0, 400),
            signal("d", 0.9, 103.0, 60_000),
        ];
        let suspicion = Suspicion::assess(&signals);
        assert!((suspicion.clustering - 0.5 * CLUSTER_PENALTY).abs() < 1e-12);
    }

    #[test]
    fn test_empty_signal_set_is_neutral() {
        let verdict = AdversarialVerificationOracle::evaluate(&[]);
        assert_eq!(verdict.prediction, 0.5);
        assert_eq!(verdict.uncertainty, 1.0);
    }

    #[tokio::test]
    async fn test_consistency_agreeing_sources() {
        let oracle = ConsistencyVerificationOracle::new();
        let signals = vec![signal("a", 0.9, 100.0, 0), signal("b", 0.9, 100.0, 0)];
        let verdict = oracle.reason(&signals).await.unwrap();
        assert_eq!(verdict.prediction, 1.0);
        assert_eq!(verdict.uncertainty, 0.0);
        assert_eq!(oracle.recent_scores(), vec![1.0]);
    }

    #[tokio::test]
    async fn test_consistency_disagreeing_sources() {
        let oracle = ConsistencyVerificationOracle::new();
        // mean 100, std 5 => cv 0.05 => score 0.5
        let signals = vec![signal("a", 0.9, 95.0, 0), signal("b", 0.9, 105.0, 0)];
        let verdict = oracle.reason(&signals).await.unwrap();
        assert!((verdict.prediction - 0.5).abs() < 1e-12);
        assert!((verdict.uncertainty - 0.05).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_consistency_needs_two_prices() {
        let oracle = ConsistencyVerificationOracle::new();
        let verdict = oracle.reason(&[signal("a", 0.9, 100.0, 0)]).await.unwrap();
        assert_eq!(verdict.prediction, 0.5);
        assert_eq!(verdict.uncertainty, 0.8);
        assert!(oracle.recent_scores().is_empty());
    }

    #[test]
    fn test_consistency_compares_within_asset() {
        let mut eth = signal("a", 0.9, 3000.0, 0);
        eth.payload.asset = Some("ethereum".to_string());
        let signals = vec![
            signal("a", 0.9, 50000.0, 0),
            signal("b", 0.9, 50000.0, 0),
            eth,
        ];
        assert_eq!(
            ConsistencyVerificationOracle::coefficient_of_variation(&signals),
            Some(0.0)
        );
    }

    #[tokio::test]
    async fn test_consistency_history_is_bounded() {
        let oracle = ConsistencyVerificationOracle::new();
        let signals = vec![signal("a", 0.9, 100.0, 0), signal("b", 0.9, 100.0, 0)];
        for _ in 0..30 {
            oracle.reason(&signals).await.unwrap();
        }
        assert_eq!(
            oracle.recent_scores().len(),
            ConsistencyVerificationOracle::HISTORY
        );
    }
}
