//! Core types used throughout the consensus engine
//!
//! Defines signals, verdicts, oracle roles and consensus results.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Pipeline phase an oracle participates in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleRole {
    Signal,
    Reasoning,
    Verification,
}

impl OracleRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            OracleRole::Signal => "signal",
            OracleRole::Reasoning => "reasoning",
            OracleRole::Verification => "verification",
        }
    }
}

impl fmt::Display for OracleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured observation data carried by a signal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// 24h percent change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    /// 24h volume in USD
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
}

impl SignalPayload {
    /// Price, if present and positive. Zero-valued fallback prices don't count.
    pub fn price(&self) -> Option<f64> {
        self.price.filter(|p| *p > 0.0)
    }

    /// Volume, if present and positive
    pub fn volume(&self) -> Option<f64> {
        self.volume.filter(|v| *v > 0.0)
    }
}

/// A raw observation produced by a signal oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Origin identifier (e.g. "coingecko")
    pub source: String,
    /// Self-reported reliability (0.0 - 1.0)
    pub confidence: f64,
    pub payload: SignalPayload,
    /// Capture time in milliseconds
    pub timestamp: i64,
    /// Hex SHA-256 of the payload, used for replay detection
    pub hash: String,
}

impl Signal {
    /// Build a signal stamped now, hashing the payload's JSON encoding
    pub fn new(source: impl Into<String>, confidence: f64, payload: SignalPayload) -> Self {
        let encoded = serde_json::to_vec(&payload).unwrap_or_default();
        Self {
            source: source.into(),
            confidence: confidence.clamp(0.0, 1.0),
            payload,
            timestamp: chrono::Utc::now().timestamp_millis(),
            hash: content_hash(&encoded),
        }
    }

    /// Build a signal whose hash is derived from a fixed seed instead of the payload
    pub fn seeded(
        source: impl Into<String>,
        confidence: f64,
        payload: SignalPayload,
        seed: &str,
    ) -> Self {
        Self {
            hash: content_hash(seed.as_bytes()),
            ..Self::new(source, confidence, payload)
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Lowercase hex SHA-256 digest
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// A judgment produced by a reasoning or verification oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Normalized estimate (0.0 - 1.0)
    pub prediction: f64,
    /// Self-reported doubt (0.0 - 1.0)
    pub uncertainty: f64,
    pub oracle_id: String,
    /// Human-readable justification, never parsed
    pub reasoning: String,
}

impl Verdict {
    pub fn new(
        oracle_id: impl Into<String>,
        prediction: f64,
        uncertainty: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            prediction,
            uncertainty,
            oracle_id: oracle_id.into(),
            reasoning: reasoning.into(),
        }
    }

    /// Sentinel returned by oracles that never reason
    pub fn abstain(oracle_id: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self::new(oracle_id, 0.0, 1.0, reasoning)
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Weighted prediction of the reasoning oracles (0.0 - 1.0)
    pub oracle_consensus: f64,
    /// Aggregate trust discounted by the adversarial penalty, never negative
    pub confidence: f64,
    /// Mean absolute deviation of reasoning predictions from the consensus
    pub divergence: f64,
    /// Timestamp in milliseconds
    pub timestamp: i64,
}

impl ConsensusResult {
    pub fn interpretation(&self) -> Interpretation {
        let c = self.oracle_consensus;
        let signal = if c > 0.7 && self.confidence > 0.6 {
            MarketSignal::StrongBullish
        } else if c > 0.6 {
            MarketSignal::Bullish
        } else if c < 0.3 && self.confidence > 0.6 {
            MarketSignal::StrongBearish
        } else if c < 0.4 {
            MarketSignal::Bearish
        } else {
            MarketSignal::Neutral
        };

        let risk = if self.divergence > 0.3 {
            RiskLevel::High
        } else if self.divergence < 0.1 {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        };

        Interpretation {
            signal,
            risk,
            strength: self.confidence,
        }
    }
}

/// Directional reading of a consensus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketSignal {
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    StrongBearish,
}

impl fmt::Display for MarketSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketSignal::StrongBullish => write!(f, "STRONG BULLISH"),
            MarketSignal::Bullish => write!(f, "BULLISH"),
            MarketSignal::Neutral => write!(f, "NEUTRAL"),
            MarketSignal::Bearish => write!(f, "BEARISH"),
            MarketSignal::StrongBearish => write!(f, "STRONG BEARISH"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

/// Presentation summary of a consensus result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub signal: MarketSignal,
    pub risk: RiskLevel,
    pub strength: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(consensus: f64, confidence: f64, divergence: f64) -> ConsensusResult {
        ConsensusResult {
            oracle_consensus: consensus,
            confidence,
            divergence,
            timestamp: 0,
        }
    }

    #[test]
    fn test_identical_payloads_hash_identically() {
        let payload = SignalPayload {
            asset: Some("bitcoin".into()),
            price: Some(50000.0),
            change: Some(1.5),
            ..Default::default()
        };
        let a = Signal::new("coingecko", 0.9, payload.clone());
        let b = Signal::new("other", 0.5, payload);
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.hash.len(), 64);
    }

    #[test]
    fn test_seeded_hash_ignores_payload() {
        let a = Signal::seeded("fallback", 0.3, SignalPayload::default(), "fallback");
        assert_eq!(a.hash, content_hash(b"fallback"));
    }

    #[test]
    fn test_zero_price_is_not_price_bearing() {
        let payload = SignalPayload {
            price: Some(0.0),
            volume: Some(0.0),
            ..Default::default()
        };
        assert!(payload.price().is_none());
        assert!(payload.volume().is_none());
    }

    #[test]
    fn test_interpretation_tiers() {
        let strong = result(0.75, 0.8, 0.05).interpretation();
        assert_eq!(strong.signal, MarketSignal::StrongBullish);
        assert_eq!(strong.risk, RiskLevel::Low);

        assert_eq!(
            result(0.65, 0.2, 0.2).interpretation().signal,
            MarketSignal::Bullish
        );
        assert_eq!(
            result(0.2, 0.9, 0.2).interpretation().signal,
            MarketSignal::StrongBearish
        );
        assert_eq!(
            result(0.35, 0.1, 0.2).interpretation().signal,
            MarketSignal::Bearish
        );

        let neutral = result(0.5, 0.1, 0.4).interpretation();
        assert_eq!(neutral.signal, MarketSignal::Neutral);
        assert_eq!(neutral.risk, RiskLevel::High);
        assert_eq!(
            result(0.5, 0.1, 0.2).interpretation().risk,
            RiskLevel::Medium
        );
    }
}
