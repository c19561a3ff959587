//! Health Reporter - read-only projection of oracle reputation

use serde::Serialize;
use std::fmt;

use crate::engine::registry::OracleRegistry;
use crate::types::OracleRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OracleStatus {
    Elite,
    Healthy,
    Stable,
    Degraded,
    Critical,
}

impl OracleStatus {
    pub fn classify(weight: f64, accuracy: f64) -> Self {
        if weight > 1.5 && accuracy > 0.7 {
            OracleStatus::Elite
        } else if weight > 1.0 && accuracy > 0.6 {
            OracleStatus::Healthy
        } else if weight > 0.5 && accuracy > 0.4 {
            OracleStatus::Stable
        } else if weight > 0.2 {
            OracleStatus::Degraded
        } else {
            OracleStatus::Critical
        }
    }
}

impl fmt::Display for OracleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OracleStatus::Elite => "ELITE",
            OracleStatus::Healthy => "HEALTHY",
            OracleStatus::Stable => "STABLE",
            OracleStatus::Degraded => "DEGRADED",
            OracleStatus::Critical => "CRITICAL",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NetworkStatus {
    Optimal,
    Stable,
    Unstable,
    Critical,
}

impl NetworkStatus {
    pub fn classify(avg_accuracy: f64, stability: f64) -> Self {
        if avg_accuracy > 0.7 && stability > 0.6 {
            NetworkStatus::Optimal
        } else if avg_accuracy > 0.6 && stability > 0.4 {
            NetworkStatus::Stable
        } else if avg_accuracy > 0.4 {
            NetworkStatus::Unstable
        } else {
            NetworkStatus::Critical
        }
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NetworkStatus::Optimal => "OPTIMAL",
            NetworkStatus::Stable => "STABLE",
            NetworkStatus::Unstable => "UNSTABLE",
            NetworkStatus::Critical => "CRITICAL",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OracleHealth {
    pub id: String,
    pub role: OracleRole,
    pub weight: f64,
    pub accuracy: f64,
    pub status: OracleStatus,
    /// Share of total weight (0.0 - 1.0)
    pub influence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkHealth {
    pub total_oracles: usize,
    pub avg_accuracy: f64,
    /// min(weight) / max(weight)
    pub stability: f64,
    pub status: NetworkStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub oracles: Vec<OracleHealth>,
    pub network: NetworkHealth,
}

impl HealthReport {
    pub fn from_registry(registry: &OracleRegistry) -> Self {
        let total_weight: f64 = registry.iter().map(|e| e.state.weight).sum();

        let oracles: Vec<OracleHealth> = registry
            .iter()
            .map(|e| OracleHealth {
                id: e.id().to_string(),
                role: e.role(),
                weight: e.state.weight,
                accuracy: e.state.accuracy,
                status: OracleStatus::classify(e.state.weight, e.state.accuracy),
                influence: if total_weight > 0.0 {
                    e.state.weight / total_weight
                } else {
                    0.0
                },
            })
            .collect();

        let network = if oracles.is_empty() {
            NetworkHealth {
                total_oracles: 0,
                avg_accuracy: 0.0,
                stability: 0.0,
                status: NetworkStatus::Critical,
            }
        } else {
            let n = oracles.len() as f64;
            let avg_accuracy = oracles.iter().map(|o| o.accuracy).sum::<f64>() / n;
            let weights = || oracles.iter().map(|o| o.weight);
            let min = weights().fold(f64::INFINITY, f64::min);
            let max = weights().fold(f64::NEG_INFINITY, f64::max);
            let stability = min / max;
            NetworkHealth {
                total_oracles: oracles.len(),
                avg_accuracy,
                stability,
                status: NetworkStatus::classify(avg_accuracy, stability),
            }
        };

        Self { oracles, network }
    }
}
