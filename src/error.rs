//! Error types for the consensus engine

use thiserror::Error;

use crate::types::OracleRole;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("oracle {oracle_id} timed out after {timeout_ms}ms in {phase} phase")]
    Timeout {
        oracle_id: String,
        phase: OracleRole,
        timeout_ms: u64,
    },

    #[error("data source unavailable: {source_name} - {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error("a consensus run or outcome report is in progress")]
    RunInProgress,

    #[error("invalid outcome {0}: must lie in [0, 1]")]
    InvalidOutcome(f64),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, OracleError>;

impl OracleError {
    pub fn source_unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn contract_violation(message: impl Into<String>) -> Self {
        Self::ContractViolation(message.into())
    }
}
