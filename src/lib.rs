//! Meta-Oracle Library
//!
//! Trust-weighted consensus over pluggable oracles with online reputation
//! and adversarial verification

pub mod config;
pub mod engine;
pub mod error;
pub mod oracle;
pub mod types;

pub use engine::{ConsensusRun, HealthReport, MetaOracleEngine};
pub use error::{OracleError, Result};
pub use oracle::{Oracle, OracleState};
pub use types::{ConsensusResult, OracleRole, Signal, SignalPayload, Verdict};
