//! Oracle registry - participants keyed by id, partitioned by role

use std::sync::Arc;

use crate::oracle::{Oracle, OracleState};
use crate::types::OracleRole;

/// A registered oracle together with its reputation
#[derive(Clone)]
pub struct RegisteredOracle {
    pub oracle: Arc<dyn Oracle>,
    pub state: OracleState,
}

impl RegisteredOracle {
    pub fn id(&self) -> &str {
        self.oracle.id()
    }

    pub fn role(&self) -> OracleRole {
        self.oracle.role()
    }
}

impl std::fmt::Debug for RegisteredOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredOracle")
            .field("id", &self.id())
            .field("role", &self.role())
            .field("state", &self.state)
            .finish()
    }
}

/// Registered oracles in registration order
#[derive(Debug, Default)]
pub struct OracleRegistry {
    entries: Vec<RegisteredOracle>,
}

impl OracleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register with fresh reputation. Returns true if an oracle with the same id was replaced.
    pub fn register(&mut self, oracle: Arc<dyn Oracle>) -> bool {
        self.register_with_state(oracle, OracleState::default())
    }

    /// Register with the given reputation, pulled back inside the weight floor and
    /// accuracy range first.
    pub fn register_with_state(&mut self, oracle: Arc<dyn Oracle>, state: OracleState) -> bool {
        let entry = RegisteredOracle {
            oracle,
            state: OracleState::new(state.weight, state.accuracy),
        };
        match self.entries.iter_mut().find(|e| e.id() == entry.id()) {
            Some(existing) => {
                *existing = entry;
                true
            }
            None => {
                self.entries.push(entry);
                false
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&RegisteredOracle> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn by_role(&self, role: OracleRole) -> impl Iterator<Item = &RegisteredOracle> {
        self.entries.iter().filter(move |e| e.role() == role)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredOracle> {
        self.entries.iter()
    }

    pub fn states_mut(&mut self) -> impl Iterator<Item = &mut OracleState> {
        self.entries.iter_mut().map(|e| &mut e.state)
    }

    /// Owned copy of every participant, for one pipeline run
    pub fn snapshot(&self) -> Vec<RegisteredOracle> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
