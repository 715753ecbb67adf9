//! # Reasoner Configuration
//!
//! TOML-backed settings for saturation and classification

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::order::OrderPolicy;
use crate::{ReasonerError, Result};

/// Reasoner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Rule order: `0,1,2,3,4`, `20134`, `random` or `random:SEED`
    pub order: String,

    /// Seed for `order = "random"`
    pub seed: Option<u64>,

    /// Stop after this many rounds even if the fixpoint has not been reached
    pub max_rounds: Option<usize>,

    /// Worker threads for classification (rayon default when unset)
    pub threads: Option<usize>,

    /// Skip non-EL axioms instead of rejecting the ontology
    pub lenient: bool,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            order: "0,1,2,3,4".to_string(),
            seed: None,
            max_rounds: None,
            threads: None,
            lenient: false,
        }
    }
}

impl ReasonerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| ReasonerError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ReasonerError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    /// Parse the configured order; a bare `random` takes `seed` when set
    pub fn order_policy(&self) -> Result<OrderPolicy> {
        match (self.order.trim(), self.seed) {
            ("random", Some(seed)) => Ok(OrderPolicy::randomized(seed)),
            (order, _) => order.parse(),
        }
    }
}
