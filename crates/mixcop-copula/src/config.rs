//! Copula model configuration.

use mixcop_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::likelihood::MixedStrategy;
use crate::partition::MarginCounts;

/// Static description of a mixed copula model.
///
/// ```json
/// {
///   "counts": { "normal": 1, "bernoulli": 2, "poisson": 0 },
///   "covariates_per_margin": [2, 2, 1],
///   "strategy": "segment",
///   "parallel": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopulaConfig {
    /// Margin counts `(Jn, Jb, Jp)`.
    pub counts: MarginCounts,
    /// Covariates `K_j` per margin, in latent order.
    pub covariates_per_margin: Vec<usize>,
    /// Marginal assembly strategy.
    #[serde(default)]
    pub strategy: MixedStrategy,
    /// Evaluate observations on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

impl CopulaConfig {
    /// Config with the default strategy, sequential.
    pub fn new(counts: MarginCounts, covariates_per_margin: Vec<usize>) -> Self {
        Self { counts, covariates_per_margin, strategy: MixedStrategy::default(), parallel: false }
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.counts.total() == 0 {
            return Err(Error::Validation("model must have at least one margin".to_string()));
        }
        if self.covariates_per_margin.len() != self.counts.total() {
            return Err(Error::Validation(format!(
                "covariates_per_margin length must equal J_all={}, got {}",
                self.counts.total(),
                self.covariates_per_margin.len()
            )));
        }
        Ok(())
    }

    /// Builder: pick a strategy.
    pub fn with_strategy(mut self, strategy: MixedStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Builder: toggle parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
