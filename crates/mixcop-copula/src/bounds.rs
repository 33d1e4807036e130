//! Bound-active indicators.
//!
//! Which truncation bounds are real constraints depends only on the observed
//! discrete outcomes, so the indicators are built once per dataset and shared
//! read-only by every likelihood evaluation.

use mixcop_core::{Error, Result};

use crate::data::MixedOutcomes;
use crate::partition::{MarginFamily, MarginPartition};

/// Lower/upper bound-active flags, one `J_all`-long column per observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundIndicators {
    dim: usize,
    n: usize,
    lb: Vec<bool>,
    ub: Vec<bool>,
}

impl BoundIndicators {
    /// Build the indicators for `outcomes`.
    ///
    /// - normal: neither bound,
    /// - Bernoulli: `y = 0` → upper only, `y = 1` → lower only,
    /// - Poisson: upper always, lower when `y > 0`.
    pub fn build(outcomes: &MixedOutcomes, partition: &MarginPartition) -> Result<Self> {
        if outcomes.counts() != partition.counts() {
            return Err(Error::Validation(format!(
                "outcome counts {:?} do not match partition {:?}",
                outcomes.counts(),
                partition.counts()
            )));
        }
        let dim = partition.dim();
        let n = outcomes.n_obs();
        let mut lb = vec![false; dim * n];
        let mut ub = vec![false; dim * n];
        for i in 0..n {
            let lb_i = &mut lb[i * dim..(i + 1) * dim];
            let ub_i = &mut ub[i * dim..(i + 1) * dim];
            for block in partition.blocks() {
                match block.family {
                    MarginFamily::Normal => {}
                    MarginFamily::Bernoulli => {
                        for (j, &y) in outcomes.bernoulli().row(i).iter().enumerate() {
                            let c = block.start + j;
                            if y == 0 {
                                ub_i[c] = true;
                            } else {
                                lb_i[c] = true;
                            }
                        }
                    }
                    MarginFamily::Poisson => {
                        for (j, &y) in outcomes.poisson().row(i).iter().enumerate() {
                            let c = block.start + j;
                            ub_i[c] = true;
                            lb_i[c] = y > 0;
                        }
                    }
                }
            }
        }
        Ok(Self { dim, n, lb, ub })
    }

    /// Latent dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of observations.
    #[inline]
    pub fn n_obs(&self) -> usize {
        self.n
    }

    /// Lower-bound flags for observation `i`.
    #[inline]
    pub fn lb(&self, i: usize) -> &[bool] {
        &self.lb[i * self.dim..(i + 1) * self.dim]
    }

    /// Upper-bound flags for observation `i`.
    #[inline]
    pub fn ub(&self, i: usize) -> &[bool] {
        &self.ub[i * self.dim..(i + 1) * self.dim]
    }
}
