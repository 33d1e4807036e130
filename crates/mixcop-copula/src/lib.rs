//! # mixcop-copula
//!
//! Log-likelihood of a Gaussian copula over mixed margins: normal (identity
//! link), Bernoulli (logit link) and Poisson (log link) GLMs. Discrete margins
//! enter through data augmentation: the caller supplies an auxiliary uniform per
//! discrete outcome, and the observed value only fixes the truncation interval
//! of the latent normal.
//!
//! ```text
//! outcomes, X, beta ──► GLM means ──► marginal transforms ──► (u, lb, ub)
//!                                                               │
//!                   cached bound indicators ──► truncated MVN ◄─┘ ──► Σ log
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bounds;
pub mod config;
pub mod data;
pub mod glm;
pub mod likelihood;
pub mod marginals;
pub mod model;
pub mod partition;
pub mod tmvn;

pub use bounds::BoundIndicators;
pub use config::CopulaConfig;
pub use data::{DenseRows, MixedOutcomes};
pub use glm::GlmDesign;
pub use likelihood::{
    CopulaParams, EvalInputs, IndexLoop, LatentAssembler, MixedCopula, MixedStrategy, Segment,
    accumulate, mixed_cop_lp, mixed_cop_sp_lp,
};
pub use partition::{MarginBlock, MarginCounts, MarginFamily, MarginPartition};
pub use tmvn::GhkTruncatedMvn;
