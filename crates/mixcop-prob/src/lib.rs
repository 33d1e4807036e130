//! Probability building blocks for mixcop.
//!
//! This crate hosts the scalar math the copula likelihood is assembled from:
//! - standard normal density / CDF / quantile (`Phi`, `Phi_approx`, `inv_Phi`)
//! - discrete CDFs for Bernoulli and Poisson margins
//! - the inverse regularized incomplete beta function
//! - closed-form densities: Frank copula, Skew Generalized T

pub mod bernoulli;
pub mod frank;
pub mod math;
pub mod normal;
pub mod poisson;
pub mod sgt;
pub mod special;

pub use sgt::SgtOptions;
