//! Poisson distribution utilities.

use mixcop_core::{Error, Result};
use statrs::function::gamma::{gamma_lr, gamma_ur, ln_gamma};

#[inline]
fn validate_lambda(lambda: f64) -> Result<()> {
    if !lambda.is_finite() || lambda <= 0.0 {
        return Err(Error::Validation(format!("lambda must be finite and > 0, got {}", lambda)));
    }
    Ok(())
}

/// Log-PMF of a Poisson distribution at count `k` with rate `lambda`.
pub fn logpmf(k: u64, lambda: f64) -> Result<f64> {
    validate_lambda(lambda)?;
    let kf = k as f64;
    Ok(kf * lambda.ln() - lambda - ln_gamma(kf + 1.0))
}

/// CDF of a Poisson distribution: `P(X <= k) = Q(k + 1, lambda)`.
///
/// `Q` is the regularized upper incomplete gamma function.
pub fn cdf(k: u64, lambda: f64) -> Result<f64> {
    validate_lambda(lambda)?;
    Ok(gamma_ur(k as f64 + 1.0, lambda))
}

/// Survival function `P(X > k) = P(k + 1, lambda)`.
///
/// `P` is the regularized lower incomplete gamma function; unlike `1 - cdf` it
/// keeps full relative precision in the upper tail.
pub fn sf(k: u64, lambda: f64) -> Result<f64> {
    validate_lambda(lambda)?;
    Ok(gamma_lr(k as f64 + 1.0, lambda))
}
