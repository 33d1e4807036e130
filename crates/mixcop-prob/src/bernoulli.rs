//! Bernoulli distribution utilities.

use mixcop_core::{Error, Result};

#[inline]
fn validate_p(p: f64) -> Result<()> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(Error::Validation(format!("p must be finite and in [0,1], got {}", p)));
    }
    Ok(())
}

/// Log-PMF of a Bernoulli distribution at `k ∈ {0, 1}` with success probability `p`.
pub fn logpmf(k: u8, p: f64) -> Result<f64> {
    validate_p(p)?;
    match k {
        0 => Ok((1.0 - p).ln()),
        1 => Ok(p.ln()),
        _ => Err(Error::Validation(format!("k must be 0 or 1, got {}", k))),
    }
}

/// CDF of a Bernoulli distribution: `P(X <= k)`.
///
/// `cdf(0, p) = 1 - p`, and `1` for every `k >= 1`.
pub fn cdf(k: u8, p: f64) -> Result<f64> {
    validate_p(p)?;
    Ok(if k == 0 { 1.0 - p } else { 1.0 })
}
