//! Probability-integral transforms from margins to the latent normal scale.
//!
//! A normal margin maps to a deterministic uniform `Phi((y - mu) / sigma)`.
//! A discrete margin maps to a `(lb, ub)` interval on the standard-normal
//! scale; the latent uniform inside it is supplied by the caller.

use mixcop_core::{Error, Result};
use mixcop_prob::{bernoulli, normal, poisson};

/// Latent uniform for one normal margin.
#[inline]
pub fn normal_uniform(y: f64, mu: f64, sigma: f64) -> Result<f64> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(Error::Validation(format!("sigma must be finite and > 0, got {}", sigma)));
    }
    Ok(normal::cdf((y - mu) / sigma))
}

/// Bounds for one Bernoulli margin with success probability `p`.
///
/// The threshold is `inv_Phi(1 - p)`: `y = 0` gets `(-inf, t]`, `y = 1` gets `[t, inf)`.
#[inline]
pub fn bernoulli_bounds(y: u8, p: f64) -> Result<(f64, f64)> {
    let t = normal::quantile(bernoulli::cdf(0, p)?)?;
    match y {
        0 => Ok((f64::NEG_INFINITY, t)),
        1 => Ok((t, f64::INFINITY)),
        _ => Err(Error::Validation(format!("Bernoulli outcome must be 0 or 1, got {}", y))),
    }
}

/// Latent threshold `inv_Phi(P(X <= k))` for a Poisson count.
///
/// Above the median the threshold is taken from the survival function,
/// `-inv_Phi(P(X > k))`; the CDF itself rounds to `1` for counts far above
/// `lambda`, which would collapse both bounds to `+inf`.
#[inline]
pub fn poisson_threshold(k: u64, lambda: f64) -> Result<f64> {
    let c = poisson::cdf(k, lambda)?;
    if c > 0.5 {
        Ok(-normal::quantile(poisson::sf(k, lambda)?.clamp(0.0, 1.0))?)
    } else {
        normal::quantile(c.clamp(0.0, 1.0))
    }
}

/// Bounds for one Poisson margin with rate `lambda`.
#[inline]
pub fn poisson_bounds(y: u64, lambda: f64) -> Result<(f64, f64)> {
    let ub = poisson_threshold(y, lambda)?;
    let lb = if y > 0 { poisson_threshold(y - 1, lambda)? } else { f64::NEG_INFINITY };
    Ok((lb, ub))
}

/// Normal block: writes `Phi((y - mu) / sigma)` into `out`.
pub fn normal_block(y: &[f64], mu: &[f64], sigma: &[f64], out: &mut [f64]) -> Result<()> {
    for (((o, &y), &m), &s) in out.iter_mut().zip(y).zip(mu).zip(sigma) {
        *o = normal_uniform(y, m, s)?;
    }
    Ok(())
}

/// Bernoulli block: fills `lb`/`ub` from outcomes and success probabilities.
pub fn bernoulli_block(y: &[u8], p: &[f64], lb: &mut [f64], ub: &mut [f64]) -> Result<()> {
    for (((l, u), &y), &p) in lb.iter_mut().zip(ub.iter_mut()).zip(y).zip(p) {
        (*l, *u) = bernoulli_bounds(y, p)?;
    }
    Ok(())
}

/// Poisson block: fills `lb`/`ub` from counts and rates.
pub fn poisson_block(y: &[u64], lambda: &[f64], lb: &mut [f64], ub: &mut [f64]) -> Result<()> {
    for (((l, u), &y), &rate) in lb.iter_mut().zip(ub.iter_mut()).zip(y).zip(lambda) {
        (*l, *u) = poisson_bounds(y, rate)?;
    }
    Ok(())
}
