//! Standard normal utilities: density, CDF (`Phi`), fast CDF (`Phi_approx`)
//! and quantile (`inv_Phi`).

use mixcop_core::{Error, Result};
use statrs::function::erf::{erfc, erfc_inv};

use crate::math::sigmoid;

/// Natural log of `sqrt(2π)`.
const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_7;

/// `1 / sqrt(2π)`.
const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Log-PDF of a Normal distribution `N(mu, sigma)` at `x`.
///
/// `log p(x) = -0.5 * ((x-mu)/sigma)^2 - ln(sigma) - ln(sqrt(2π))`
pub fn logpdf(x: f64, mu: f64, sigma: f64) -> Result<f64> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(Error::Validation(format!("sigma must be finite and > 0, got {}", sigma)));
    }
    let z = (x - mu) / sigma;
    Ok(std_logpdf(z) - sigma.ln())
}

/// Log-PDF of the standard normal at `z`.
#[inline]
pub fn std_logpdf(z: f64) -> f64 {
    -0.5 * z * z - LN_SQRT_2PI
}

/// Standard normal density `phi(z)`.
#[inline]
pub fn phi(z: f64) -> f64 {
    (-0.5 * z * z).exp() * INV_SQRT_2PI
}

/// Standard normal CDF `Phi(z)`.
///
/// `Phi(z) = 0.5 * erfc(-z / sqrt(2))`; `erfc` keeps the lower tail accurate.
#[inline]
pub fn cdf(z: f64) -> f64 {
    0.5 * erfc(-z / std::f64::consts::SQRT_2)
}

/// Logistic approximation of `Phi`: `sigmoid(0.07056 z^3 + 1.5976 z)`.
///
/// Maximum absolute error is about `1.4e-4`.
#[inline]
pub fn cdf_approx(z: f64) -> f64 {
    sigmoid(0.07056 * z * z * z + 1.5976 * z)
}

/// Log of the standard normal CDF.
///
/// Switches to the asymptotic expansion once `Phi(z)` underflows.
pub fn lcdf(z: f64) -> f64 {
    if z > -37.0 {
        return cdf(z).ln();
    }
    if z == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    // Phi(z) ~ phi(z)/(-z) * (1 - 1/z^2 + 3/z^4)
    let z2 = z * z;
    std_logpdf(z) - (-z).ln() + (-1.0 / z2 + 3.0 / (z2 * z2)).ln_1p()
}

/// Standard normal quantile `inv_Phi(p)`.
///
/// `p = 0` maps to `-inf` and `p = 1` to `+inf`.
pub fn quantile(p: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::Validation(format!("p must be in [0,1], got {}", p)));
    }
    if p == 0.0 {
        return Ok(f64::NEG_INFINITY);
    }
    if p == 1.0 {
        return Ok(f64::INFINITY);
    }
    Ok(-std::f64::consts::SQRT_2 * erfc_inv(2.0 * p))
}
