//! Special functions not covered by `statrs`.

use mixcop_core::{Error, Result};
use statrs::function::beta::{beta_reg, ln_beta};

/// Relative tolerance on `x` for [`inc_beta_inverse`].
const INV_BETA_TOL: f64 = 1e-14;

/// Iteration budget for [`inc_beta_inverse`].
const INV_BETA_MAX_ITER: usize = 200;

/// Starting point for the root-find (Numerical Recipes, `invbetai`).
///
/// Uses a normal approximation when both shapes are `>= 1` and the small-`x` /
/// small-`1 - x` power asymptotes otherwise.
fn initial_guess(p: f64, a: f64, b: f64) -> f64 {
    if a >= 1.0 && b >= 1.0 {
        let pp = if p < 0.5 { p } else { 1.0 - p };
        let t = (-2.0 * pp.ln()).sqrt();
        let mut z = (2.307_53 + t * 0.270_61) / (1.0 + t * (0.992_29 + t * 0.044_81)) - t;
        if p < 0.5 {
            z = -z;
        }
        let al = (z * z - 3.0) / 6.0;
        let h = 2.0 / (1.0 / (2.0 * a - 1.0) + 1.0 / (2.0 * b - 1.0));
        let w = z * (al + h).sqrt() / h
            - (1.0 / (2.0 * b - 1.0) - 1.0 / (2.0 * a - 1.0)) * (al + 5.0 / 6.0 - 2.0 / (3.0 * h));
        a / (a + b * (2.0 * w).exp())
    } else {
        let lna = (a / (a + b)).ln();
        let lnb = (b / (a + b)).ln();
        let t = (a * lna).exp() / a;
        let u = (b * lnb).exp() / b;
        let w = t + u;
        if p < t / w { (a * w * p).powf(1.0 / a) } else { 1.0 - (b * w * (1.0 - p)).powf(1.0 / b) }
    }
}

/// Inverse of the regularized incomplete beta function.
///
/// Returns `x ∈ [0, 1]` with `I_x(a, b) = p`. Newton steps on
/// `I_x(a, b) - p`, bracketed in `[lo, hi]`; a step that leaves the bracket
/// (or a vanishing derivative) falls back to bisection.
pub fn inc_beta_inverse(p: f64, a: f64, b: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::Validation(format!("p must be in [0,1], got {}", p)));
    }
    if !a.is_finite() || a <= 0.0 {
        return Err(Error::Validation(format!("a must be finite and > 0, got {}", a)));
    }
    if !b.is_finite() || b <= 0.0 {
        return Err(Error::Validation(format!("b must be finite and > 0, got {}", b)));
    }
    if p == 0.0 {
        return Ok(0.0);
    }
    if p == 1.0 {
        return Ok(1.0);
    }

    let ln_norm = ln_beta(a, b);
    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    let mut x = initial_guess(p, a, b);
    if !(x > 0.0 && x < 1.0) {
        x = 0.5;
    }

    for _ in 0..INV_BETA_MAX_ITER {
        let f = beta_reg(a, b, x) - p;
        if f == 0.0 {
            return Ok(x);
        }
        if f < 0.0 {
            lo = x;
        } else {
            hi = x;
        }

        let dens = ((a - 1.0) * x.ln() + (b - 1.0) * (-x).ln_1p() - ln_norm).exp();
        let newton = x - f / dens;
        let next = if dens.is_finite() && dens > 0.0 && newton > lo && newton < hi {
            newton
        } else if lo > 0.0 {
            // Geometric midpoint: roots near 0 span many decades.
            (lo * hi).sqrt()
        } else {
            0.5 * hi
        };

        if (next - x).abs() <= INV_BETA_TOL * next || hi - lo <= INV_BETA_TOL * hi {
            return Ok(next);
        }
        x = next;
    }

    log::warn!(
        "inc_beta_inverse: no convergence after {} iterations (p={}, a={}, b={})",
        INV_BETA_MAX_ITER,
        p,
        a,
        b
    );
    Err(Error::Computation(format!(
        "inc_beta_inverse did not converge for p={}, a={}, b={}",
        p, a, b
    )))
}
