//! Small numerically-stable math utilities used across probability code.

/// Smallest probability a link function hands out.
///
/// Keeps `inv_Phi(1 - p)` finite for Bernoulli margins with extreme linear
/// predictors.
pub const MIN_PROB: f64 = 1e-15;

/// Stable sigmoid: `1 / (1 + exp(-x))`.
///
/// Branchless core: single `exp(-|x|)`, then `cmov` for the sign flip.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    let abs_x = x.abs();
    let e = (-abs_x).exp();
    let recip = 1.0 / (1.0 + e);
    // x >= 0: sigmoid = 1/(1+exp(-x)) = recip
    // x <  0: sigmoid = exp(x)/(1+exp(x)) = e/(1+e) = e*recip
    if x >= 0.0 { recip } else { e * recip }
}

/// Sigmoid clamped to the open interval `[MIN_PROB, 1 - MIN_PROB]`.
///
/// For `|x| > 37` the plain sigmoid rounds to exactly `0` or `1`, which would
/// put a Bernoulli bound at `±inf`.
#[inline]
pub fn prob_clamped(x: f64) -> f64 {
    sigmoid(x).clamp(MIN_PROB, 1.0 - MIN_PROB)
}

/// Exponential with a conservative clamp to avoid overflow.
///
/// For `x > 700`, `exp(x)` can overflow to `inf`; for `x < -700` it underflows
/// to `0`, which is not a valid Poisson rate.
#[inline]
pub fn exp_clamped(x: f64) -> f64 {
    x.clamp(-700.0, 700.0).exp()
}

/// Sign with `0` mapped to `+1`.
#[inline]
pub fn sign_nonneg(x: f64) -> f64 {
    if x < 0.0 { -1.0 } else { 1.0 }
}
