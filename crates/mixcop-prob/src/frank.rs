//! Frank copula.
//!
//! `C(u, v; θ) = -(1/θ) ln(1 + (e^{-θu} - 1)(e^{-θv} - 1) / (e^{-θ} - 1))`, `θ ≠ 0`.

use mixcop_core::{Error, Result};

#[inline]
fn validate(u: f64, v: f64, theta: f64) -> Result<()> {
    if !theta.is_finite() || theta == 0.0 {
        return Err(Error::Validation(format!("theta must be finite and != 0, got {}", theta)));
    }
    if !(0.0..=1.0).contains(&u) {
        return Err(Error::Validation(format!("u must be in [0,1], got {}", u)));
    }
    if !(0.0..=1.0).contains(&v) {
        return Err(Error::Validation(format!("v must be in [0,1], got {}", v)));
    }
    Ok(())
}

/// Log-density of the Frank copula at `(u, v)`.
///
/// `c(u, v) = θ (1 - e^{-θ}) e^{-θ(u+v)} / [(1 - e^{-θ}) - (1 - e^{-θu})(1 - e^{-θv})]^2`
///
/// Written with `expm1` so it stays accurate for small `|θ|`; `θ (1 - e^{-θ})`
/// is positive for either sign of `θ`.
pub fn logpdf(u: f64, v: f64, theta: f64) -> Result<f64> {
    validate(u, v, theta)?;
    let one_m_e = -(-theta).exp_m1();
    let den = one_m_e - (-theta * u).exp_m1() * (-theta * v).exp_m1();
    Ok((theta * one_m_e).ln() - theta * (u + v) - 2.0 * den.abs().ln())
}

/// Sum of [`logpdf`] over paired samples `(us[i], vs[i])`.
pub fn logpdf_sum(us: &[f64], vs: &[f64], theta: f64) -> Result<f64> {
    if us.len() != vs.len() {
        return Err(Error::Validation(format!(
            "u and v must have equal length, got {} and {}",
            us.len(),
            vs.len()
        )));
    }
    let mut acc = 0.0;
    for (&u, &v) in us.iter().zip(vs) {
        acc += logpdf(u, v, theta)?;
    }
    Ok(acc)
}

/// Frank copula CDF `C(u, v; θ)`.
pub fn cdf(u: f64, v: f64, theta: f64) -> Result<f64> {
    validate(u, v, theta)?;
    let ratio = (-theta * u).exp_m1() * (-theta * v).exp_m1() / (-theta).exp_m1();
    Ok(-ratio.ln_1p() / theta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn density_naive(u: f64, v: f64, theta: f64) -> f64 {
        let e = |x: f64| (-theta * x).exp();
        let num = theta * (1.0 - e(1.0)) * e(u + v);
        let den = (1.0 - e(1.0)) - (1.0 - e(u)) * (1.0 - e(v));
        num / (den * den)
    }

    #[test]
    fn test_center_value_theta_two() {
        // theta = 2, u = v = 0.5:
        // num = 2 (1 - e^-2) e^-2, den = (1 - e^-2) - (1 - e^-1)^2
        let e1 = (-1.0f64).exp();
        let e2 = (-2.0f64).exp();
        let den = (1.0 - e2) - (1.0 - e1) * (1.0 - e1);
        let expected = 2.0 * (1.0 - e2) * e2 / (den * den);
        let lp = logpdf(0.5, 0.5, 2.0).unwrap();
        assert_abs_diff_eq!(lp.exp(), expected, epsilon = 1e-10);
    }

    #[test]
    fn test_matches_naive_formula() {
        for &theta in &[-5.0, -0.7, 0.3, 2.0, 9.0] {
            for &(u, v) in &[(0.1, 0.9), (0.25, 0.3), (0.8, 0.75)] {
                let lp = logpdf(u, v, theta).unwrap();
                assert_relative_eq!(lp, density_naive(u, v, theta).ln(), max_relative = 1e-10);
            }
        }
    }

    #[test]
    fn test_exchangeable() {
        let a = logpdf(0.2, 0.7, 3.5).unwrap();
        let b = logpdf(0.7, 0.2, 3.5).unwrap();
        assert_relative_eq!(a, b, epsilon = 1e-14);
    }

    #[test]
    fn test_cdf_margins_are_uniform() {
        for &theta in &[-4.0, 1.5, 8.0] {
            for &u in &[0.1, 0.5, 0.9] {
                assert_abs_diff_eq!(cdf(u, 1.0, theta).unwrap(), u, epsilon = 1e-12);
                assert_abs_diff_eq!(cdf(0.0, u, theta).unwrap(), 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_sum_and_invalid() {
        let s = logpdf_sum(&[0.2, 0.6], &[0.3, 0.4], 1.2).unwrap();
        let direct = logpdf(0.2, 0.3, 1.2).unwrap() + logpdf(0.6, 0.4, 1.2).unwrap();
        assert_relative_eq!(s, direct, epsilon = 1e-14);
        assert!(logpdf_sum(&[0.2], &[0.3, 0.4], 1.2).is_err());
        assert!(logpdf(0.5, 0.5, 0.0).is_err());
        assert!(logpdf(0.5, 0.5, f64::INFINITY).is_err());
        assert!(logpdf(1.5, 0.5, 2.0).is_err());
        assert!(cdf(0.5, -0.1, 2.0).is_err());
    }
}
