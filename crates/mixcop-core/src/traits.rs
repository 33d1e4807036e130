//! Core traits for mixcop
//!
//! The copula accumulator depends on [`TruncatedLogDensity`], not on a concrete
//! truncated multivariate normal routine, so a host can plug in its own.

use crate::Result;

/// Log-density of a truncated multivariate normal over one latent vector.
///
/// `chol` is the lower-triangular Cholesky factor in row-major order
/// (`dim * dim` entries). Bounds are only honoured where the matching
/// indicator is `true`; an inactive bound is "no constraint", which is not the
/// same state as a bound sitting at `±inf`.
pub trait TruncatedLogDensity: Send + Sync {
    /// Log-density of `u` given the truncation region.
    #[allow(clippy::too_many_arguments)]
    fn log_density(
        &self,
        u: &[f64],
        mean: &[f64],
        chol: &[f64],
        lb: &[f64],
        ub: &[f64],
        lb_ind: &[bool],
        ub_ind: &[bool],
    ) -> Result<f64>;

    /// Routine name (for logging).
    fn name(&self) -> &str;
}

/// Model interface for gradient-based hosts (optimizers, HMC/NUTS).
///
/// Parameters are a flat vector in a stable order described by
/// [`LogDensityModel::parameter_names`].
pub trait LogDensityModel: Send + Sync {
    /// Number of parameters.
    fn dim(&self) -> usize;

    /// Parameter names (stable order).
    fn parameter_names(&self) -> Vec<String>;

    /// Parameter bounds (min, max) (stable order).
    fn parameter_bounds(&self) -> Vec<(f64, f64)>;

    /// Suggested initial values (stable order).
    fn parameter_init(&self) -> Vec<f64>;

    /// Negative log-likelihood.
    fn nll(&self, params: &[f64]) -> Result<f64>;

    /// Gradient of NLL.
    fn grad_nll(&self, params: &[f64]) -> Result<Vec<f64>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `0.5 * |x - c|^2`
    struct Quadratic {
        center: Vec<f64>,
    }

    impl LogDensityModel for Quadratic {
        fn dim(&self) -> usize {
            self.center.len()
        }

        fn parameter_names(&self) -> Vec<String> {
            (0..self.dim()).map(|i| format!("x{}", i + 1)).collect()
        }

        fn parameter_bounds(&self) -> Vec<(f64, f64)> {
            vec![(f64::NEG_INFINITY, f64::INFINITY); self.dim()]
        }

        fn parameter_init(&self) -> Vec<f64> {
            vec![0.0; self.dim()]
        }

        fn nll(&self, params: &[f64]) -> Result<f64> {
            Ok(0.5 * params.iter().zip(&self.center).map(|(x, c)| (x - c) * (x - c)).sum::<f64>())
        }

        fn grad_nll(&self, params: &[f64]) -> Result<Vec<f64>> {
            Ok(params.iter().zip(&self.center).map(|(x, c)| x - c).collect())
        }
    }

    #[test]
    fn test_model_trait_object() {
        let m: Box<dyn LogDensityModel> = Box::new(Quadratic { center: vec![1.0, -2.0] });
        assert_eq!(m.dim(), 2);
        assert_eq!(m.parameter_names(), vec!["x1".to_string(), "x2".to_string()]);
        let p = m.parameter_init();
        assert_eq!(m.nll(&p).unwrap(), 2.5);
        assert_eq!(m.grad_nll(&p).unwrap(), vec![-1.0, 2.0]);
    }

    struct Flat;

    impl TruncatedLogDensity for Flat {
        fn log_density(
            &self,
            u: &[f64],
            _mean: &[f64],
            _chol: &[f64],
            _lb: &[f64],
            _ub: &[f64],
            _lb_ind: &[bool],
            _ub_ind: &[bool],
        ) -> Result<f64> {
            Ok(u.len() as f64)
        }

        fn name(&self) -> &str {
            "Flat"
        }
    }

    #[test]
    fn test_trait_object() {
        let d: Box<dyn TruncatedLogDensity> = Box::new(Flat);
        assert_eq!(d.name(), "Flat");
        let lp = d.log_density(&[0.5, 0.5], &[0.0; 2], &[1.0, 0.0, 0.0, 1.0], &[0.0; 2], &[0.0; 2], &[false; 2], &[false; 2]);
        assert_eq!(lp.unwrap(), 2.0);
    }
}
