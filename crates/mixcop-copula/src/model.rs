//! [`LogDensityModel`] view of a [`MixedCopula`].
//!
//! Flat parameter layout: `[coefficients (ΣK_j)] [sigma (Jn)] [aux (N·(Jb+Jp))]`.
//! The latent Cholesky factor is not a parameter; it is fixed on the model with
//! [`MixedCopula::with_cholesky`].
//!
//! The gradient is a central difference. Coefficients and dispersions move
//! every observation and cost two full evaluations each. An auxiliary uniform
//! only enters its own observation's term, so its difference re-evaluates one
//! observation.

use mixcop_core::{Error, LogDensityModel, Result, TruncatedLogDensity};
use rayon::prelude::*;

use crate::likelihood::{CopulaParams, EvalInputs, LatentBuffers, MixedCopula};

const COEF_BOUNDS: (f64, f64) = (f64::NEG_INFINITY, f64::INFINITY);
const SIGMA_BOUNDS: (f64, f64) = (0.0, f64::INFINITY);
const AUX_BOUNDS: (f64, f64) = (0.0, 1.0);

/// Relative finite-difference step.
const FD_REL_STEP: f64 = 1e-6;

struct ParamSplit<'a> {
    coefficients: &'a [f64],
    sigma: &'a [f64],
    aux: &'a [f64],
}

/// Central-difference step at `x`, shrunk to stay strictly inside `(lo, hi)`.
fn fd_step(x: f64, (lo, hi): (f64, f64)) -> Result<f64> {
    if !x.is_finite() {
        return Err(Error::Validation(format!("parameter must be finite, got {}", x)));
    }
    let mut h = FD_REL_STEP * x.abs().max(1.0);
    if lo.is_finite() {
        h = h.min(0.5 * (x - lo));
    }
    if hi.is_finite() {
        h = h.min(0.5 * (hi - x));
    }
    if !(h > 0.0) {
        return Err(Error::Validation(format!(
            "parameter {} is not inside its bounds ({}, {})",
            x, lo, hi
        )));
    }
    Ok(h)
}

impl<D: TruncatedLogDensity> MixedCopula<D> {
    fn split<'a>(&self, params: &'a [f64]) -> Result<ParamSplit<'a>> {
        let expected = self.dim();
        if params.len() != expected {
            return Err(Error::Validation(format!(
                "expected {} parameters, got {}",
                expected,
                params.len()
            )));
        }
        let (coefficients, rest) = params.split_at(self.n_coefficients());
        let (sigma, aux) = rest.split_at(self.partition.counts().normal);
        Ok(ParamSplit { coefficients, sigma, aux })
    }

    fn n_aux(&self) -> usize {
        self.n_obs() * self.partition.counts().discrete()
    }
}

impl<D: TruncatedLogDensity> LogDensityModel for MixedCopula<D> {
    fn dim(&self) -> usize {
        self.n_coefficients() + self.partition.counts().normal + self.n_aux()
    }

    fn parameter_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.dim());
        let covariates = self.design.covariates();
        for block in self.partition.blocks() {
            for (m, j) in block.range().enumerate() {
                for k in 0..covariates[j] {
                    names.push(format!("{}{}_beta{}", block.family.name(), m + 1, k + 1));
                }
            }
        }
        names.extend((0..self.partition.counts().normal).map(|j| format!("sigma{}", j + 1)));
        let w = self.partition.counts().discrete();
        for i in 0..self.n_obs() {
            names.extend((0..w).map(|k| format!("u{}_{}", i + 1, k + 1)));
        }
        names
    }

    fn parameter_bounds(&self) -> Vec<(f64, f64)> {
        let mut bounds = vec![COEF_BOUNDS; self.n_coefficients()];
        bounds.extend(std::iter::repeat_n(SIGMA_BOUNDS, self.partition.counts().normal));
        bounds.extend(std::iter::repeat_n(AUX_BOUNDS, self.n_aux()));
        bounds
    }

    fn parameter_init(&self) -> Vec<f64> {
        let mut init = vec![0.0; self.n_coefficients()];
        init.extend(std::iter::repeat_n(1.0, self.partition.counts().normal));
        init.extend(std::iter::repeat_n(0.5, self.n_aux()));
        init
    }

    fn nll(&self, params: &[f64]) -> Result<f64> {
        let p = self.split(params)?;
        let ll = self.log_likelihood(&CopulaParams {
            coefficients: p.coefficients,
            sigma: p.sigma,
            aux: p.aux,
            chol: &self.chol,
            tmvn_mean: None,
        })?;
        Ok(-ll)
    }

    fn grad_nll(&self, params: &[f64]) -> Result<Vec<f64>> {
        let p = self.split(params)?;
        let n_global = self.n_coefficients() + p.sigma.len();
        let mut grad = vec![0.0; params.len()];
        let (head, aux_grad) = grad.split_at_mut(n_global);

        let mut work = params.to_vec();
        for (k, g) in head.iter_mut().enumerate() {
            let bounds = if k < self.n_coefficients() { COEF_BOUNDS } else { SIGMA_BOUNDS };
            let x = params[k];
            let h = fd_step(x, bounds)?;
            work[k] = x + h;
            let f1 = self.nll(&work)?;
            work[k] = x - h;
            let f2 = self.nll(&work)?;
            work[k] = x;
            *g = (f1 - f2) / (2.0 * h);
        }

        let w = self.partition.counts().discrete();
        if w > 0 {
            let dim = self.partition.dim();
            let means = self.design.means(p.coefficients, &self.partition)?;
            let chol_t = self.chol.transpose();
            let zeros = vec![0.0; dim];
            let base = EvalInputs {
                partition: &self.partition,
                outcomes: &self.outcomes,
                means: &means,
                sigma: p.sigma,
                aux: p.aux,
                chol: chol_t.as_slice(),
                tmvn_mean: &zeros,
                indicators: &self.indicators,
            };
            base.check()?;

            // The term is a log-density; the gradient is of its negation.
            let fill = |state: &mut (Vec<f64>, LatentBuffers), i: usize, g: &mut [f64]| -> Result<()> {
                let (scratch, buf) = state;
                for (k, gk) in g.iter_mut().enumerate() {
                    let idx = i * w + k;
                    let x = p.aux[idx];
                    let h = fd_step(x, AUX_BOUNDS)?;
                    scratch[idx] = x + h;
                    let f1 = self.observation_term(&EvalInputs { aux: scratch.as_slice(), ..base }, i, buf)?;
                    scratch[idx] = x - h;
                    let f2 = self.observation_term(&EvalInputs { aux: scratch.as_slice(), ..base }, i, buf)?;
                    scratch[idx] = x;
                    *gk = -(f1 - f2) / (2.0 * h);
                }
                Ok(())
            };

            if self.parallel {
                aux_grad.par_chunks_mut(w).enumerate().try_for_each_init(
                    || (p.aux.to_vec(), LatentBuffers::new(dim)),
                    |state, (i, g)| fill(state, i, g),
                )?;
            } else {
                let mut state = (p.aux.to_vec(), LatentBuffers::new(dim));
                for (i, g) in aux_grad.chunks_mut(w).enumerate() {
                    fill(&mut state, i, g)?;
                }
            }
        }

        if let Some(k) = grad.iter().position(|g| !g.is_finite()) {
            return Err(Error::Computation(format!(
                "non-finite gradient entry {} at parameter {}",
                grad[k], k
            )));
        }
        Ok(grad)
    }
}
