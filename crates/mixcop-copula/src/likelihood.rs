//! Mixed discrete-continuous Gaussian copula log-likelihood.
//!
//! One accumulator sums `log TMVN(u_i; mean, L, lb_i, ub_i)` over observations.
//! How the per-observation latent vector and bounds are filled is a
//! [`LatentAssembler`]:
//!
//! - [`MixedStrategy::IndexLoop`] walks a single cursor over all margins,
//! - [`MixedStrategy::Segment`] hands whole family blocks to the
//!   [`crate::marginals`] helpers.
//!
//! Both produce identical inputs to the density; they differ only in loop shape.

use mixcop_core::{Error, Result, TruncatedLogDensity};
use mixcop_prob::{bernoulli, normal};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bounds::BoundIndicators;
use crate::config::CopulaConfig;
use crate::data::{DenseRows, MixedOutcomes};
use crate::glm::GlmDesign;
use crate::marginals;
use crate::partition::{MarginFamily, MarginPartition};
use crate::tmvn::GhkTruncatedMvn;

/// How latent vectors are assembled from the margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixedStrategy {
    /// Scalar cursor over every margin (`mixed_cop_lp`).
    #[default]
    IndexLoop,
    /// Per-family block helpers (`mixed_cop_sp_lp`).
    Segment,
}

/// Everything one evaluation reads. Borrowed, never copied.
#[derive(Debug, Clone, Copy)]
pub struct EvalInputs<'a> {
    /// Latent layout.
    pub partition: &'a MarginPartition,
    /// Observed outcomes.
    pub outcomes: &'a MixedOutcomes,
    /// GLM means, `N × J_all`.
    pub means: &'a DenseRows<f64>,
    /// Normal-margin dispersions, length `Jn`.
    pub sigma: &'a [f64],
    /// Auxiliary uniforms for discrete margins, `N × (Jb + Jp)` row-major.
    pub aux: &'a [f64],
    /// Cholesky factor of the latent correlation, `J_all × J_all` row-major.
    pub chol: &'a [f64],
    /// Latent mean, length `J_all`.
    pub tmvn_mean: &'a [f64],
    /// Cached bound-active indicators.
    pub indicators: &'a BoundIndicators,
}

impl EvalInputs<'_> {
    /// Shape check; mismatches are reported instead of indexing out of bounds.
    pub(crate) fn check(&self) -> Result<()> {
        let n = self.outcomes.n_obs();
        let counts = self.partition.counts();
        let dim = counts.total();
        let checks = [
            ("outcome counts", self.outcomes.counts().total(), dim),
            ("means rows", self.means.nrows(), n),
            ("means cols", self.means.ncols(), dim),
            ("sigma", self.sigma.len(), counts.normal),
            ("aux", self.aux.len(), n * counts.discrete()),
            ("chol", self.chol.len(), dim * dim),
            ("tmvn_mean", self.tmvn_mean.len(), dim),
            ("indicator rows", self.indicators.dim(), dim),
            ("indicator cols", self.indicators.n_obs(), n),
        ];
        for (what, got, expected) in checks {
            if got != expected {
                return Err(Error::Validation(format!(
                    "{} has wrong size: expected {}, got {}",
                    what, expected, got
                )));
            }
        }
        if self.outcomes.counts() != counts {
            return Err(Error::Validation(format!(
                "outcome counts {:?} do not match partition {:?}",
                self.outcomes.counts(),
                counts
            )));
        }
        Ok(())
    }

    #[inline]
    fn aux_row(&self, i: usize) -> &[f64] {
        let w = self.partition.counts().discrete();
        &self.aux[i * w..(i + 1) * w]
    }
}

/// Per-thread scratch for one latent vector.
#[derive(Debug, Clone)]
pub struct LatentBuffers {
    /// Latent uniforms.
    pub u: Vec<f64>,
    /// Lower bounds on the standard-normal scale.
    pub lb: Vec<f64>,
    /// Upper bounds on the standard-normal scale.
    pub ub: Vec<f64>,
}

impl LatentBuffers {
    /// Buffers for latent dimension `dim`.
    pub fn new(dim: usize) -> Self {
        Self {
            u: vec![0.0; dim],
            lb: vec![f64::NEG_INFINITY; dim],
            ub: vec![f64::INFINITY; dim],
        }
    }
}

/// Fills the latent vector and bounds of observation `i`.
pub trait LatentAssembler: Sync {
    /// Write `u`, `lb`, `ub` for observation `i` into `buf`.
    fn assemble(&self, inputs: &EvalInputs<'_>, i: usize, buf: &mut LatentBuffers) -> Result<()>;
}

/// Scalar cursor assembler.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexLoop;

impl LatentAssembler for IndexLoop {
    fn assemble(&self, inputs: &EvalInputs<'_>, i: usize, buf: &mut LatentBuffers) -> Result<()> {
        let counts = inputs.partition.counts();
        let mu = inputs.means.row(i);
        let aux = inputs.aux_row(i);
        let yn = inputs.outcomes.normal().row(i);
        let yb = inputs.outcomes.bernoulli().row(i);
        let yp = inputs.outcomes.poisson().row(i);

        let mut pos = 0;
        for j in 0..counts.normal {
            let sigma = inputs.sigma[j];
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(Error::Validation(format!("sigma must be finite and > 0, got {}", sigma)));
            }
            buf.u[pos] = normal::cdf((yn[j] - mu[pos]) / sigma);
            buf.lb[pos] = f64::NEG_INFINITY;
            buf.ub[pos] = f64::INFINITY;
            pos += 1;
        }
        for &y in yb.iter().take(counts.bernoulli) {
            let t = normal::quantile(bernoulli::cdf(0, mu[pos])?)?;
            buf.u[pos] = aux[pos - counts.normal];
            (buf.lb[pos], buf.ub[pos]) = if y == 0 { (f64::NEG_INFINITY, t) } else { (t, f64::INFINITY) };
            pos += 1;
        }
        for &y in yp.iter().take(counts.poisson) {
            let lambda = mu[pos];
            buf.u[pos] = aux[pos - counts.normal];
            buf.ub[pos] = marginals::poisson_threshold(y, lambda)?;
            buf.lb[pos] = if y > 0 { marginals::poisson_threshold(y - 1, lambda)? } else { f64::NEG_INFINITY };
            pos += 1;
        }
        Ok(())
    }
}

/// Block assembler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Segment;

impl LatentAssembler for Segment {
    fn assemble(&self, inputs: &EvalInputs<'_>, i: usize, buf: &mut LatentBuffers) -> Result<()> {
        let jn = inputs.partition.counts().normal;
        let mu = inputs.means.row(i);
        let aux = inputs.aux_row(i);
        for block in inputs.partition.blocks() {
            let r = block.range();
            match block.family {
                MarginFamily::Normal => {
                    marginals::normal_block(inputs.outcomes.normal().row(i), &mu[r.clone()], inputs.sigma, &mut buf.u[r.clone()])?;
                    buf.lb[r.clone()].fill(f64::NEG_INFINITY);
                    buf.ub[r].fill(f64::INFINITY);
                }
                MarginFamily::Bernoulli => {
                    buf.u[r.clone()].copy_from_slice(&aux[r.start - jn..r.end - jn]);
                    marginals::bernoulli_block(
                        inputs.outcomes.bernoulli().row(i),
                        &mu[r.clone()],
                        &mut buf.lb[r.clone()],
                        &mut buf.ub[r],
                    )?;
                }
                MarginFamily::Poisson => {
                    buf.u[r.clone()].copy_from_slice(&aux[r.start - jn..r.end - jn]);
                    marginals::poisson_block(
                        inputs.outcomes.poisson().row(i),
                        &mu[r.clone()],
                        &mut buf.lb[r.clone()],
                        &mut buf.ub[r],
                    )?;
                }
            }
        }
        Ok(())
    }
}

/// Log-density term of observation `i` alone. Shapes are assumed checked.
pub(crate) fn observation_log_density<A, D>(
    inputs: &EvalInputs<'_>,
    assembler: &A,
    density: &D,
    i: usize,
    buf: &mut LatentBuffers,
) -> Result<f64>
where
    A: LatentAssembler + ?Sized,
    D: TruncatedLogDensity + ?Sized,
{
    assembler.assemble(inputs, i, buf)?;
    density.log_density(
        &buf.u,
        inputs.tmvn_mean,
        inputs.chol,
        &buf.lb,
        &buf.ub,
        inputs.indicators.lb(i),
        inputs.indicators.ub(i),
    )
}

/// Sum of per-observation truncated-MVN log-densities.
///
/// The first failing observation aborts the evaluation.
pub fn accumulate<A, D>(inputs: &EvalInputs<'_>, assembler: &A, density: &D, parallel: bool) -> Result<f64>
where
    A: LatentAssembler + ?Sized,
    D: TruncatedLogDensity + ?Sized,
{
    inputs.check()?;
    let n = inputs.outcomes.n_obs();
    let dim = inputs.partition.dim();

    let eval = |buf: &mut LatentBuffers, i: usize| observation_log_density(inputs, assembler, density, i, buf);

    let total = if parallel {
        (0..n)
            .into_par_iter()
            .map_init(|| LatentBuffers::new(dim), |buf, i| eval(buf, i))
            .try_reduce(|| 0.0, |a, b| Ok(a + b))?
    } else {
        let mut buf = LatentBuffers::new(dim);
        let mut acc = 0.0;
        for i in 0..n {
            acc += eval(&mut buf, i)?;
        }
        acc
    };
    log::trace!("copula log-likelihood over {} observations ({}): {}", n, density.name(), total);
    Ok(total)
}

/// Copula log-likelihood with the scalar-cursor assembler.
pub fn mixed_cop_lp<D: TruncatedLogDensity + ?Sized>(inputs: &EvalInputs<'_>, density: &D) -> Result<f64> {
    accumulate(inputs, &IndexLoop, density, false)
}

/// Copula log-likelihood with the block assembler.
pub fn mixed_cop_sp_lp<D: TruncatedLogDensity + ?Sized>(inputs: &EvalInputs<'_>, density: &D) -> Result<f64> {
    accumulate(inputs, &Segment, density, false)
}

/// Parameters of one likelihood evaluation.
#[derive(Debug, Clone, Copy)]
pub struct CopulaParams<'a> {
    /// Concatenated GLM coefficients, `ΣK_j` long.
    pub coefficients: &'a [f64],
    /// Normal-margin dispersions, length `Jn`.
    pub sigma: &'a [f64],
    /// Auxiliary uniforms, `N × (Jb + Jp)` row-major.
    pub aux: &'a [f64],
    /// Lower-triangular Cholesky factor of the latent correlation.
    pub chol: &'a DMatrix<f64>,
    /// Latent mean; zero when `None`.
    pub tmvn_mean: Option<&'a [f64]>,
}

/// Mixed copula model bound to a dataset.
///
/// Bound indicators are computed once here and reused by every evaluation.
#[derive(Debug, Clone)]
pub struct MixedCopula<D: TruncatedLogDensity = GhkTruncatedMvn> {
    pub(crate) partition: MarginPartition,
    pub(crate) design: GlmDesign,
    pub(crate) outcomes: MixedOutcomes,
    pub(crate) indicators: BoundIndicators,
    pub(crate) strategy: MixedStrategy,
    pub(crate) parallel: bool,
    pub(crate) density: D,
    /// Fixed latent Cholesky factor used by the [`mixcop_core::LogDensityModel`] view.
    pub(crate) chol: DMatrix<f64>,
}

impl MixedCopula {
    /// Bind `outcomes` and the concatenated design matrix `x` to `config`.
    pub fn new(config: &CopulaConfig, outcomes: MixedOutcomes, x: DMatrix<f64>) -> Result<Self> {
        config.validate()?;
        if outcomes.counts() != config.counts {
            return Err(Error::Validation(format!(
                "outcome counts {:?} do not match config counts {:?}",
                outcomes.counts(),
                config.counts
            )));
        }
        let partition = MarginPartition::new(config.counts);
        let design = GlmDesign::new(x, config.covariates_per_margin.clone(), &partition)?;
        if design.n_obs() != outcomes.n_obs() {
            return Err(Error::Validation(format!(
                "design has {} rows, outcomes have {}",
                design.n_obs(),
                outcomes.n_obs()
            )));
        }
        let indicators = BoundIndicators::build(&outcomes, &partition)?;
        let dim = partition.dim();
        log::debug!(
            "mixed copula: N={} counts={:?} strategy={:?} parallel={}",
            outcomes.n_obs(),
            config.counts,
            config.strategy,
            config.parallel
        );
        Ok(Self {
            partition,
            design,
            outcomes,
            indicators,
            strategy: config.strategy,
            parallel: config.parallel,
            density: GhkTruncatedMvn,
            chol: DMatrix::identity(dim, dim),
        })
    }
}

impl<D: TruncatedLogDensity> MixedCopula<D> {
    /// Swap in another truncated-MVN density.
    pub fn with_density<E: TruncatedLogDensity>(self, density: E) -> MixedCopula<E> {
        MixedCopula {
            partition: self.partition,
            design: self.design,
            outcomes: self.outcomes,
            indicators: self.indicators,
            strategy: self.strategy,
            parallel: self.parallel,
            density,
            chol: self.chol,
        }
    }

    /// Fix the latent Cholesky factor seen through [`mixcop_core::LogDensityModel`].
    ///
    /// Must be `J_all × J_all`; the default is the identity.
    pub fn with_cholesky(mut self, chol: DMatrix<f64>) -> Result<Self> {
        self.check_cholesky(&chol)?;
        self.chol = chol;
        Ok(self)
    }

    /// Cholesky factor used by [`mixcop_core::LogDensityModel::nll`].
    pub fn cholesky(&self) -> &DMatrix<f64> {
        &self.chol
    }

    fn check_cholesky(&self, chol: &DMatrix<f64>) -> Result<()> {
        let dim = self.partition.dim();
        if chol.nrows() != dim || chol.ncols() != dim {
            return Err(Error::Validation(format!(
                "chol must be {}x{}, got {}x{}",
                dim,
                dim,
                chol.nrows(),
                chol.ncols()
            )));
        }
        Ok(())
    }

    /// Override the strategy.
    pub fn with_strategy(mut self, strategy: MixedStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Toggle rayon evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Latent layout.
    pub fn partition(&self) -> &MarginPartition {
        &self.partition
    }

    /// Cached bound indicators.
    pub fn indicators(&self) -> &BoundIndicators {
        &self.indicators
    }

    /// Number of observations.
    pub fn n_obs(&self) -> usize {
        self.outcomes.n_obs()
    }

    /// Number of GLM coefficients.
    pub fn n_coefficients(&self) -> usize {
        self.design.n_coefficients()
    }

    /// Active strategy.
    pub fn strategy(&self) -> MixedStrategy {
        self.strategy
    }

    /// Copula log-likelihood at `params`.
    pub fn log_likelihood(&self, params: &CopulaParams<'_>) -> Result<f64> {
        self.check_cholesky(params.chol)?;
        let dim = self.partition.dim();
        let means = self.design.means(params.coefficients, &self.partition)?;
        // nalgebra storage is column-major; the transpose's storage is L row-major.
        let chol_t = params.chol.transpose();
        let zeros;
        let tmvn_mean = match params.tmvn_mean {
            Some(m) => m,
            None => {
                zeros = vec![0.0; dim];
                zeros.as_slice()
            }
        };
        let inputs = EvalInputs {
            partition: &self.partition,
            outcomes: &self.outcomes,
            means: &means,
            sigma: params.sigma,
            aux: params.aux,
            chol: chol_t.as_slice(),
            tmvn_mean,
            indicators: &self.indicators,
        };
        match self.strategy {
            MixedStrategy::IndexLoop => accumulate(&inputs, &IndexLoop, &self.density, self.parallel),
            MixedStrategy::Segment => accumulate(&inputs, &Segment, &self.density, self.parallel),
        }
    }

    /// Log-density term of observation `i` under the active strategy.
    pub(crate) fn observation_term(&self, inputs: &EvalInputs<'_>, i: usize, buf: &mut LatentBuffers) -> Result<f64> {
        match self.strategy {
            MixedStrategy::IndexLoop => observation_log_density(inputs, &IndexLoop, &self.density, i, buf),
            MixedStrategy::Segment => observation_log_density(inputs, &Segment, &self.density, i, buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::MarginCounts;
    use approx::assert_relative_eq;

    fn scenario() -> (MixedCopula, Vec<f64>) {
        // N = 1, one Bernoulli margin, y = 1, intercept-only with eta = 0 (p = 0.5)
        let outcomes = MixedOutcomes::new(vec![], vec![vec![1]], vec![]).unwrap();
        let cfg = CopulaConfig::new(MarginCounts::new(0, 1, 0), vec![1]);
        let model = MixedCopula::new(&cfg, outcomes, DMatrix::from_element(1, 1, 1.0)).unwrap();
        (model, vec![0.0])
    }

    #[test]
    fn test_single_bernoulli_scenario() {
        let (model, beta) = scenario();
        assert_eq!(model.indicators().lb(0), &[true]);
        assert_eq!(model.indicators().ub(0), &[false]);

        let means = model.design.means(&beta, &model.partition).unwrap();
        let inputs = EvalInputs {
            partition: &model.partition,
            outcomes: &model.outcomes,
            means: &means,
            sigma: &[],
            aux: &[0.3],
            chol: &[1.0],
            tmvn_mean: &[0.0],
            indicators: &model.indicators,
        };
        for asm in [&IndexLoop as &dyn LatentAssembler, &Segment] {
            let mut buf = LatentBuffers::new(1);
            asm.assemble(&inputs, 0, &mut buf).unwrap();
            assert_eq!(buf.lb[0], 0.0);
            assert_eq!(buf.ub[0], f64::INFINITY);
            assert_eq!(buf.u[0], 0.3);
        }

        let chol = DMatrix::identity(1, 1);
        let lp = model
            .log_likelihood(&CopulaParams { coefficients: &beta, sigma: &[], aux: &[0.3], chol: &chol, tmvn_mean: None })
            .unwrap();
        assert_relative_eq!(lp, 0.5f64.ln(), epsilon = 1e-14);
    }

    #[test]
    fn test_shape_mismatch_is_error() {
        let (model, beta) = scenario();
        let chol = DMatrix::identity(2, 2);
        assert!(model
            .log_likelihood(&CopulaParams { coefficients: &beta, sigma: &[], aux: &[0.3], chol: &chol, tmvn_mean: None })
            .is_err());
        let chol = DMatrix::identity(1, 1);
        assert!(model
            .log_likelihood(&CopulaParams { coefficients: &beta, sigma: &[], aux: &[], chol: &chol, tmvn_mean: None })
            .is_err());
    }

    #[test]
    fn test_bad_cholesky_diagonal_is_error() {
        let (model, beta) = scenario();
        let chol = DMatrix::from_element(1, 1, -1.0);
        let err = model
            .log_likelihood(&CopulaParams { coefficients: &beta, sigma: &[], aux: &[0.3], chol: &chol, tmvn_mean: None })
            .unwrap_err();
        assert!(err.is_domain_violation());
    }

    #[test]
    fn test_new_rejects_mismatched_counts() {
        let outcomes = MixedOutcomes::new(vec![vec![0.1]], vec![], vec![]).unwrap();
        let cfg = CopulaConfig::new(MarginCounts::new(0, 1, 0), vec![1]);
        assert!(MixedCopula::new(&cfg, outcomes.clone(), DMatrix::from_element(1, 1, 1.0)).is_err());
        let cfg = CopulaConfig::new(MarginCounts::new(1, 0, 0), vec![1]);
        assert!(MixedCopula::new(&cfg, outcomes, DMatrix::from_element(2, 1, 1.0)).is_err());
    }

    #[test]
    fn test_strategy_serde() {
        assert_eq!(serde_json::to_string(&MixedStrategy::Segment).unwrap(), "\"segment\"");
        let s: MixedStrategy = serde_json::from_str("\"index_loop\"").unwrap();
        assert_eq!(s, MixedStrategy::IndexLoop);
    }
}
