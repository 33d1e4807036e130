//! GLM mean builder.
//!
//! Each margin `j` owns a contiguous block of `K_j` design columns and the
//! matching `K_j` coefficients; blocks are concatenated in latent-vector order.
//! The margin mean is the family's inverse link applied to the block's linear
//! predictor.

use mixcop_core::{Error, Result};
use nalgebra::{DMatrix, DVectorView};

use crate::data::DenseRows;
use crate::partition::{MarginCounts, MarginPartition};

/// Concatenated per-margin design matrix.
#[derive(Debug, Clone)]
pub struct GlmDesign {
    x: DMatrix<f64>,
    covariates: Vec<usize>,
    offsets: Vec<usize>,
    counts: MarginCounts,
}

impl GlmDesign {
    /// `x` is `N × ΣK_j`; `covariates[j] = K_j` for every latent coordinate `j`.
    pub fn new(x: DMatrix<f64>, covariates: Vec<usize>, partition: &MarginPartition) -> Result<Self> {
        if covariates.len() != partition.dim() {
            return Err(Error::Validation(format!(
                "covariates_per_margin has len {}, expected J_all={}",
                covariates.len(),
                partition.dim()
            )));
        }
        let mut offsets = Vec::with_capacity(covariates.len());
        let mut off = 0;
        for &k in &covariates {
            offsets.push(off);
            off += k;
        }
        if x.ncols() != off {
            return Err(Error::Validation(format!(
                "design matrix has {} columns, expected sum(K)={}",
                x.ncols(),
                off
            )));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(Error::Validation("design matrix must contain only finite values".to_string()));
        }
        Ok(Self { x, covariates, offsets, counts: partition.counts() })
    }

    /// Number of observations.
    #[inline]
    pub fn n_obs(&self) -> usize {
        self.x.nrows()
    }

    /// Length of the flat coefficient vector (`ΣK_j`).
    #[inline]
    pub fn n_coefficients(&self) -> usize {
        self.x.ncols()
    }

    /// `K_j` for every latent coordinate.
    #[inline]
    pub fn covariates(&self) -> &[usize] {
        &self.covariates
    }

    /// `N × J_all` mean table for `coefficients`.
    pub fn means(&self, coefficients: &[f64], partition: &MarginPartition) -> Result<DenseRows<f64>> {
        if coefficients.len() != self.n_coefficients() {
            return Err(Error::Validation(format!(
                "expected {} coefficients, got {}",
                self.n_coefficients(),
                coefficients.len()
            )));
        }
        if partition.counts() != self.counts {
            return Err(Error::Validation(format!(
                "partition {:?} does not match the design's margins {:?}",
                partition.counts(),
                self.counts
            )));
        }
        let n = self.n_obs();
        let mut out = DenseRows::filled(n, partition.dim(), 0.0);
        let dim = partition.dim();
        let flat = out.as_mut_slice();
        for block in partition.blocks() {
            for j in block.range() {
                let (off, k) = (self.offsets[j], self.covariates[j]);
                let beta = DVectorView::from_slice(&coefficients[off..off + k], k);
                let eta = self.x.columns(off, k) * beta;
                for (i, &e) in eta.iter().enumerate() {
                    flat[i * dim + j] = block.family.inverse_link(e);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::MarginCounts;
    use approx::assert_relative_eq;

    fn partition(j: [usize; 3]) -> MarginPartition {
        MarginPartition::new(MarginCounts::from(j))
    }

    #[test]
    fn test_links_per_family() {
        // One margin per family, each with intercept + slope.
        let p = partition([1, 1, 1]);
        let x = DMatrix::from_row_slice(2, 6, &[
            1.0, 0.5, 1.0, 0.5, 1.0, 0.5, //
            1.0, -2.0, 1.0, -2.0, 1.0, -2.0,
        ]);
        let design = GlmDesign::new(x, vec![2, 2, 2], &p).unwrap();
        let beta = [0.3, 1.0, -0.2, 0.8, 0.1, 0.4];
        let mu = design.means(&beta, &p).unwrap();
        for (i, &xi) in [0.5, -2.0].iter().enumerate() {
            assert_relative_eq!(mu.get(i, 0), 0.3 + 1.0 * xi, epsilon = 1e-14);
            let eta_b: f64 = -0.2 + 0.8 * xi;
            assert_relative_eq!(mu.get(i, 1), 1.0 / (1.0 + (-eta_b).exp()), epsilon = 1e-14);
            let eta_p: f64 = 0.1 + 0.4 * xi;
            assert_relative_eq!(mu.get(i, 2), eta_p.exp(), epsilon = 1e-14);
        }
    }

    #[test]
    fn test_bernoulli_and_poisson_means_in_range() {
        let p = partition([0, 1, 1]);
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, -1.0, -1.0, 0.0, 0.0]);
        let design = GlmDesign::new(x, vec![1, 1], &p).unwrap();
        let mu = design.means(&[400.0, -900.0], &p).unwrap();
        for i in 0..3 {
            let prob = mu.get(i, 0);
            assert!(prob > 0.0 && prob < 1.0, "row {} p={}", i, prob);
            assert!(mu.get(i, 1) > 0.0);
        }
    }

    #[test]
    fn test_zero_count_family_is_skipped() {
        // J = [1, 0, 1]: the Poisson margin reads the second coefficient block.
        let p = partition([1, 0, 1]);
        let x = DMatrix::from_row_slice(1, 3, &[1.0, 1.0, 2.0]);
        let design = GlmDesign::new(x, vec![1, 2], &p).unwrap();
        let mu = design.means(&[0.7, 0.5, -0.1], &p).unwrap();
        assert_eq!(mu.ncols(), 2);
        assert_relative_eq!(mu.get(0, 0), 0.7, epsilon = 1e-14);
        assert_relative_eq!(mu.get(0, 1), f64::exp(0.5 - 0.2), epsilon = 1e-14);
    }

    #[test]
    fn test_shape_validation() {
        let p = partition([1, 1, 0]);
        let x = DMatrix::from_element(2, 3, 1.0);
        assert!(GlmDesign::new(x.clone(), vec![1], &p).is_err());
        assert!(GlmDesign::new(x.clone(), vec![1, 1], &p).is_err());
        let design = GlmDesign::new(x, vec![1, 2], &p).unwrap();
        assert!(design.means(&[0.0; 2], &p).is_err());
    }

    #[test]
    fn test_means_rejects_foreign_partition() {
        let p = partition([1, 1, 0]);
        let design = GlmDesign::new(DMatrix::from_element(2, 2, 1.0), vec![1, 1], &p).unwrap();
        let err = design.means(&[0.1, 0.2], &partition([0, 2, 0])).unwrap_err();
        assert!(err.is_domain_violation());
        assert!(design.means(&[0.1, 0.2], &partition([2, 1, 0])).is_err());
        assert!(design.means(&[0.1, 0.2], &p).is_ok());
    }
}
