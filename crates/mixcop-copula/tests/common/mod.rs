//! Synthetic mixed-margin datasets shared by the integration tests.

#![allow(dead_code)]

use mixcop_copula::{CopulaConfig, GlmDesign, MarginCounts, MarginPartition, MixedOutcomes};
use nalgebra::DMatrix;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson, StandardNormal};

/// Covariates per margin: intercept plus one standard-normal column.
pub const K: usize = 2;

pub struct Synth {
    pub config: CopulaConfig,
    pub outcomes: MixedOutcomes,
    pub x: DMatrix<f64>,
    pub beta: Vec<f64>,
    pub sigma: Vec<f64>,
    pub aux: Vec<f64>,
    pub chol: DMatrix<f64>,
}

/// AR(1) latent correlation `rho^|r-c|`, returned as its Cholesky factor.
pub fn ar1_cholesky(dim: usize, rho: f64) -> DMatrix<f64> {
    let corr = DMatrix::from_fn(dim, dim, |r, c| rho.powi((r as i32 - c as i32).abs()));
    corr.cholesky().expect("AR(1) correlation is positive definite").l()
}

pub fn synth(n: usize, counts: MarginCounts, rho: f64, seed: u64) -> Synth {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let dim = counts.total();

    let mut x = DMatrix::zeros(n, dim * K);
    for i in 0..n {
        for j in 0..dim {
            x[(i, j * K)] = 1.0;
            x[(i, j * K + 1)] = StandardNormal.sample(&mut rng);
        }
    }
    let beta: Vec<f64> = (0..dim).flat_map(|j| [0.3 - 0.15 * j as f64, 0.5]).collect();
    let sigma: Vec<f64> = (0..counts.normal).map(|j| 0.7 + 0.4 * j as f64).collect();

    let partition = MarginPartition::new(counts);
    let design = GlmDesign::new(x.clone(), vec![K; dim], &partition).unwrap();
    let means = design.means(&beta, &partition).unwrap();

    let (jn, jb) = (counts.normal, counts.bernoulli);
    let yn: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..jn).map(|j| Normal::new(means.get(i, j), sigma[j]).unwrap().sample(&mut rng)).collect())
        .collect();
    let yb: Vec<Vec<u8>> = (0..n)
        .map(|i| (0..jb).map(|j| rng.random_bool(means.get(i, jn + j)) as u8).collect())
        .collect();
    let yp: Vec<Vec<u64>> = (0..n)
        .map(|i| {
            (0..counts.poisson)
                .map(|j| Poisson::new(means.get(i, jn + jb + j)).unwrap().sample(&mut rng) as u64)
                .collect()
        })
        .collect();
    let outcomes = MixedOutcomes::new(yn, yb, yp).unwrap();
    let aux: Vec<f64> = (0..n * counts.discrete()).map(|_| rng.random_range(0.01..0.99)).collect();

    Synth {
        config: CopulaConfig::new(counts, vec![K; dim]),
        outcomes,
        x,
        beta,
        sigma,
        aux,
        chol: ar1_cholesky(dim, rho),
    }
}
