//! Observation storage.

use mixcop_core::{Error, Result};

use crate::partition::MarginCounts;

/// Dense row-major table (`n` rows × `cols` columns).
///
/// Per-observation vectors are rows, so each observation is a contiguous slice.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseRows<T> {
    n: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy> DenseRows<T> {
    /// Table from row vectors. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let n = rows.len();
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(n * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(Error::Validation(format!(
                    "rows must be rectangular: row {} has len {}, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            data.extend(row);
        }
        Ok(Self { n, cols, data })
    }

    /// `n × 0` table (a family with no margins).
    pub fn empty(n: usize) -> Self {
        Self { n, cols: 0, data: Vec::new() }
    }

    /// Table filled with `value`.
    pub fn filled(n: usize, cols: usize, value: T) -> Self {
        Self { n, cols, data: vec![value; n * cols] }
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.n
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        let start = i * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Element `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[i * self.cols + j]
    }

    /// Row-major backing buffer.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable row-major backing buffer.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

/// Heterogeneous outcomes, segmented by family.
///
/// `yn` is `N × Jn` (reals), `yb` is `N × Jb` (0/1), `yp` is `N × Jp` (counts).
#[derive(Debug, Clone, PartialEq)]
pub struct MixedOutcomes {
    yn: DenseRows<f64>,
    yb: DenseRows<u8>,
    yp: DenseRows<u64>,
}

/// Treat `rows = []` as an `n × 0` block.
fn block_or_empty<T: Copy>(rows: Vec<Vec<T>>, n: usize, name: &str) -> Result<DenseRows<T>> {
    if rows.is_empty() {
        return Ok(DenseRows::empty(n));
    }
    let block = DenseRows::from_rows(rows)?;
    if block.nrows() != n {
        return Err(Error::Validation(format!(
            "{} has {} rows, expected {}",
            name,
            block.nrows(),
            n
        )));
    }
    Ok(block)
}

impl MixedOutcomes {
    /// Build from row vectors. A family without margins may pass an empty `Vec`.
    pub fn new(yn: Vec<Vec<f64>>, yb: Vec<Vec<u8>>, yp: Vec<Vec<u64>>) -> Result<Self> {
        let n = yn.len().max(yb.len()).max(yp.len());
        if n == 0 {
            return Err(Error::Validation("outcomes must contain at least 1 observation".to_string()));
        }
        let yn = block_or_empty(yn, n, "Yn")?;
        let yb = block_or_empty(yb, n, "Yb")?;
        let yp = block_or_empty(yp, n, "Yp")?;
        if yn.as_slice().iter().any(|v| !v.is_finite()) {
            return Err(Error::Validation("Yn must contain only finite values".to_string()));
        }
        if let Some(&bad) = yb.as_slice().iter().find(|&&v| v > 1) {
            return Err(Error::Validation(format!("Yb must be 0 or 1, got {}", bad)));
        }
        Ok(Self { yn, yb, yp })
    }

    /// Number of observations `N`.
    #[inline]
    pub fn n_obs(&self) -> usize {
        self.yn.nrows()
    }

    /// Margin counts implied by the column widths.
    pub fn counts(&self) -> MarginCounts {
        MarginCounts::new(self.yn.ncols(), self.yb.ncols(), self.yp.ncols())
    }

    /// Normal outcomes.
    #[inline]
    pub fn normal(&self) -> &DenseRows<f64> {
        &self.yn
    }

    /// Bernoulli outcomes.
    #[inline]
    pub fn bernoulli(&self) -> &DenseRows<u8> {
        &self.yb
    }

    /// Poisson outcomes.
    #[inline]
    pub fn poisson(&self) -> &DenseRows<u64> {
        &self.yp
    }
}
