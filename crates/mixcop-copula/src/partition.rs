//! Ordered margin partition.
//!
//! Every per-observation vector (means, latents, bounds, indicators) is laid out
//! as `[normal][Bernoulli][Poisson]`. [`MarginPartition`] is built once from the
//! counts and is the only place that offset arithmetic happens.

use std::ops::Range;

use mixcop_prob::math::{exp_clamped, prob_clamped};
use serde::{Deserialize, Serialize};

/// Distributional family of one margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginFamily {
    /// Continuous margin, identity link.
    Normal,
    /// Binary margin, logit link.
    Bernoulli,
    /// Count margin, log link.
    Poisson,
}

impl MarginFamily {
    /// Families in latent-vector order.
    pub const ORDER: [MarginFamily; 3] =
        [MarginFamily::Normal, MarginFamily::Bernoulli, MarginFamily::Poisson];

    /// Map a linear predictor to the margin mean.
    ///
    /// Bernoulli probabilities stay strictly inside `(0, 1)` and Poisson rates
    /// strictly positive for every finite `eta`.
    #[inline]
    pub fn inverse_link(self, eta: f64) -> f64 {
        match self {
            MarginFamily::Normal => eta,
            MarginFamily::Bernoulli => prob_clamped(eta),
            MarginFamily::Poisson => exp_clamped(eta),
        }
    }

    /// Lower-case family name, as serialized.
    pub fn name(self) -> &'static str {
        match self {
            MarginFamily::Normal => "normal",
            MarginFamily::Bernoulli => "bernoulli",
            MarginFamily::Poisson => "poisson",
        }
    }
}

/// Number of margins per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MarginCounts {
    /// Normal margins (`Jn`).
    pub normal: usize,
    /// Bernoulli margins (`Jb`).
    pub bernoulli: usize,
    /// Poisson margins (`Jp`).
    pub poisson: usize,
}

impl MarginCounts {
    /// Create counts `(Jn, Jb, Jp)`.
    pub fn new(normal: usize, bernoulli: usize, poisson: usize) -> Self {
        Self { normal, bernoulli, poisson }
    }

    /// Count for one family.
    #[inline]
    pub fn get(&self, family: MarginFamily) -> usize {
        match family {
            MarginFamily::Normal => self.normal,
            MarginFamily::Bernoulli => self.bernoulli,
            MarginFamily::Poisson => self.poisson,
        }
    }

    /// Latent dimension `J_all`.
    #[inline]
    pub fn total(&self) -> usize {
        self.normal + self.bernoulli + self.poisson
    }

    /// Number of discrete margins (`Jb + Jp`), i.e. auxiliary uniforms per observation.
    #[inline]
    pub fn discrete(&self) -> usize {
        self.bernoulli + self.poisson
    }
}

impl From<[usize; 3]> for MarginCounts {
    fn from(j: [usize; 3]) -> Self {
        Self::new(j[0], j[1], j[2])
    }
}

/// Contiguous run of margins of one family inside the latent vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginBlock {
    /// Family tag.
    pub family: MarginFamily,
    /// Offset of the first margin in the latent vector.
    pub start: usize,
    /// Number of margins (always `> 0`).
    pub len: usize,
}

impl MarginBlock {
    /// Latent-vector range covered by this block.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// Ordered partition of the latent vector into non-empty family blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarginPartition {
    counts: MarginCounts,
    blocks: Vec<MarginBlock>,
}

impl MarginPartition {
    /// Build the partition; zero-count families get no block.
    pub fn new(counts: MarginCounts) -> Self {
        let mut blocks = Vec::with_capacity(3);
        let mut start = 0;
        for family in MarginFamily::ORDER {
            let len = counts.get(family);
            if len > 0 {
                blocks.push(MarginBlock { family, start, len });
                start += len;
            }
        }
        Self { counts, blocks }
    }

    /// Margin counts.
    #[inline]
    pub fn counts(&self) -> MarginCounts {
        self.counts
    }

    /// Latent dimension `J_all`.
    #[inline]
    pub fn dim(&self) -> usize {
        self.counts.total()
    }

    /// Non-empty blocks in latent-vector order.
    #[inline]
    pub fn blocks(&self) -> &[MarginBlock] {
        &self.blocks
    }

    /// Block for `family`, if it has any margins.
    pub fn block(&self, family: MarginFamily) -> Option<MarginBlock> {
        self.blocks.iter().copied().find(|b| b.family == family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_follow_family_order() {
        let p = MarginPartition::new(MarginCounts::new(2, 3, 1));
        assert_eq!(p.dim(), 6);
        assert_eq!(p.block(MarginFamily::Normal).unwrap().range(), 0..2);
        assert_eq!(p.block(MarginFamily::Bernoulli).unwrap().range(), 2..5);
        assert_eq!(p.block(MarginFamily::Poisson).unwrap().range(), 5..6);
    }

    #[test]
    fn test_zero_count_blocks_are_skipped() {
        let p = MarginPartition::new([0, 2, 0].into());
        assert_eq!(p.blocks().len(), 1);
        assert_eq!(p.blocks()[0], MarginBlock { family: MarginFamily::Bernoulli, start: 0, len: 2 });
        assert!(p.block(MarginFamily::Normal).is_none());
        assert!(p.block(MarginFamily::Poisson).is_none());

        let p = MarginPartition::new([1, 0, 2].into());
        assert_eq!(p.block(MarginFamily::Poisson).unwrap().range(), 1..3);

        let empty = MarginPartition::new(MarginCounts::default());
        assert_eq!(empty.dim(), 0);
        assert!(empty.blocks().is_empty());
    }

    #[test]
    fn test_inverse_links_stay_in_range() {
        for eta in [-1e4, -50.0, -1.0, 0.0, 1.0, 50.0, 1e4] {
            let p = MarginFamily::Bernoulli.inverse_link(eta);
            assert!(p > 0.0 && p < 1.0, "eta={} p={}", eta, p);
            let lam = MarginFamily::Poisson.inverse_link(eta);
            assert!(lam > 0.0 && lam.is_finite(), "eta={} lambda={}", eta, lam);
            assert_eq!(MarginFamily::Normal.inverse_link(eta), eta);
        }
    }

    #[test]
    fn test_family_name_matches_serde() {
        for fam in MarginFamily::ORDER {
            let json = serde_json::to_string(&fam).unwrap();
            assert_eq!(json, format!("\"{}\"", fam.name()));
        }
    }
}
