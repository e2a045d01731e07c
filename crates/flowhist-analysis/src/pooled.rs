//! Pooled mean and variance over a finalized histogram
//!
//! Per-bin running statistics combine exactly: the pooled mean is the
//! count-weighted mean of bin means, and the pooled variance follows the
//! within-group + between-group (ANOVA) decomposition, so the result equals
//! the two-pass statistics over the raw placed samples up to round-off.

use flowhist_core::{Error, Result};
use flowhist_engine::HistogramSnapshot;

/// Pooled stream statistics derived from a snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct PooledStats {
    /// Count-weighted mean over all placed samples
    pub mean: f64,
    /// Pooled sample standard deviation
    pub stddev: f64,
    /// Total weight routed into bins
    pub valid_count: f64,
    /// Samples excluded at ingestion
    pub invalid_count: u64,
}

/// Count-weighted mean of the snapshot's bin means
///
/// Equals the mean of the placed samples exactly, regardless of how the
/// grid binned them.
pub fn pooled_mean(snap: &HistogramSnapshot) -> Result<f64> {
    let total: f64 = snap.counts().iter().sum();
    if total <= 0.0 {
        return Err(Error::too_few_bins(1, 0));
    }
    let mass: f64 = snap
        .counts()
        .iter()
        .zip(snap.means())
        .map(|(c, m)| c * m)
        .sum();
    Ok(mass / total)
}

/// Pooled mean and variance via the ANOVA decomposition
///
/// `Σ[(cᵢ−1)·vᵢ + cᵢ·(mᵢ−M)²] / (Σcᵢ − 1)`, with per-bin variances
/// recovered from the stddev plane. Requires the stream summary, so a
/// snapshot built from foreign parts reports missing metadata.
pub fn pooled_variance(snap: &HistogramSnapshot) -> Result<PooledStats> {
    let summary = snap
        .summary()
        .ok_or_else(|| Error::foreign_snapshot("pooled_variance"))?;
    let mean = pooled_mean(snap)?;
    let total: f64 = snap.counts().iter().sum();
    let mut ss = 0.0;
    for ((&c, &m), &s) in snap.counts().iter().zip(snap.means()).zip(snap.stddevs()) {
        if c > 0.0 {
            let d = m - mean;
            ss += (c - 1.0) * s * s + c * d * d;
        }
    }
    let variance = if total > 1.0 { ss / (total - 1.0) } else { 0.0 };
    if !(mean.is_finite() && variance.is_finite()) {
        return Err(Error::non_finite("pooled variance"));
    }
    Ok(PooledStats {
        mean,
        stddev: variance.max(0.0).sqrt(),
        valid_count: summary.total,
        invalid_count: summary.invalid,
    })
}
