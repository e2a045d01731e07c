//! Immutable finalized view of an accumulator
//!
//! A snapshot trims the planes down to the populated region (plus one guard
//! bin on each side), converts the variance accumulators to standard
//! deviations, and carries the stream-level bookkeeping needed by the
//! analysis layer. The accumulator itself keeps running; snapshots are
//! cheap, repeatable exports.

use crate::state::StreamingHistogram;
use flowhist_core::{Error, Result};
use std::fmt;

/// Stream-level bookkeeping attached to snapshots taken from a live
/// accumulator
///
/// Snapshots built from foreign data via
/// [`HistogramSnapshot::from_parts`] do not carry one.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSummary {
    /// Sum of weights routed into bins
    pub total: f64,
    /// Samples excluded by zero weight or non-finite value
    pub invalid: u64,
    /// Residual buffered outliers as ascending (value, weight) pairs
    pub outliers: Vec<(f64, f64)>,
    /// Summed weight of the residual outliers
    pub outlier_total: f64,
    /// Unit tag, passed through opaquely
    pub unit: Option<String>,
    /// Smallest strictly-positive sample seen
    pub min_positive: Option<f64>,
}

/// Finalized histogram: trimmed per-bin statistics plus the bin geometry
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    counts: Vec<f64>,
    means: Vec<f64>,
    stddevs: Vec<f64>,
    bin_width: f64,
    bin_start: f64,
    summary: Option<SnapshotSummary>,
}

impl HistogramSnapshot {
    /// Build a snapshot from externally computed per-bin statistics
    ///
    /// The plane lengths must agree and the bin width must be positive and
    /// finite. The result carries no stream summary, so operations that
    /// need one ([`total`](Self::total) aside) report missing metadata.
    pub fn from_parts(
        counts: Vec<f64>,
        means: Vec<f64>,
        stddevs: Vec<f64>,
        bin_width: f64,
        bin_start: f64,
    ) -> Result<Self> {
        if means.len() != counts.len() || stddevs.len() != counts.len() {
            return Err(Error::InvalidParameter(format!(
                "plane lengths disagree: {} counts, {} means, {} stddevs",
                counts.len(),
                means.len(),
                stddevs.len()
            )));
        }
        if !(bin_width.is_finite() && bin_width > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "bin width must be positive and finite, got {bin_width}"
            )));
        }
        if !bin_start.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "bin start must be finite, got {bin_start}"
            )));
        }
        Ok(Self {
            counts,
            means,
            stddevs,
            bin_width,
            bin_start,
            summary: None,
        })
    }

    /// Number of bins in the trimmed view
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Per-bin accumulated weights
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    /// Per-bin running means (0 for empty bins)
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Per-bin sample standard deviations (0 below two samples)
    pub fn stddevs(&self) -> &[f64] {
        &self.stddevs
    }

    /// Bin width in value space
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    /// Left edge of the first bin in the trimmed view
    pub fn bin_start(&self) -> f64 {
        self.bin_start
    }

    /// Geometric center of each bin, derived from the grid rather than
    /// stored, so the planes stay three
    pub fn bin_centers(&self) -> Vec<f64> {
        (0..self.counts.len())
            .map(|i| self.bin_start + (i as f64 + 0.5) * self.bin_width)
            .collect()
    }

    /// Total weight routed into bins, when the stream summary is present
    pub fn total(&self) -> Option<f64> {
        self.summary.as_ref().map(|s| s.total)
    }

    /// Excluded-sample count, when the stream summary is present
    pub fn invalid_count(&self) -> Option<u64> {
        self.summary.as_ref().map(|s| s.invalid)
    }

    /// Residual outliers as ascending (value, weight) pairs
    pub fn outliers(&self) -> &[(f64, f64)] {
        self.summary.as_ref().map_or(&[], |s| &s.outliers)
    }

    /// Summed weight of the residual outliers
    pub fn outlier_total(&self) -> f64 {
        self.summary.as_ref().map_or(0.0, |s| s.outlier_total)
    }

    /// Unit tag, when one was assigned at the source
    pub fn unit(&self) -> Option<&str> {
        self.summary.as_ref().and_then(|s| s.unit.as_deref())
    }

    /// Smallest strictly-positive sample seen at the source
    pub fn min_positive(&self) -> Option<f64> {
        self.summary.as_ref().and_then(|s| s.min_positive)
    }

    /// The full stream summary, absent for foreign snapshots
    pub fn summary(&self) -> Option<&SnapshotSummary> {
        self.summary.as_ref()
    }
}

impl fmt::Display for HistogramSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HistogramSnapshot({} bins, width={:.6}, start={:.6}",
            self.counts.len(),
            self.bin_width,
            self.bin_start
        )?;
        if let Some(summary) = &self.summary {
            write!(
                f,
                ", total={}, invalid={}, outliers={}",
                summary.total,
                summary.invalid,
                summary.outliers.len()
            )?;
        }
        write!(f, ")")
    }
}

impl StreamingHistogram {
    /// Export a finalized view of the current state
    ///
    /// The planes are trimmed to the populated region plus one guard bin on
    /// each side; before seeding (or with nothing placed) the view is
    /// empty. Variance accumulators become standard deviations, zeroed for
    /// bins holding fewer than two samples.
    pub fn snapshot(&self) -> HistogramSnapshot {
        if !self.seeded || self.is_region_empty() {
            return HistogramSnapshot {
                counts: Vec::new(),
                means: Vec::new(),
                stddevs: Vec::new(),
                bin_width: self.bin_width(),
                bin_start: self.left_edge(),
                summary: Some(self.summary()),
            };
        }
        let lo = self.margin_left.saturating_sub(1);
        let hi = (self.bin_count - self.margin_right + 1).min(self.bin_count);
        let counts = self.counts[lo..hi].to_vec();
        let means = self.means[lo..hi].to_vec();
        let stddevs = self.counts[lo..hi]
            .iter()
            .zip(&self.var_acc[lo..hi])
            .map(|(&c, &v)| if c >= 2.0 { v.sqrt() } else { 0.0 })
            .collect();
        HistogramSnapshot {
            counts,
            means,
            stddevs,
            bin_width: self.bin_width(),
            bin_start: self.left_edge() + lo as f64 * self.bin_width(),
            summary: Some(self.summary()),
        }
    }

    fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            total: self.total_weight,
            invalid: self.invalid_count,
            outliers: self.outliers.snapshot(),
            outlier_total: self.outliers.total(),
            unit: self.unit.clone(),
            min_positive: self.min_positive,
        }
    }
}
