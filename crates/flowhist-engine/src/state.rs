//! Mutable accumulator state
//!
//! The state store is a set of fixed-capacity parallel planes (count, running
//! mean, variance accumulator) plus the rational bin-width pair and the
//! empty-margin counters that make shift/rescale decisions cheap.

use crate::outliers::OutlierBuffer;
use flowhist_core::{Error, Result};
use std::fmt;

/// Default fixed bin capacity
pub(crate) const DEFAULT_CAPACITY: usize = 100;

/// Self-configuring streaming histogram accumulator
///
/// Builds a frequency distribution over an unbounded stream of scalar
/// samples whose range and natural bin width are unknown in advance. The
/// bin width is held as a rational pair `(num, den)` with exactly one of
/// the two pinned at 1, so repeated ×5/×2 coarsening multiplies and
/// divides only by small integers and never drifts.
///
/// Mutated in place by every [`ingest`](StreamingHistogram::ingest) call;
/// not safe for concurrent ingestion without external serialization.
#[derive(Debug, Clone)]
pub struct StreamingHistogram {
    /// Fixed capacity; grows only to a factor multiple during expand-and-shift
    pub(crate) bin_count: usize,
    /// Bin width numerator (den-scaled space): width = num / den
    pub(crate) num: f64,
    /// Bin width denominator; invariant: num == 1 or den == 1
    pub(crate) den: f64,
    /// Left edge pre-multiplied by `den`, always an exact multiple of `num`
    pub(crate) left_edge: f64,
    pub(crate) counts: Vec<f64>,
    pub(crate) means: Vec<f64>,
    pub(crate) var_acc: Vec<f64>,
    /// Contiguous zero-occupancy bins at the low-index edge
    pub(crate) margin_left: usize,
    /// Contiguous zero-occupancy bins at the high-index edge
    pub(crate) margin_right: usize,
    /// Sum of weights routed into bins (buffered outliers excluded)
    pub(crate) total_weight: f64,
    /// Samples excluded by zero weight or non-finite value
    pub(crate) invalid_count: u64,
    /// Smallest strictly-positive sample seen; advisory log-scale hint
    pub(crate) min_positive: Option<f64>,
    /// False until the first bin grid has been established
    pub(crate) seeded: bool,
    /// Unit tag from the first declaring sample; first assignment wins
    pub(crate) unit: Option<String>,
    pub(crate) outliers: OutlierBuffer,
}

impl Default for StreamingHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingHistogram {
    /// Create an empty accumulator with the default capacity of 100 bins
    pub fn new() -> Self {
        Self::with_bin_count(DEFAULT_CAPACITY)
    }

    fn with_bin_count(bin_count: usize) -> Self {
        let bin_count = bin_count.max(1);
        Self {
            bin_count,
            num: 1.0,
            den: 1.0,
            left_edge: 0.0,
            counts: vec![0.0; bin_count],
            means: vec![0.0; bin_count],
            var_acc: vec![0.0; bin_count],
            margin_left: bin_count,
            margin_right: 0,
            total_weight: 0.0,
            invalid_count: 0,
            min_positive: None,
            seeded: false,
            unit: None,
            outliers: OutlierBuffer::new(),
        }
    }

    /// Set the bin capacity (clamped to at least 1)
    ///
    /// Only meaningful before the first sample; the grid seeds itself from
    /// the capacity.
    pub fn with_capacity(mut self, bin_count: usize) -> Self {
        let bin_count = bin_count.max(1);
        self.bin_count = bin_count;
        self.counts = vec![0.0; bin_count];
        self.means = vec![0.0; bin_count];
        self.var_acc = vec![0.0; bin_count];
        self.margin_left = bin_count;
        self.margin_right = 0;
        self
    }

    /// Attach a unit tag, passed through opaquely to snapshots
    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    /// Set the unit tag if none has been assigned yet
    ///
    /// The accumulator trusts the first assignment; later calls are ignored
    /// and unit conversion is the caller's responsibility.
    pub fn set_unit(&mut self, unit: &str) {
        if self.unit.is_none() {
            self.unit = Some(unit.to_string());
        }
    }

    /// Current bin capacity
    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    /// Current bin width
    pub fn bin_width(&self) -> f64 {
        self.num / self.den
    }

    /// Left edge of bin 0 in value space
    pub fn left_edge(&self) -> f64 {
        self.left_edge / self.den
    }

    /// Sum of weights routed into bins
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Samples excluded by zero weight or non-finite value
    pub fn invalid_count(&self) -> u64 {
        self.invalid_count
    }

    /// Whether the first bin grid has been established
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Smallest strictly-positive sample seen, if any
    pub fn min_positive(&self) -> Option<f64> {
        self.min_positive
    }

    /// Unit tag, if one was assigned
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Number of distinct buffered outlier values
    pub fn outlier_count(&self) -> usize {
        self.outliers.len()
    }

    /// Summed weight of buffered outliers
    pub fn outlier_total(&self) -> f64 {
        self.outliers.total()
    }

    /// Map a value to a bin index with the rational width pair
    ///
    /// Must be computed on `(num, den)` rather than a pre-divided float
    /// width, so repeated coarsening never produces an off-by-one index.
    pub(crate) fn bin_of(&self, value: f64) -> i64 {
        ((value * self.den - self.left_edge) / self.num).floor() as i64
    }

    /// True when no bin holds any weight
    pub(crate) fn is_region_empty(&self) -> bool {
        self.margin_left >= self.bin_count - self.margin_right
    }

    /// Route a sample into a bin: Welford update, weight total, margins
    pub(crate) fn place(&mut self, idx: usize, value: f64, weight: f64) -> Result<()> {
        let c0 = self.counts[idx];
        let m0 = self.means[idx];
        let v0 = self.var_acc[idx];
        let (c1, m1, v1) = if weight == 1.0 {
            welford_step(c0, m0, v0, value)
        } else {
            merge_two((c0, m0, v0), (weight, value, 0.0))
        };
        if !(c1.is_finite() && m1.is_finite() && v1.is_finite()) {
            return Err(Error::non_finite(&format!("bin {idx} statistics update")));
        }
        if self.is_region_empty() {
            self.margin_left = idx;
            self.margin_right = self.bin_count - 1 - idx;
        } else {
            self.margin_left = self.margin_left.min(idx);
            self.margin_right = self.margin_right.min(self.bin_count - 1 - idx);
        }
        self.counts[idx] = c1;
        self.means[idx] = m1;
        self.var_acc[idx] = v1;
        self.total_weight += weight;
        Ok(())
    }

    /// Rescan the planes for the contiguous empty margins
    pub(crate) fn recompute_margins(&mut self) {
        match self.counts.iter().position(|&c| c > 0.0) {
            Some(first) => {
                let last = self.counts.iter().rposition(|&c| c > 0.0).unwrap_or(first);
                self.margin_left = first;
                self.margin_right = self.bin_count - 1 - last;
            }
            None => {
                self.margin_left = self.bin_count;
                self.margin_right = 0;
            }
        }
    }

    /// Block-move the populated window within the fixed capacity
    ///
    /// Positive offset moves contents toward higher indices (the window
    /// itself moves left); negative the other way. Bin contents relocate
    /// verbatim, no statistics are recomputed. O(bin_count).
    pub(crate) fn shift_contents(&mut self, offset: isize) {
        if offset == 0 {
            return;
        }
        if self.is_region_empty() {
            self.left_edge -= offset as f64 * self.num;
            return;
        }
        let lo = self.margin_left;
        let hi = self.bin_count - self.margin_right;
        if offset > 0 {
            let off = offset as usize;
            debug_assert!(off <= self.margin_right);
            move_block(&mut self.counts, lo, hi, off, true);
            move_block(&mut self.means, lo, hi, off, true);
            move_block(&mut self.var_acc, lo, hi, off, true);
            self.margin_left += off;
            self.margin_right -= off;
            self.left_edge -= off as f64 * self.num;
        } else {
            let off = (-offset) as usize;
            debug_assert!(off <= self.margin_left);
            move_block(&mut self.counts, lo, hi, off, false);
            move_block(&mut self.means, lo, hi, off, false);
            move_block(&mut self.var_acc, lo, hi, off, false);
            self.margin_left -= off;
            self.margin_right += off;
            self.left_edge += off as f64 * self.num;
        }
    }

    /// Reallocate the planes to `new_cap` bins, moving contents right by
    /// `shift` in the same pass (value-semantic resize, no pointer games)
    pub(crate) fn expand_shift(&mut self, new_cap: usize, shift: usize) {
        debug_assert!(new_cap >= self.bin_count + shift);
        let grow = |plane: &Vec<f64>| {
            let mut fresh = vec![0.0; new_cap];
            fresh[shift..shift + plane.len()].copy_from_slice(plane);
            fresh
        };
        self.counts = grow(&self.counts);
        self.means = grow(&self.means);
        self.var_acc = grow(&self.var_acc);
        self.bin_count = new_cap;
    }
}

impl fmt::Display for StreamingHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StreamingHistogram({} bins, width={:.6}, total={}, invalid={}, outliers={})",
            self.bin_count,
            self.bin_width(),
            self.total_weight,
            self.invalid_count,
            self.outliers.len()
        )
    }
}

fn move_block(plane: &mut [f64], lo: usize, hi: usize, off: usize, right: bool) {
    if right {
        plane.copy_within(lo..hi, lo + off);
        plane[lo..lo + off].fill(0.0);
    } else {
        plane.copy_within(lo..hi, lo - off);
        plane[hi - off..hi].fill(0.0);
    }
}

/// One-pass mean/variance update for a unit-weight sample
///
/// `var` carries the running sample variance; the recurrence is the exact
/// two-pass-equivalent form (the increment term is the mean's own update
/// step, not the raw deviation).
pub(crate) fn welford_step(count: f64, mean: f64, var: f64, value: f64) -> (f64, f64, f64) {
    let count1 = count + 1.0;
    let step = (value - mean) / count1;
    let mean1 = mean + step;
    let var1 = if count1 > 1.0 {
        var * (1.0 - 1.0 / (count1 - 1.0)) + count1 * step * step
    } else {
        0.0
    };
    (count1, mean1, var1)
}

/// Combine two (count, mean, variance) groups into one
///
/// Each side's variance is converted to a sum of squared deviations against
/// the merged mean before pooling. A weighted single value enters as
/// `(weight, value, 0.0)`.
pub(crate) fn merge_two(a: (f64, f64, f64), b: (f64, f64, f64)) -> (f64, f64, f64) {
    let total = a.0 + b.0;
    if total <= 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let mean = (a.0 * a.1 + b.0 * b.1) / total;
    let mut ss = 0.0;
    for &(c, m, v) in [&a, &b] {
        if c > 0.0 {
            let d = m - mean;
            ss += (c - 1.0) * v + c * d * d;
        }
    }
    let var = if total > 1.0 {
        (ss / (total - 1.0)).max(0.0)
    } else {
        0.0
    };
    (total, mean, var)
}

/// Merge a consecutive group of bins during coarsening
pub(crate) fn merge_group(counts: &[f64], means: &[f64], vars: &[f64]) -> Result<(f64, f64, f64)> {
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return Ok((0.0, 0.0, 0.0));
    }
    let mut mass = 0.0;
    for (c, m) in counts.iter().zip(means) {
        mass += c * m;
    }
    let mean = mass / total;
    let mut ss = 0.0;
    for ((&c, &m), &v) in counts.iter().zip(means).zip(vars) {
        if c > 0.0 {
            let d = m - mean;
            ss += (c - 1.0) * v + c * d * d;
        }
    }
    let var = if total > 1.0 {
        (ss / (total - 1.0)).max(0.0)
    } else {
        0.0
    };
    if !(mean.is_finite() && var.is_finite()) {
        return Err(Error::non_finite("bin merge"));
    }
    Ok((total, mean, var))
}
