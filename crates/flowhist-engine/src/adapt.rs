//! Range adaptation: shift and rescale of the bin grid
//!
//! Growing the covered range is done either by cheaply recentering the
//! fixed-size window (shift) or by coarsening the bin width with an
//! alternating ×5/×2 factor sequence (rescale), merging the running
//! statistics of adjacent bins as the grid widens. Buffered outliers are
//! reconciled after every rescale.

use crate::state::{merge_group, StreamingHistogram};
use flowhist_core::{Error, Result};
use tracing::debug;

/// Distinct buffered values required before the first grid is seeded
pub(crate) const SEED_DISTINCT: usize = 5;

/// Retry cap for each of the two force-grow phases
const FORCE_GROW_RETRIES: usize = 10;

/// Step guard for coarsen/shift loops; |idx| <= 4*bin_count converges in a
/// handful of steps, so exhausting this means a broken invariant
pub(crate) const GROW_GUARD: usize = 64;

/// Denominator cap: the seeded bin width is floored at 1e-100
const MAX_DENOMINATOR: f64 = 1e100;

impl StreamingHistogram {
    /// Next coarsening factor, derived from the decimal mantissa of the
    /// current bin width
    ///
    /// The width always sits on a 1/5 decade step: mantissa 1 coarsens by
    /// 5, mantissa 5 by 2. Anything else is an invariant violation.
    fn next_factor(&self) -> Result<f64> {
        let width = self.num / self.den;
        let exponent = width.log10().floor();
        let mantissa = (width / 10f64.powf(exponent)).round();
        if mantissa == 1.0 {
            Ok(5.0)
        } else if mantissa == 5.0 {
            Ok(2.0)
        } else {
            Err(Error::Computation(format!(
                "bin width {width} is not on a 1/5 decade step"
            )))
        }
    }

    /// Coarsen the bin width by the next factor, merging consecutive groups
    ///
    /// The left edge moves down to a round multiple of the new width; when
    /// the capacity is not divisible by the factor (or the alignment shift
    /// does not fit the free right margin) the planes are reallocated to
    /// `ceil((bin_count+factor)/factor)*factor` bins with the shift applied
    /// in the same pass. Merged planes are committed only after every
    /// intermediate passes the finite check, so a rejected merge leaves the
    /// state as of the last consistent update.
    pub(crate) fn rescale(&mut self, reconcile_after: bool) -> Result<()> {
        let factor = self.next_factor()?;
        let f = factor as usize;
        let coarse = self.num * factor;
        let rem = self.left_edge.rem_euclid(coarse);
        let shift = (rem / self.num).round() as usize;
        debug!(
            factor = f,
            shift,
            bin_width = self.num / self.den,
            "coarsening bin grid"
        );

        if self.bin_count % f != 0 || shift > self.margin_right {
            let new_cap = (self.bin_count + f).div_ceil(f) * f;
            self.expand_shift(new_cap, shift);
            self.left_edge -= shift as f64 * self.num;
        } else if shift > 0 {
            self.shift_contents(shift as isize);
        }

        let groups = self.bin_count / f;
        let mut counts = vec![0.0; self.bin_count];
        let mut means = vec![0.0; self.bin_count];
        let mut vars = vec![0.0; self.bin_count];
        for g in 0..groups {
            let lo = g * f;
            let (c, m, v) = merge_group(
                &self.counts[lo..lo + f],
                &self.means[lo..lo + f],
                &self.var_acc[lo..lo + f],
            )?;
            counts[g] = c;
            means[g] = m;
            vars[g] = v;
        }
        self.counts = counts;
        self.means = means;
        self.var_acc = vars;

        if self.den > 1.0 {
            self.den /= factor;
            self.left_edge /= factor;
        } else {
            self.num *= factor;
        }
        debug_assert!(self.num == 1.0 || self.den == 1.0);
        self.recompute_margins();

        if reconcile_after {
            self.reconcile()?;
        }
        Ok(())
    }

    /// Coarsen, then keep the right edge tracking the value that forced the
    /// grow, preserving the populated left side's bin boundaries
    pub(crate) fn rescale_right(&mut self, value: f64) -> Result<()> {
        self.rescale(false)?;
        let idx = self.bin_of(value);
        let n = self.bin_count as i64;
        if idx >= n {
            let over = (idx - n) as usize + 1;
            let s = over.min(self.margin_left);
            if s > 0 {
                self.shift_contents(-(s as isize));
            }
        }
        Ok(())
    }

    /// Establish the first bin grid from the buffered outliers
    ///
    /// The width is seeded from the closest-pair gap over `bin_count/100`,
    /// snapped to a power of ten: numerator side for estimates >= 1,
    /// denominator side below, with the width floored at 1e-100. The grid
    /// anchors at the bin-aligned floor of the smaller pair member.
    pub(crate) fn seed_from_outliers(&mut self) -> Result<()> {
        let (a, b) = match self.outliers.closest_pair() {
            Some(pair) => pair,
            None => return Ok(()),
        };
        let raw = (b - a).abs() / (self.bin_count as f64 / 100.0);
        let exponent = raw.log10().floor();
        if exponent >= 0.0 {
            self.num = 10f64.powf(exponent);
            self.den = 1.0;
        } else {
            self.num = 1.0;
            self.den = 10f64.powf(-exponent).min(MAX_DENOMINATOR);
        }
        self.left_edge = (a * self.den / self.num).floor() * self.num;
        self.seeded = true;
        debug!(
            bin_width = self.num / self.den,
            left_edge = self.left_edge / self.den,
            "seeded bin grid from outlier buffer"
        );

        let weight = self.outliers.remove(a).unwrap_or(1.0);
        let idx = self.bin_of(a);
        debug_assert_eq!(idx, 0);
        let idx = (idx.max(0) as usize).min(self.bin_count - 1);
        self.place(idx, a, weight)?;
        self.reconcile()
    }

    /// Re-home buffered outliers after an adaptation
    ///
    /// Each entry is placed directly when in range, placed after a cheap
    /// shift when the opposite margin covers the overshoot, and otherwise
    /// left for the caller's grow loop.
    pub(crate) fn reconcile(&mut self) -> Result<()> {
        if self.outliers.is_empty() {
            return Ok(());
        }
        for value in self.outliers.values() {
            let n = self.bin_count as i64;
            let mut idx = self.bin_of(value);
            if idx < 0 {
                // unsigned_abs: bin_of saturates to i64::MIN for huge
                // magnitudes, which a plain negation would overflow on
                let needed = idx.unsigned_abs() as usize;
                if needed <= self.margin_right {
                    let shift = (self.margin_right + needed + 1) / 2;
                    self.shift_contents(shift as isize);
                    idx = self.bin_of(value);
                }
            } else if idx >= n {
                let over = (idx - n) as usize + 1;
                if over <= self.margin_left {
                    let shift = (self.margin_left + over + 1) / 2;
                    self.shift_contents(-(shift as isize));
                    idx = self.bin_of(value);
                }
            }
            if idx >= 0 && (idx as usize) < self.bin_count {
                if let Some(weight) = self.outliers.remove(value) {
                    self.place(idx as usize, value, weight)?;
                }
            }
        }
        Ok(())
    }

    /// Force adaptation when buffered outliers dominate the placed weight
    ///
    /// Retried up to 10 times while the buffered weight exceeds the placed
    /// total, then up to 10 more while it exceeds a tenth of it. Exhausting
    /// the bounds leaves residual outliers in the snapshot — a reported
    /// degradation, not an error.
    pub(crate) fn force_grow(&mut self) -> Result<()> {
        for _ in 0..FORCE_GROW_RETRIES {
            if self.outliers.total() <= self.total_weight {
                break;
            }
            if !self.grow_toward_nearest()? {
                return Ok(());
            }
        }
        for _ in 0..FORCE_GROW_RETRIES {
            if self.outliers.total() <= self.total_weight / 10.0 {
                break;
            }
            if !self.grow_toward_nearest()? {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Coarsen/shift until the buffered value nearest the window center
    /// fits, then reconcile. Returns false when the value cannot be fitted
    /// within the step guard; the entry stays buffered.
    fn grow_toward_nearest(&mut self) -> Result<bool> {
        let center = (self.left_edge + self.num * self.bin_count as f64 / 2.0) / self.den;
        let target = match self.outliers.nearest_to(center) {
            Some(value) => value,
            None => return Ok(false),
        };
        debug!(target, center, "forcing grid growth toward buffered outlier");
        let mut fitted = false;
        for _ in 0..GROW_GUARD {
            let idx = self.bin_of(target);
            let n = self.bin_count as i64;
            if idx >= 0 && idx < n {
                fitted = true;
                break;
            }
            if idx < 0 {
                let needed = idx.unsigned_abs() as usize;
                if needed <= self.margin_right {
                    let shift = (self.margin_right + needed + 1) / 2;
                    self.shift_contents(shift as isize);
                } else {
                    self.rescale(false)?;
                }
            } else {
                self.rescale_right(target)?;
            }
        }
        self.reconcile()?;
        Ok(fitted)
    }

    /// Grow the window until `value` maps into range
    ///
    /// Prefers a cheap recentering shift (half the opposite slack, rounded
    /// up) and falls back to coarsening. Returns whether any rescale
    /// happened, so the caller knows to reconcile.
    pub(crate) fn grow_to_fit(&mut self, value: f64) -> Result<bool> {
        let mut rescaled = false;
        for _ in 0..GROW_GUARD {
            let idx = self.bin_of(value);
            let n = self.bin_count as i64;
            if idx >= 0 && idx < n {
                return Ok(rescaled);
            }
            if idx < 0 {
                let needed = idx.unsigned_abs() as usize;
                if needed <= self.margin_right {
                    let shift = (self.margin_right + needed + 1) / 2;
                    self.shift_contents(shift as isize);
                } else {
                    self.rescale(false)?;
                    rescaled = true;
                }
            } else {
                let over = (idx - n) as usize + 1;
                if over <= self.margin_left {
                    let shift = (self.margin_left + over + 1) / 2;
                    self.shift_contents(-(shift as isize));
                } else {
                    self.rescale_right(value)?;
                    rescaled = true;
                }
            }
        }
        Err(Error::Computation(
            "bin grid growth did not converge".to_string(),
        ))
    }
}
