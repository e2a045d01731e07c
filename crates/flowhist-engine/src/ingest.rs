//! Sample ingestion and routing
//!
//! Each sample is either excluded (zero weight, non-finite value), buffered
//! during warm-up, accumulated directly into a bin, buffered as a far
//! outlier, or used to drive a window shift / grid coarsening.

use crate::adapt::SEED_DISTINCT;
use crate::state::StreamingHistogram;
use flowhist_core::{Result, SampleWeight};

impl StreamingHistogram {
    /// Ingest one sample with an explicit weight
    ///
    /// A weight of zero (or below) or a non-finite value increments the
    /// invalid counter and touches nothing else. Until 5 distinct values
    /// have been seen the sample is buffered; the first grid is then seeded
    /// from the buffer. Afterwards the sample is accumulated directly,
    /// buffered as a far outlier, or triggers a shift/rescale.
    pub fn ingest(&mut self, value: f64, weight: f64) -> Result<()> {
        if !value.is_finite() || !weight.is_finite() || weight <= 0.0 {
            self.invalid_count += 1;
            return Ok(());
        }
        if value > 0.0 {
            self.min_positive = Some(match self.min_positive {
                Some(m) => m.min(value),
                None => value,
            });
        }
        if !self.seeded {
            self.outliers.add(value, weight);
            if self.outliers.len() >= SEED_DISTINCT {
                self.seed_from_outliers()?;
            }
            return Ok(());
        }
        self.route(value, weight)
    }

    /// Ingest a batch, deriving each sample's weight from the caller's
    /// validity function
    pub fn ingest_weighted<W: SampleWeight>(&mut self, values: &[f64], weigher: &W) -> Result<()> {
        for &value in values {
            let weight = if value.is_finite() {
                weigher.weight(value)
            } else {
                0.0
            };
            self.ingest(value, weight)?;
        }
        Ok(())
    }

    fn route(&mut self, value: f64, weight: f64) -> Result<()> {
        let idx = self.bin_of(value);
        let n = self.bin_count as i64;
        if idx >= 0 && idx < n {
            return self.place(idx as usize, value, weight);
        }

        // Beyond the hard bounds, buffering beats a cascade of rescales.
        // The asymmetry (3x below, 4x above) is empirically tuned; keep it.
        if idx < -3 * n || idx > 4 * n {
            self.outliers.add(value, weight);
            let limit = (self.total_weight / 100.0).max(30.0);
            if self.outliers.total() > limit {
                self.force_grow()?;
            }
            return Ok(());
        }

        let rescaled = self.grow_to_fit(value)?;
        let idx = self.bin_of(value);
        debug_assert!(idx >= 0 && (idx as usize) < self.bin_count);
        self.place(idx as usize, value, weight)?;
        if rescaled {
            self.reconcile()?;
        }
        Ok(())
    }
}
