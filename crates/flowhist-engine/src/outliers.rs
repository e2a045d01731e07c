//! Ordered buffer for samples that cannot yet be placed in a bin
//!
//! Samples land here during warm-up (before the first bin grid exists) and
//! when a value falls so far outside the current window that rescaling for
//! it immediately would be wasteful. Entries leave the buffer one key at a
//! time as reconciliation succeeds in placing them.

use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

/// Ordered value → summed-weight mapping, ascending by value
#[derive(Debug, Clone, Default)]
pub(crate) struct OutlierBuffer {
    entries: BTreeMap<OrderedFloat<f64>, f64>,
    total: f64,
}

impl OutlierBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a sample into the buffer, summing weight on an exact recurrence
    pub fn add(&mut self, value: f64, weight: f64) {
        *self.entries.entry(OrderedFloat(value)).or_insert(0.0) += weight;
        self.total += weight;
    }

    /// Remove one value entirely, returning its accumulated weight
    pub fn remove(&mut self, value: f64) -> Option<f64> {
        let weight = self.entries.remove(&OrderedFloat(value))?;
        self.total -= weight;
        Some(weight)
    }

    /// Number of distinct buffered values
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all buffered weights
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Buffered values in ascending order
    pub fn values(&self) -> Vec<f64> {
        self.entries.keys().map(|k| k.0).collect()
    }

    /// The two closest distinct values, ascending
    ///
    /// Adjacent keys suffice: the minimum gap in a sorted sequence is
    /// always between neighbors.
    pub fn closest_pair(&self) -> Option<(f64, f64)> {
        let mut best: Option<(f64, f64)> = None;
        let mut prev: Option<f64> = None;
        for &key in self.entries.keys() {
            let value = key.0;
            if let Some(p) = prev {
                let gap = value - p;
                if best.map_or(true, |(a, b)| gap < b - a) {
                    best = Some((p, value));
                }
            }
            prev = Some(value);
        }
        best
    }

    /// The buffered value nearest to `center`
    pub fn nearest_to(&self, center: f64) -> Option<f64> {
        self.entries
            .keys()
            .map(|k| k.0)
            .min_by(|a, b| {
                (a - center)
                    .abs()
                    .partial_cmp(&(b - center).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Ascending (value, weight) pairs for reporting
    pub fn snapshot(&self) -> Vec<(f64, f64)> {
        self.entries.iter().map(|(k, &w)| (k.0, w)).collect()
    }
}
