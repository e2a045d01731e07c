//! Sample weight and validity seam
//!
//! The engine never decides on its own which samples count; the caller
//! supplies a weight function. A weight of zero (or below) excludes the
//! sample, anything positive scales its contribution.

/// Per-sample weight/validity function
///
/// Returns `0.0` for invalid or fill samples, a positive weight otherwise.
pub trait SampleWeight {
    /// Weight for one sample value
    fn weight(&self, value: f64) -> f64;
}

impl<F> SampleWeight for F
where
    F: Fn(f64) -> f64,
{
    fn weight(&self, value: f64) -> f64 {
        self(value)
    }
}

/// Weight function that accepts every finite sample with weight 1
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitWeight;

impl SampleWeight for UnitWeight {
    fn weight(&self, _value: f64) -> f64 {
        1.0
    }
}

/// Weight function that excludes a sentinel fill value
///
/// Common for instrument streams where a fixed magic value marks dropped
/// readings.
#[derive(Debug, Clone, Copy)]
pub struct FillValueWeight {
    fill: f64,
}

impl FillValueWeight {
    /// Exclude samples equal to `fill`, accept everything else with weight 1
    pub fn new(fill: f64) -> Self {
        Self { fill }
    }
}

impl SampleWeight for FillValueWeight {
    fn weight(&self, value: f64) -> f64 {
        if value == self.fill {
            0.0
        } else {
            1.0
        }
    }
}
