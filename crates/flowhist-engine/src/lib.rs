//! Self-configuring streaming histogram accumulator
//!
//! Builds a frequency distribution over an unbounded stream of scalar
//! samples in one pass, without knowing the range or natural bin width in
//! advance. The first five distinct samples seed a bin grid; from there the
//! accumulator recenters its fixed-capacity window with cheap block shifts
//! and coarsens the bin width through an alternating ×5/×2 decade sequence,
//! merging per-bin running statistics (Welford mean and sample variance) as
//! the grid widens. Far-flung samples wait in an ordered outlier buffer and
//! are reconciled back in after each adaptation.
//!
//! # Example
//!
//! ```
//! use flowhist_engine::StreamingHistogram;
//!
//! let mut hist = StreamingHistogram::new();
//! for v in [1.0, 2.0, 2.0, 3.0, 100.0, 101.0, 102.0] {
//!     hist.ingest(v, 1.0)?;
//! }
//! let snap = hist.snapshot();
//! assert_eq!(snap.total(), Some(7.0));
//! # Ok::<(), flowhist_core::Error>(())
//! ```

mod adapt;
mod ingest;
mod outliers;
mod snapshot;
mod state;

pub use snapshot::{HistogramSnapshot, SnapshotSummary};
pub use state::StreamingHistogram;
