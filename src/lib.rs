//! Self-configuring streaming histogram engine
//!
//! `flowhist` builds a frequency distribution over an unbounded stream of
//! scalar samples whose range and natural bin width are unknown in advance.
//! The accumulator picks an initial bin width from the first few samples,
//! then shifts or coarsens its bin grid on the fly as later samples arrive
//! outside the current window, without losing previously accumulated
//! per-bin statistics.
//!
//! The workspace is split by responsibility:
//!
//! - [`flowhist_core`] — shared error taxonomy and the sample-weight seam
//! - [`flowhist_engine`] — the adaptive accumulator and its snapshots
//! - [`flowhist_analysis`] — pooled statistics and peak segmentation over
//!   snapshots
//!
//! # Example
//!
//! ```rust
//! use flowhist::{StreamingHistogram, pooled_mean};
//!
//! let mut hist = StreamingHistogram::new();
//! for value in [1.0, 2.0, 2.0, 3.0, 100.0, 101.0, 102.0] {
//!     hist.ingest(value, 1.0).unwrap();
//! }
//!
//! let snap = hist.snapshot();
//! assert_eq!(snap.total(), Some(7.0));
//! let mean = pooled_mean(&snap).unwrap();
//! assert!(mean > 1.0 && mean < 102.0);
//! ```

pub use flowhist_analysis::{
    peak_stats, pooled_mean, pooled_variance, segment_peaks, PeakStat, PooledStats,
};
pub use flowhist_core::{Error, FillValueWeight, Result, SampleWeight, UnitWeight};
pub use flowhist_engine::{HistogramSnapshot, SnapshotSummary, StreamingHistogram};

pub use flowhist_analysis;
pub use flowhist_core;
pub use flowhist_engine;
