//! Derived statistics over finalized histogram snapshots
//!
//! Two layers on top of [`flowhist_engine`]: pooled mean/variance of the
//! whole stream recovered exactly from per-bin running statistics, and a
//! peak segmentation that partitions the bins into modes.
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
//! let stats = flowhist_analysis::pooled_variance(&snap)?;
//! assert!(stats.mean > 1.0 && stats.mean < 102.0);
//! # Ok::<(), flowhist_core::Error>(())
//! ```

mod peaks;
mod pooled;

pub use peaks::{peak_stats, segment_peaks, PeakStat};
pub use pooled::{pooled_mean, pooled_variance, PooledStats};
