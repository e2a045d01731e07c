//! Shared foundations for the flowhist workspace
//!
//! This crate holds what every other flowhist crate needs: the unified
//! error taxonomy and the sample-weight seam through which callers decide
//! which samples count.
//!
//! # Example
//!
//! ```rust
//! use flowhist_core::{Error, Result, SampleWeight, UnitWeight};
//!
//! fn check(weigher: &impl SampleWeight, value: f64) -> Result<f64> {
//!     let w = weigher.weight(value);
//!     if w < 0.0 {
//!         return Err(Error::InvalidParameter("negative weight".to_string()));
//!     }
//!     Ok(w)
//! }
//!
//! assert_eq!(check(&UnitWeight, 2.0).unwrap(), 1.0);
//! ```

pub mod error;
pub mod weight;

pub use error::{Error, Result};
pub use weight::{FillValueWeight, SampleWeight, UnitWeight};
