//! touchdv Touch Model
//!
//! Defines the plain data contracts shared by the resampling pipeline:
//! - **TouchPoint:** A timestamped single-contact sample
//! - **ResamplerConfig:** Screen bounds, rates, timing limits, and the
//!   touch transition threshold
//! - **Smoothing:** Filter selection and per-filter parameters
//!
//! Coordinates are absolute screen units, not normalized.

pub mod config;
pub mod point;

pub use config::*;
pub use point::*;
