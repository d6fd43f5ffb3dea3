//! touchdv Common Utilities
//!
//! Shared infrastructure for all touchdv crates:
//! - Error types and result aliases
//! - Tick scheduling and monotonic time helpers for the output loop
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
