//! touchdv Resampler
//!
//! Ingests touch samples arriving at an irregular, low rate and emits a
//! steady, higher-rate stream to a [`TouchDevice`] backend.
//!
//! - **Mailbox:** single-slot, latest-value-wins hand-off from producers
//! - **History:** bounded, time-ordered samples owned by the sender thread
//! - **Resampler:** per-tick bracketing, interpolation/extrapolation,
//!   touch-state reconstruction, smoothing, and clamping
//! - **VirtualTouchDevice:** start/stop lifecycle around one sender thread
//!
//! [`TouchDevice`]: touchdv_touch_device::TouchDevice

pub mod engine;
pub mod history;
pub mod interpolate;
pub mod mailbox;
pub mod virtual_device;
mod worker;

pub use engine::Resampler;
pub use history::{Bracket, History};
pub use mailbox::LatestSlot;
pub use virtual_device::{EventObserver, VirtualTouchDevice};
