//! touchdv Touch Device
//!
//! Output side of the resampler. A backend receives one point per output
//! tick and turns it into whatever the downstream consumer expects:
//!
//! - **Uinput:** Linux virtual multi-touch device (requires `/dev/uinput` access)
//! - **Mock:** In-process callback, for tests and UI simulators
//!
//! The resampler only depends on the [`TouchDevice`] trait.

pub mod mock;
#[cfg(target_os = "linux")]
pub mod uinput;

pub use mock::{EventCallback, MockTouchDevice};
#[cfg(target_os = "linux")]
pub use uinput::UinputTouchDevice;

use touchdv_common::error::TouchdvResult;
use touchdv_touch_model::{ResamplerConfig, TouchPoint};

/// Trait for touch output backends.
pub trait TouchDevice: Send {
    /// Create or open the underlying device. Called once per engine start.
    fn setup(&mut self, config: &ResamplerConfig) -> TouchdvResult<()>;

    /// Deliver one output point.
    fn emit(&mut self, point: &TouchPoint) -> TouchdvResult<()>;

    /// Release the underlying device. Safe to call when not set up.
    fn teardown(&mut self);

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Pick the output backend for the current system.
#[cfg(target_os = "linux")]
pub fn default_touch_device() -> Box<dyn TouchDevice> {
    tracing::info!("Using uinput touch backend");
    Box::new(UinputTouchDevice::new())
}

/// Pick the output backend for the current system.
#[cfg(not(target_os = "linux"))]
pub fn default_touch_device() -> Box<dyn TouchDevice> {
    tracing::warn!(
        "Virtual touch devices are not implemented for this platform; using mock backend"
    );
    Box::new(MockTouchDevice::new())
}
