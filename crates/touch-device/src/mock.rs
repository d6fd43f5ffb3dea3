//! In-process mock backend.

use touchdv_common::error::TouchdvResult;
use touchdv_touch_model::{ResamplerConfig, TouchPoint};

use crate::TouchDevice;

/// Callback invoked with each emitted point.
pub type EventCallback = Box<dyn FnMut(&TouchPoint) + Send>;

/// Backend that hands every point to a callback instead of the kernel.
pub struct MockTouchDevice {
    callback: Option<EventCallback>,
    config: Option<ResamplerConfig>,
    emitted: u64,
}

impl MockTouchDevice {
    /// A mock that drops every point.
    pub fn new() -> Self {
        Self {
            callback: None,
            config: None,
            emitted: 0,
        }
    }

    /// A mock that forwards every point to `callback`.
    pub fn with_callback(callback: impl FnMut(&TouchPoint) + Send + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
            ..Self::new()
        }
    }

    /// Replace the callback.
    pub fn set_callback(&mut self, callback: impl FnMut(&TouchPoint) + Send + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Configuration received by the last `setup`, if still set up.
    pub fn config(&self) -> Option<&ResamplerConfig> {
        self.config.as_ref()
    }

    /// Number of points emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl Default for MockTouchDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchDevice for MockTouchDevice {
    fn setup(&mut self, config: &ResamplerConfig) -> TouchdvResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn emit(&mut self, point: &TouchPoint) -> TouchdvResult<()> {
        self.emitted += 1;
        if let Some(callback) = self.callback.as_mut() {
            callback(point);
        }
        Ok(())
    }

    fn teardown(&mut self) {
        self.config = None;
    }

    fn name(&self) -> &str {
        "mock"
    }
}
