//! Public facade: a virtual touchscreen fed by sparse sensor samples.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use touchdv_common::error::TouchdvResult;
use touchdv_touch_device::{default_touch_device, TouchDevice};
use touchdv_touch_model::{
    clamp_transition_threshold, ResamplerConfig, SmoothingKind, SmoothingParams, TouchPoint,
};

use crate::engine::Resampler;
use crate::worker::{self, Shared, SmoothingSelection};

/// Observer invoked with every emitted point before it reaches the backend.
pub type EventObserver = Arc<dyn Fn(&TouchPoint) + Send + Sync>;

/// Samples further than this outside the screen are treated as glitches.
const INPUT_MARGIN: f32 = 1000.0;

const SENDER_THREAD_NAME: &str = "touchdv-sender";

struct Lifecycle {
    /// Backend while stopped; moved into the sender thread while running.
    device: Option<Box<dyn TouchDevice>>,
    sender: Option<JoinHandle<Box<dyn TouchDevice>>>,
}

/// Resampling virtual touch device.
///
/// Any thread may push samples; one sender thread owns history, smoothing,
/// and the backend while running. Dropping the device stops it.
pub struct VirtualTouchDevice {
    config: ResamplerConfig,
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
}

impl VirtualTouchDevice {
    /// Create a device using the platform's default backend.
    pub fn new(config: ResamplerConfig) -> TouchdvResult<Self> {
        Self::with_device(config, default_touch_device())
    }

    /// Create a device that emits through `device`.
    pub fn with_device(
        config: ResamplerConfig,
        device: Box<dyn TouchDevice>,
    ) -> TouchdvResult<Self> {
        config.validate()?;

        let shared = Shared::new(
            clamp_transition_threshold(config.touch_transition_threshold),
            SmoothingSelection {
                kind: config.smoothing,
                params: config.smoothing_params,
            },
        );

        Ok(Self {
            config,
            shared: Arc::new(shared),
            lifecycle: Mutex::new(Lifecycle {
                device: Some(device),
                sender: None,
            }),
        })
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &ResamplerConfig {
        &self.config
    }

    /// Set up the backend and start the sender thread.
    ///
    /// Returns `false` if the backend could not be set up. Calling this on a
    /// running device returns `true` without doing anything.
    pub fn start(&self) -> bool {
        let mut lifecycle = self.lifecycle();
        if lifecycle.sender.is_some() {
            return true;
        }

        let Some(mut device) = lifecycle.device.take() else {
            tracing::warn!("Touch backend unavailable: device is stopping or its sender panicked");
            return false;
        };

        if let Err(e) = device.setup(&self.config) {
            tracing::warn!(
                backend = device.name(),
                error = %e,
                "Failed to set up touch backend"
            );
            lifecycle.device = Some(device);
            return false;
        }

        let backend = device.name().to_string();
        self.shared.mailbox.open();
        let shared = self.shared.clone();
        let resampler = Resampler::new(&self.config);
        let rate_hz = self.config.output_rate_hz;

        let spawned = std::thread::Builder::new()
            .name(SENDER_THREAD_NAME.to_string())
            .spawn(move || worker::run(shared, resampler, device, rate_hz));

        match spawned {
            Ok(handle) => {
                lifecycle.sender = Some(handle);
                tracing::info!(
                    backend = %backend,
                    input_hz = self.config.input_rate_hz,
                    output_hz = self.config.output_rate_hz,
                    width = self.config.screen_width,
                    height = self.config.screen_height,
                    "Virtual touch device started"
                );
                true
            }
            Err(e) => {
                self.shared.mailbox.close();
                tracing::error!(error = %e, "Failed to spawn sender thread");
                false
            }
        }
    }

    /// Stop the sender thread, emitting a final release if a touch was
    /// active, and tear down the backend. No-op when not running.
    ///
    /// Called from the event callback, this only signals the sender thread;
    /// a later `stop()` from another thread completes the teardown.
    pub fn stop(&self) {
        let sender = {
            let mut lifecycle = self.lifecycle();
            let Some(sender) = lifecycle.sender.take() else {
                return;
            };
            if sender.thread().id() == std::thread::current().id() {
                self.shared.mailbox.close();
                lifecycle.sender = Some(sender);
                return;
            }
            sender
        };

        // Joined without the lifecycle lock held.
        self.shared.mailbox.close();
        match sender.join() {
            Ok(mut device) => {
                device.teardown();
                self.lifecycle().device = Some(device);
                tracing::info!("Virtual touch device stopped");
            }
            Err(_) => tracing::error!("Sender thread panicked; touch backend dropped"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle().sender.is_some()
    }

    /// Offer a sensor sample. Non-finite or far off-screen samples are
    /// dropped; an unconsumed earlier sample is replaced.
    pub fn push_input_point(&self, point: TouchPoint) {
        if !self.accepts(&point) {
            tracing::debug!(x = point.x, y = point.y, "Dropping invalid touch sample");
            return;
        }
        if self.shared.mailbox.publish(point) {
            tracing::trace!("Unconsumed touch sample overwritten");
        }
    }

    fn accepts(&self, point: &TouchPoint) -> bool {
        if !point.is_finite() {
            return false;
        }
        let max_x = self.config.screen_width as f32 + INPUT_MARGIN;
        let max_y = self.config.screen_height as f32 + INPUT_MARGIN;
        (-INPUT_MARGIN..=max_x).contains(&point.x) && (-INPUT_MARGIN..=max_y).contains(&point.y)
    }

    /// Switch smoothing filter. Takes effect on the next tick with fresh
    /// filter state.
    pub fn set_smoothing_type(&self, kind: SmoothingKind, params: SmoothingParams) {
        self.shared.set_smoothing(SmoothingSelection { kind, params });
        tracing::debug!(kind = %kind, "Smoothing filter requested");
    }

    pub fn smoothing_type(&self) -> SmoothingKind {
        self.shared.smoothing().kind
    }

    /// Set the touch transition threshold, clamped to `[0, 0.5]`.
    pub fn set_touch_transition_threshold(&self, threshold: f64) {
        self.shared.set_threshold(clamp_transition_threshold(threshold));
    }

    pub fn touch_transition_threshold(&self) -> f64 {
        self.shared.threshold()
    }

    /// Observe every emitted point. Replaces any earlier observer.
    ///
    /// The callback runs on the sender thread and may call back into the
    /// device.
    pub fn set_event_callback(&self, callback: impl Fn(&TouchPoint) + Send + Sync + 'static) {
        self.shared.set_observer(Some(Arc::new(callback)));
    }

    pub fn clear_event_callback(&self) {
        self.shared.set_observer(None);
    }
}

impl Drop for VirtualTouchDevice {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use touchdv_touch_device::MockTouchDevice;

    fn device() -> VirtualTouchDevice {
        VirtualTouchDevice::with_device(
            ResamplerConfig::default(),
            Box::new(MockTouchDevice::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = ResamplerConfig {
            output_rate_hz: 0.0,
            ..ResamplerConfig::default()
        };
        assert!(
            VirtualTouchDevice::with_device(config, Box::new(MockTouchDevice::new())).is_err()
        );
    }

    #[test]
    fn test_threshold_setter_clamps() {
        let device = device();
        assert_eq!(device.touch_transition_threshold(), 0.1);
        device.set_touch_transition_threshold(0.75);
        assert_eq!(device.touch_transition_threshold(), 0.5);
        device.set_touch_transition_threshold(-0.2);
        assert_eq!(device.touch_transition_threshold(), 0.0);
        device.set_touch_transition_threshold(f64::NAN);
        assert_eq!(device.touch_transition_threshold(), 0.0);
    }

    #[test]
    fn test_input_validation() {
        let device = device();
        let now = Instant::now();

        assert!(device.accepts(&TouchPoint::touch(now, 0.0, 0.0)));
        assert!(device.accepts(&TouchPoint::touch(now, -999.0, 2079.0)));
        assert!(!device.accepts(&TouchPoint::touch(now, -1001.0, 0.0)));
        assert!(!device.accepts(&TouchPoint::touch(now, 0.0, 2081.0)));
        assert!(!device.accepts(&TouchPoint::touch(now, f32::NAN, 0.0)));
        assert!(!device.accepts(&TouchPoint::touch(now, 0.0, f32::INFINITY)));
    }

    #[test]
    fn test_smoothing_selection() {
        let device = device();
        assert_eq!(device.smoothing_type(), SmoothingKind::Ema);
        device.set_smoothing_type(SmoothingKind::Kalman, SmoothingParams::default());
        assert_eq!(device.smoothing_type(), SmoothingKind::Kalman);
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let device = device();
        device.stop();
        device.stop();
        assert!(!device.is_running());
    }
}
