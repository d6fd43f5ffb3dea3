//! Linux uinput multi-touch backend.
//!
//! Advertises a single-contact type-A multi-touch device and translates each
//! point into the tracking-id / position / pressure sequence the kernel
//! expects. Every frame is terminated by `SYN_REPORT`.

use std::fs::OpenOptions;
use std::os::unix::fs::MetadataExt;
use std::time::Duration;

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{
    AbsInfo, AbsoluteAxisType, AttributeSet, BusType, EventType, InputEvent, InputId, Key,
    Synchronization, UinputAbsSetup,
};

use touchdv_common::error::{TouchdvError, TouchdvResult};
use touchdv_touch_model::{ResamplerConfig, TouchPoint};

use crate::TouchDevice;

const UINPUT_PATH: &str = "/dev/uinput";
const VENDOR_ID: u16 = 0x1234;
const PRODUCT_ID: u16 = 0x5678;
const MAX_TRACKING_ID: i32 = 65535;
const MAX_PRESSURE: i32 = 255;

/// Time for udev/libinput to pick up a freshly created device.
const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Virtual touchscreen backed by `/dev/uinput`.
pub struct UinputTouchDevice {
    device: Option<VirtualDevice>,
    encoder: ContactEncoder,
}

impl UinputTouchDevice {
    pub fn new() -> Self {
        Self {
            device: None,
            encoder: ContactEncoder::new(150),
        }
    }

    /// Whether `/dev/uinput` can be opened for writing.
    pub fn is_supported() -> bool {
        OpenOptions::new().write(true).open(UINPUT_PATH).is_ok()
    }

    fn build_device(config: &ResamplerConfig) -> std::io::Result<VirtualDevice> {
        let mut keys = AttributeSet::<Key>::new();
        keys.insert(Key::BTN_TOUCH);

        let max_x = config.screen_width.saturating_sub(1) as i32;
        let max_y = config.screen_height.saturating_sub(1) as i32;
        let axis = |code, min, max| UinputAbsSetup::new(code, AbsInfo::new(0, min, max, 0, 0, 0));

        VirtualDeviceBuilder::new()?
            .name(config.device_name.as_str())
            .input_id(InputId::new(BusType::BUS_USB, VENDOR_ID, PRODUCT_ID, 1))
            .with_keys(&keys)?
            .with_absolute_axis(&axis(AbsoluteAxisType::ABS_MT_POSITION_X, 0, max_x))?
            .with_absolute_axis(&axis(AbsoluteAxisType::ABS_MT_POSITION_Y, 0, max_y))?
            .with_absolute_axis(&axis(AbsoluteAxisType::ABS_MT_PRESSURE, 0, MAX_PRESSURE))?
            .with_absolute_axis(&axis(
                AbsoluteAxisType::ABS_MT_TRACKING_ID,
                0,
                MAX_TRACKING_ID,
            ))?
            .build()
    }
}

impl Default for UinputTouchDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchDevice for UinputTouchDevice {
    fn setup(&mut self, config: &ResamplerConfig) -> TouchdvResult<()> {
        let device = Self::build_device(config).map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                TouchdvError::permission_denied(uinput_device_diagnostic())
            } else {
                TouchdvError::device(format!("Failed to create uinput device: {e}"))
            }
        })?;

        self.encoder = ContactEncoder::new(config.touch_pressure);
        self.device = Some(device);
        tracing::info!(
            name = %config.device_name,
            width = config.screen_width,
            height = config.screen_height,
            "uinput touch device created"
        );

        std::thread::sleep(SETTLE_DELAY);
        Ok(())
    }

    fn emit(&mut self, point: &TouchPoint) -> TouchdvResult<()> {
        let Some(device) = self.device.as_mut() else {
            return Err(TouchdvError::device("uinput device is not set up"));
        };

        // VirtualDevice::emit appends the SYN_REPORT.
        let events = self.encoder.encode(point);
        device
            .emit(&events)
            .map_err(|e| TouchdvError::device(format!("Failed writing to {UINPUT_PATH}: {e}")))
    }

    fn teardown(&mut self) {
        if self.device.take().is_some() {
            tracing::info!("uinput touch device destroyed");
        }
        self.encoder.reset();
    }

    fn name(&self) -> &str {
        "uinput"
    }
}

/// Tracks the live contact and produces the per-frame event sequence.
#[derive(Debug, Clone)]
pub struct ContactEncoder {
    pressure: i32,
    next_tracking_id: i32,
    current_tracking_id: Option<i32>,
}

impl ContactEncoder {
    pub fn new(pressure: u8) -> Self {
        Self {
            pressure: i32::from(pressure),
            next_tracking_id: 1,
            current_tracking_id: None,
        }
    }

    /// Tracking id of the live contact, if any.
    pub fn current_tracking_id(&self) -> Option<i32> {
        self.current_tracking_id
    }

    /// Events for one frame, excluding the trailing `SYN_REPORT`.
    pub fn encode(&mut self, point: &TouchPoint) -> Vec<InputEvent> {
        if point.touching {
            let id = match self.current_tracking_id {
                Some(id) => id,
                None => {
                    let id = self.next_tracking_id;
                    self.next_tracking_id = if id >= MAX_TRACKING_ID { 1 } else { id + 1 };
                    self.current_tracking_id = Some(id);
                    id
                }
            };
            vec![
                abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, id),
                abs(AbsoluteAxisType::ABS_MT_POSITION_X, point.x.round() as i32),
                abs(AbsoluteAxisType::ABS_MT_POSITION_Y, point.y.round() as i32),
                abs(AbsoluteAxisType::ABS_MT_PRESSURE, self.pressure),
                mt_report(),
                key(Key::BTN_TOUCH, 1),
            ]
        } else if self.current_tracking_id.take().is_some() {
            vec![
                abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, -1),
                mt_report(),
                key(Key::BTN_TOUCH, 0),
            ]
        } else {
            Vec::new()
        }
    }

    /// Forget the live contact without emitting anything.
    pub fn reset(&mut self) {
        self.current_tracking_id = None;
    }
}

fn abs(axis: AbsoluteAxisType, value: i32) -> InputEvent {
    InputEvent::new(EventType::ABSOLUTE, axis.0, value)
}

fn key(key: Key, value: i32) -> InputEvent {
    InputEvent::new(EventType::KEY, key.code(), value)
}

fn mt_report() -> InputEvent {
    InputEvent::new(
        EventType::SYNCHRONIZATION,
        Synchronization::SYN_MT_REPORT.0,
        0,
    )
}

/// Human-readable explanation of why `/dev/uinput` is not usable.
pub fn uinput_device_diagnostic() -> String {
    let uid = unsafe { libc::geteuid() };
    let gid = unsafe { libc::getegid() };

    match std::fs::metadata(UINPUT_PATH) {
        Ok(meta) => {
            let mode = meta.mode() & 0o777;
            let owner = meta.uid();
            let group = meta.gid();
            format!(
                "device={UINPUT_PATH} mode={mode:o} owner_uid={owner} owner_gid={group} process_uid={uid} process_gid={gid}; write access is required. Fix: add a udev rule granting the 'input' group rw access, or run as root"
            )
        }
        Err(err) => format!(
            "device={UINPUT_PATH} unavailable ({err}); load the uinput kernel module (sudo modprobe uinput)"
        ),
    }
}
