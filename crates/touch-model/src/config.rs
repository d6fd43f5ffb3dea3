//! Resampler configuration and smoothing selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Upper bound for the touch transition threshold.
pub const MAX_TRANSITION_THRESHOLD: f64 = 0.5;

/// Accepted input and output rates (Hz).
pub const MIN_RATE_HZ: f64 = 0.1;
pub const MAX_RATE_HZ: f64 = 10_000.0;

/// Longest history retention window (seconds).
pub const MAX_HISTORY_SECS: f64 = 60.0;

/// Longest extrapolation horizon and touch timeout (milliseconds).
pub const MAX_WINDOW_MS: f64 = 60_000.0;

/// Hard cap on pre-allocated history entries.
const MAX_HISTORY_CAPACITY: usize = 1 << 20;

/// Configuration validation failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("screen dimensions must be non-zero (got {width}x{height})")]
    EmptyScreen { width: u32, height: u32 },

    #[error("{field} must be a positive finite number (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must be a non-negative finite number (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("unknown smoothing type '{0}' (expected none, ema, kalman, or one-euro)")]
    UnknownSmoothing(String),
}

/// Resampling engine parameters.
///
/// Copied into the engine at construction. Only the smoothing selection and
/// the transition threshold may change while the engine runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResamplerConfig {
    /// Screen width in device units.
    pub screen_width: u32,

    /// Screen height in device units.
    pub screen_height: u32,

    /// Nominal sensor rate (Hz); used to size the history buffer.
    pub input_rate_hz: f64,

    /// Output event rate (Hz).
    pub output_rate_hz: f64,

    /// History retention window (seconds).
    pub max_input_history_secs: f64,

    /// Maximum extrapolation horizon past the newest sample (milliseconds).
    pub max_extrapolation_ms: f64,

    /// Auto-release a touch after this long without input (milliseconds, 0 = disabled).
    pub touch_timeout_ms: f64,

    /// Interpolation fraction at which a down/up change takes effect, in `[0, 0.5]`.
    pub touch_transition_threshold: f64,

    /// Active smoothing filter.
    pub smoothing: SmoothingKind,

    /// Per-filter parameters.
    pub smoothing_params: SmoothingParams,

    /// Name advertised by the virtual device.
    pub device_name: String,

    /// Contact pressure reported while touching (0-255).
    pub touch_pressure: u8,
}

impl Default for ResamplerConfig {
    fn default() -> Self {
        Self {
            screen_width: 1920,
            screen_height: 1080,
            input_rate_hz: 30.0,
            output_rate_hz: 120.0,
            max_input_history_secs: 1.0,
            max_extrapolation_ms: 50.0,
            touch_timeout_ms: 200.0,
            touch_transition_threshold: 0.1,
            smoothing: SmoothingKind::Ema,
            smoothing_params: SmoothingParams {
                ema_alpha: 0.45,
                ..SmoothingParams::default()
            },
            device_name: "Virtual IR Touch".to_string(),
            touch_pressure: 150,
        }
    }
}

impl ResamplerConfig {
    /// Check that rates, windows, and bounds are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(ConfigError::EmptyScreen {
                width: self.screen_width,
                height: self.screen_height,
            });
        }
        positive("output_rate_hz", self.output_rate_hz)?;
        positive("input_rate_hz", self.input_rate_hz)?;
        positive("max_input_history_secs", self.max_input_history_secs)?;
        non_negative("max_extrapolation_ms", self.max_extrapolation_ms)?;
        non_negative("touch_timeout_ms", self.touch_timeout_ms)?;

        within("output_rate_hz", self.output_rate_hz, MIN_RATE_HZ, MAX_RATE_HZ)?;
        within("input_rate_hz", self.input_rate_hz, MIN_RATE_HZ, MAX_RATE_HZ)?;
        within(
            "max_input_history_secs",
            self.max_input_history_secs,
            0.0,
            MAX_HISTORY_SECS,
        )?;
        within(
            "max_extrapolation_ms",
            self.max_extrapolation_ms,
            0.0,
            MAX_WINDOW_MS,
        )?;
        within("touch_timeout_ms", self.touch_timeout_ms, 0.0, MAX_WINDOW_MS)?;
        Ok(())
    }

    /// Expected number of history entries, with headroom.
    pub fn history_capacity(&self) -> usize {
        let expected = self.input_rate_hz * self.max_input_history_secs * 1.5;
        if expected.is_finite() && expected > 0.0 {
            (expected as usize).clamp(100, MAX_HISTORY_CAPACITY)
        } else {
            100
        }
    }
}

/// Clamp a transition threshold into `[0, 0.5]`. NaN maps to 0.
pub fn clamp_transition_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        return 0.0;
    }
    threshold.clamp(0.0, MAX_TRANSITION_THRESHOLD)
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn within(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

/// Available smoothing filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmoothingKind {
    /// Pass points through unchanged.
    None,
    /// Exponential moving average.
    #[default]
    Ema,
    /// Constant-velocity Kalman filter.
    Kalman,
    /// 1-Euro adaptive low-pass filter.
    OneEuro,
}

impl SmoothingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmoothingKind::None => "none",
            SmoothingKind::Ema => "ema",
            SmoothingKind::Kalman => "kalman",
            SmoothingKind::OneEuro => "one-euro",
        }
    }
}

impl fmt::Display for SmoothingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmoothingKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(SmoothingKind::None),
            "ema" => Ok(SmoothingKind::Ema),
            "kalman" => Ok(SmoothingKind::Kalman),
            "one-euro" | "one_euro" | "oneeuro" => Ok(SmoothingKind::OneEuro),
            other => Err(ConfigError::UnknownSmoothing(other.to_string())),
        }
    }
}

/// Per-filter tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    /// EMA weight of the newest sample, in `[0, 1]`.
    pub ema_alpha: f64,

    /// Kalman process noise (Q).
    pub kalman_q: f64,

    /// Kalman measurement noise (R).
    pub kalman_r: f64,

    /// One-Euro nominal sample frequency (Hz), used before the first interval is known.
    pub one_euro_freq: f64,

    /// One-Euro minimum cutoff frequency (Hz).
    pub one_euro_min_cutoff: f64,

    /// One-Euro speed coefficient.
    pub one_euro_beta: f64,

    /// One-Euro derivative cutoff frequency (Hz).
    pub one_euro_d_cutoff: f64,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            ema_alpha: 0.5,
            kalman_q: 0.01,
            kalman_r: 1.0,
            one_euro_freq: 120.0,
            one_euro_min_cutoff: 1.0,
            one_euro_beta: 0.007,
            one_euro_d_cutoff: 1.0,
        }
    }
}
