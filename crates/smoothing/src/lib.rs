//! touchdv Smoothing
//!
//! Stateful, per-sample smoothing filters applied to resampled touch points:
//! - **None:** pass-through
//! - **EMA:** exponential moving average
//! - **Kalman:** constant-velocity model, scalar gain per axis
//! - **One-Euro:** adaptive low-pass whose cutoff rises with speed
//!
//! Filters only rewrite `x`/`y`; timestamp and touch state pass through.
//! This crate is pure computation with no threads and no I/O.

pub mod ema;
pub mod kalman;
pub mod one_euro;

pub use ema::EmaFilter;
pub use kalman::KalmanFilter;
pub use one_euro::OneEuroFilter;

use touchdv_touch_model::{SmoothingKind, SmoothingParams, TouchPoint};

/// A stateful point filter.
pub trait SmoothingStrategy: Send {
    /// Filter one point, updating internal state.
    fn smooth(&mut self, point: TouchPoint) -> TouchPoint;

    /// Forget all history; the next point initializes the filter.
    fn reset(&mut self);
}

/// The active smoothing filter.
#[derive(Debug, Clone, Default)]
pub enum Smoother {
    #[default]
    None,
    Ema(EmaFilter),
    Kalman(KalmanFilter),
    OneEuro(OneEuroFilter),
}

impl Smoother {
    /// Build a fresh filter of the given kind.
    pub fn new(kind: SmoothingKind, params: &SmoothingParams) -> Self {
        tracing::trace!(kind = %kind, "Building smoothing filter");
        match kind {
            SmoothingKind::None => Smoother::None,
            SmoothingKind::Ema => Smoother::Ema(EmaFilter::new(params.ema_alpha)),
            SmoothingKind::Kalman => {
                Smoother::Kalman(KalmanFilter::new(params.kalman_q, params.kalman_r))
            }
            SmoothingKind::OneEuro => Smoother::OneEuro(OneEuroFilter::new(
                params.one_euro_freq,
                params.one_euro_min_cutoff,
                params.one_euro_beta,
                params.one_euro_d_cutoff,
            )),
        }
    }

    /// Which filter this is.
    pub fn kind(&self) -> SmoothingKind {
        match self {
            Smoother::None => SmoothingKind::None,
            Smoother::Ema(_) => SmoothingKind::Ema,
            Smoother::Kalman(_) => SmoothingKind::Kalman,
            Smoother::OneEuro(_) => SmoothingKind::OneEuro,
        }
    }
}

impl SmoothingStrategy for Smoother {
    fn smooth(&mut self, point: TouchPoint) -> TouchPoint {
        match self {
            Smoother::None => point,
            Smoother::Ema(filter) => filter.smooth(point),
            Smoother::Kalman(filter) => filter.smooth(point),
            Smoother::OneEuro(filter) => filter.smooth(point),
        }
    }

    fn reset(&mut self) {
        match self {
            Smoother::None => {}
            Smoother::Ema(filter) => filter.reset(),
            Smoother::Kalman(filter) => filter.reset(),
            Smoother::OneEuro(filter) => filter.reset(),
        }
    }
}

pub(crate) fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
