//! Sender thread: fixed-period output loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use touchdv_common::clock::TickSchedule;
use touchdv_smoothing::Smoother;
use touchdv_touch_device::TouchDevice;
use touchdv_touch_model::{SmoothingKind, SmoothingParams, TouchPoint};

use crate::engine::Resampler;
use crate::mailbox::LatestSlot;
use crate::virtual_device::EventObserver;

/// Filter selection requested from the caller side.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SmoothingSelection {
    pub kind: SmoothingKind,
    pub params: SmoothingParams,
}

/// State shared between the facade and the sender thread.
pub(crate) struct Shared {
    pub mailbox: LatestSlot<TouchPoint>,
    threshold_bits: AtomicU64,
    smoothing: Mutex<SmoothingSelection>,
    smoothing_generation: AtomicU64,
    observer: Mutex<Option<EventObserver>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    pub fn new(threshold: f64, smoothing: SmoothingSelection) -> Self {
        Self {
            mailbox: LatestSlot::new(),
            threshold_bits: AtomicU64::new(threshold.to_bits()),
            smoothing: Mutex::new(smoothing),
            smoothing_generation: AtomicU64::new(0),
            observer: Mutex::new(None),
        }
    }

    pub fn threshold(&self) -> f64 {
        f64::from_bits(self.threshold_bits.load(Ordering::Acquire))
    }

    pub fn set_threshold(&self, threshold: f64) {
        self.threshold_bits.store(threshold.to_bits(), Ordering::Release);
    }

    pub fn smoothing(&self) -> SmoothingSelection {
        *lock(&self.smoothing)
    }

    pub fn set_smoothing(&self, selection: SmoothingSelection) {
        *lock(&self.smoothing) = selection;
        self.smoothing_generation.fetch_add(1, Ordering::AcqRel);
    }

    pub fn smoothing_generation(&self) -> u64 {
        self.smoothing_generation.load(Ordering::Acquire)
    }

    pub fn set_observer(&self, observer: Option<EventObserver>) {
        *lock(&self.observer) = observer;
    }

    fn observer(&self) -> Option<EventObserver> {
        lock(&self.observer).clone()
    }
}

/// Delivers points to the observer, then the backend.
struct Output {
    device: Box<dyn TouchDevice>,
    shared: Arc<Shared>,
    emitted: u64,
    failures: u64,
    failing: bool,
}

impl Output {
    fn emit(&mut self, point: &TouchPoint) {
        if let Some(observer) = self.shared.observer() {
            observer(point);
        }

        match self.device.emit(point) {
            Ok(()) => {
                self.emitted += 1;
                if self.failing {
                    tracing::info!(backend = self.device.name(), "Touch backend recovered");
                    self.failing = false;
                }
            }
            Err(e) => {
                self.failures += 1;
                if !self.failing {
                    tracing::warn!(
                        backend = self.device.name(),
                        error = %e,
                        "Failed to emit touch point"
                    );
                    self.failing = true;
                }
            }
        }
    }
}

/// Run the output loop until the mailbox is closed, then flush a final
/// release. Hands the backend back for teardown.
pub(crate) fn run(
    shared: Arc<Shared>,
    mut resampler: Resampler,
    device: Box<dyn TouchDevice>,
    rate_hz: f64,
) -> Box<dyn TouchDevice> {
    let mut schedule = TickSchedule::new(rate_hz, Instant::now());
    let mut output = Output {
        device,
        shared: shared.clone(),
        emitted: 0,
        failures: 0,
        failing: false,
    };
    let mut seen_generation = None;
    let mut ticks: u64 = 0;

    tracing::debug!(
        rate_hz,
        period_us = schedule.period().as_micros() as u64,
        "Sender loop started"
    );

    loop {
        let target = schedule.advance();
        if !shared.mailbox.wait_until(target) {
            break;
        }
        ticks += 1;

        let generation = shared.smoothing_generation();
        if seen_generation != Some(generation) {
            let selection = shared.smoothing();
            resampler.set_smoother(Smoother::new(selection.kind, &selection.params));
            if seen_generation.is_some() {
                tracing::debug!(kind = %selection.kind, "Smoothing filter swapped");
            }
            seen_generation = Some(generation);
        }
        resampler.set_transition_threshold(shared.threshold());

        let input = shared.mailbox.take();
        if let Some(point) = resampler.tick(target, input) {
            output.emit(&point);
        }
    }

    if let Some(release) = resampler.finish(Instant::now()) {
        tracing::debug!(x = release.x, y = release.y, "Final release on stop");
        output.emit(&release);
    }

    tracing::debug!(
        ticks,
        emitted = output.emitted,
        failures = output.failures,
        "Sender loop finished"
    );
    output.device
}
