//! Synthetic swipe demo.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use touchdv_common::clock::{period_from_hz, TickSchedule};
use touchdv_resampler::VirtualTouchDevice;
use touchdv_touch_device::{default_touch_device, MockTouchDevice, TouchDevice};
use touchdv_touch_model::{ResamplerConfig, SmoothingKind, TouchPoint};

/// Command-line overrides for the demo.
pub struct DemoOptions {
    pub mock: bool,
    pub smoothing: Option<SmoothingKind>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub input_hz: Option<f64>,
    pub output_hz: Option<f64>,
    pub duration_secs: f64,
}

#[derive(Default)]
struct Counters {
    touching: AtomicU64,
    released: AtomicU64,
}

pub fn run(mut config: ResamplerConfig, options: DemoOptions) -> anyhow::Result<()> {
    if let Some(kind) = options.smoothing {
        config.smoothing = kind;
    }
    if let Some(width) = options.width {
        config.screen_width = width;
    }
    if let Some(height) = options.height {
        config.screen_height = height;
    }
    if let Some(hz) = options.input_hz {
        config.input_rate_hz = hz;
    }
    if let Some(hz) = options.output_hz {
        config.output_rate_hz = hz;
    }
    config.validate()?;
    if !(options.duration_secs.is_finite() && options.duration_secs > 0.0) {
        anyhow::bail!("Duration must be positive, got {}", options.duration_secs);
    }

    let backend: Box<dyn TouchDevice> = if options.mock {
        Box::new(MockTouchDevice::new())
    } else {
        default_touch_device()
    };
    let engine = VirtualTouchDevice::with_device(config.clone(), backend)?;

    let counters = Arc::new(Counters::default());
    let sink = counters.clone();
    engine.set_event_callback(move |point| {
        let counter = if point.touching {
            &sink.touching
        } else {
            &sink.released
        };
        counter.fetch_add(1, Ordering::Relaxed);
    });

    if !engine.start() {
        anyhow::bail!("Failed to start the virtual touch device (see `touchdv check`)");
    }

    println!(
        "Swiping {}x{} for {:.2}s: {} Hz in, {} Hz out, smoothing {}",
        config.screen_width,
        config.screen_height,
        options.duration_secs,
        config.input_rate_hz,
        config.output_rate_hz,
        config.smoothing
    );

    let started = Instant::now();
    let total = Duration::from_secs_f64(options.duration_secs);
    let mut schedule = TickSchedule::new(config.input_rate_hz, started);
    let mut pushed: u64 = 0;
    let mut position = swipe_position(&config, 0.0);

    loop {
        let elapsed = started.elapsed();
        if elapsed >= total {
            break;
        }
        position = swipe_position(&config, elapsed.as_secs_f64() / total.as_secs_f64());
        engine.push_input_point(TouchPoint::touch(Instant::now(), position.0, position.1));
        pushed += 1;

        let next = schedule.advance();
        std::thread::sleep(next.saturating_duration_since(Instant::now()));
    }

    engine.push_input_point(TouchPoint::release(Instant::now(), position.0, position.1));
    pushed += 1;
    std::thread::sleep(period_from_hz(config.output_rate_hz) * 3);
    engine.stop();

    let touching = counters.touching.load(Ordering::Relaxed);
    let released = counters.released.load(Ordering::Relaxed);
    tracing::debug!(pushed, touching, released, "Demo finished");

    println!("Input samples pushed: {pushed}");
    println!("Points emitted:       {}", touching + released);
    println!("  touching:           {touching}");
    println!("  released:           {released}");
    if pushed > 0 {
        println!(
            "Upsampling ratio:     {:.2}x",
            (touching + released) as f64 / pushed as f64
        );
    }

    Ok(())
}

/// Point on a diagonal from 10% to 90% of the screen at `progress` in [0, 1].
fn swipe_position(config: &ResamplerConfig, progress: f64) -> (f32, f32) {
    let t = progress.clamp(0.0, 1.0);
    let w = f64::from(config.screen_width);
    let h = f64::from(config.screen_height);
    ((w * (0.1 + 0.8 * t)) as f32, (h * (0.1 + 0.8 * t)) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swipe_spans_the_diagonal() {
        let config = ResamplerConfig::default();
        assert_eq!(swipe_position(&config, 0.0), (192.0, 108.0));
        assert_eq!(swipe_position(&config, 1.0), (1728.0, 972.0));
        assert_eq!(swipe_position(&config, 2.0), swipe_position(&config, 1.0));
    }
}
