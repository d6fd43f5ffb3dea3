use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::sleep;
use std::time::{Duration, Instant};

use touchdv_common::clock::period_from_hz;
use touchdv_common::error::{TouchdvError, TouchdvResult};
use touchdv_resampler::VirtualTouchDevice;
use touchdv_touch_device::{MockTouchDevice, TouchDevice};
use touchdv_touch_model::{ResamplerConfig, SmoothingKind, SmoothingParams, TouchPoint};

type Recorded = Arc<Mutex<Vec<TouchPoint>>>;

fn config() -> ResamplerConfig {
    ResamplerConfig {
        output_rate_hz: 200.0,
        smoothing: SmoothingKind::None,
        ..ResamplerConfig::default()
    }
}

fn recording_device(config: ResamplerConfig) -> (VirtualTouchDevice, Recorded) {
    let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = recorded.clone();
    let mock = MockTouchDevice::with_callback(move |p| sink.lock().unwrap().push(*p));
    let device = VirtualTouchDevice::with_device(config, Box::new(mock)).unwrap();
    (device, recorded)
}

fn snapshot(recorded: &Recorded) -> Vec<TouchPoint> {
    recorded.lock().unwrap().clone()
}

fn releases(points: &[TouchPoint]) -> usize {
    points.iter().filter(|p| !p.touching).count()
}

fn assert_strictly_increasing(points: &[TouchPoint]) {
    for pair in points.windows(2) {
        assert!(
            pair[0].timestamp < pair[1].timestamp,
            "timestamps out of order: {:?}",
            pair
        );
    }
}

struct BrokenDevice {
    setup_calls: Arc<AtomicUsize>,
}

impl TouchDevice for BrokenDevice {
    fn setup(&mut self, _config: &ResamplerConfig) -> TouchdvResult<()> {
        self.setup_calls.fetch_add(1, Ordering::SeqCst);
        Err(TouchdvError::device("no virtual device available"))
    }

    fn emit(&mut self, _point: &TouchPoint) -> TouchdvResult<()> {
        Err(TouchdvError::device("not set up"))
    }

    fn teardown(&mut self) {}

    fn name(&self) -> &str {
        "broken"
    }
}

struct FlakyDevice {
    emitted: Recorded,
}

impl TouchDevice for FlakyDevice {
    fn setup(&mut self, _config: &ResamplerConfig) -> TouchdvResult<()> {
        Ok(())
    }

    fn emit(&mut self, point: &TouchPoint) -> TouchdvResult<()> {
        self.emitted.lock().unwrap().push(*point);
        Err(TouchdvError::device("write failed"))
    }

    fn teardown(&mut self) {}

    fn name(&self) -> &str {
        "flaky"
    }
}

#[test]
fn start_and_stop_are_idempotent() {
    let (device, _recorded) = recording_device(config());

    assert!(!device.is_running());
    assert!(device.start());
    assert!(device.start());
    assert!(device.is_running());

    device.stop();
    assert!(!device.is_running());
    device.stop();
    assert!(!device.is_running());
}

#[test]
fn setup_failure_keeps_engine_stopped() {
    let setup_calls = Arc::new(AtomicUsize::new(0));
    let device = VirtualTouchDevice::with_device(
        config(),
        Box::new(BrokenDevice {
            setup_calls: setup_calls.clone(),
        }),
    )
    .unwrap();

    assert!(!device.start());
    assert!(!device.is_running());
    assert!(!device.start(), "backend is retried and fails again");
    assert_eq!(setup_calls.load(Ordering::SeqCst), 2);
    device.stop();
}

#[test]
fn swipe_then_release_ends_with_single_release() {
    let (device, recorded) = recording_device(config());
    assert!(device.start());

    for i in 0..10 {
        device.push_input_point(TouchPoint::touch(
            Instant::now(),
            100.0 + i as f32 * 20.0,
            300.0,
        ));
        sleep(Duration::from_millis(10));
    }
    device.push_input_point(TouchPoint::release(Instant::now(), 300.0, 300.0));
    sleep(Duration::from_millis(50));

    let after_release = snapshot(&recorded);
    sleep(Duration::from_millis(30));
    device.stop();
    let points = snapshot(&recorded);

    assert!(points.len() > 5, "expected a stream, got {}", points.len());
    assert_eq!(points.len(), after_release.len(), "nothing emitted after release");
    assert_eq!(releases(&points), 1);
    let last = points.last().unwrap();
    assert!(!last.touching);
    assert_eq!((last.x, last.y), (300.0, 300.0));
    assert_strictly_increasing(&points);

    for p in &points {
        assert!(p.x >= 0.0 && p.x <= 1919.0);
        assert!(p.y >= 0.0 && p.y <= 1079.0);
    }
}

#[test]
fn stop_mid_touch_flushes_final_release() {
    let (device, recorded) = recording_device(config());
    assert!(device.start());

    device.push_input_point(TouchPoint::touch(Instant::now(), 640.0, 480.0));
    sleep(Duration::from_millis(40));
    device.stop();

    let points = snapshot(&recorded);
    assert!(points.iter().any(|p| p.touching));
    assert_eq!(releases(&points), 1);
    let last = points.last().unwrap();
    assert!(!last.touching);
    assert_eq!((last.x, last.y), (640.0, 480.0));
    assert_strictly_increasing(&points[..points.len() - 1]);
}

#[test]
fn silent_sensor_times_out_exactly_once() {
    let (device, recorded) = recording_device(ResamplerConfig {
        touch_timeout_ms: 40.0,
        ..config()
    });
    assert!(device.start());

    device.push_input_point(TouchPoint::touch(Instant::now(), 10.0, 20.0));
    sleep(Duration::from_millis(200));
    let settled = snapshot(&recorded);
    sleep(Duration::from_millis(50));
    device.stop();
    let points = snapshot(&recorded);

    assert_eq!(releases(&points), 1);
    assert!(!points.last().unwrap().touching);
    assert_eq!(points.len(), settled.len(), "no emissions after timeout");
}

#[test]
fn held_touch_is_emitted_at_fixed_period() {
    let rate_hz = 100.0;
    let (device, recorded) = recording_device(ResamplerConfig {
        output_rate_hz: rate_hz,
        touch_timeout_ms: 0.0,
        ..config()
    });
    assert!(device.start());

    device.push_input_point(TouchPoint::touch(Instant::now(), 50.0, 50.0));
    sleep(Duration::from_millis(120));
    device.stop();

    let touching: Vec<TouchPoint> = snapshot(&recorded)
        .into_iter()
        .filter(|p| p.touching)
        .collect();
    assert!(touching.len() >= 3, "got {} points", touching.len());

    let period = period_from_hz(rate_hz);
    for pair in touching.windows(2) {
        assert_eq!(pair[1].timestamp - pair[0].timestamp, period);
    }
}

#[test]
fn invalid_samples_are_dropped() {
    let (device, recorded) = recording_device(config());
    assert!(device.start());

    let now = Instant::now();
    device.push_input_point(TouchPoint::touch(now, f32::NAN, 10.0));
    device.push_input_point(TouchPoint::touch(now, 10.0, f32::INFINITY));
    device.push_input_point(TouchPoint::touch(now, -5000.0, 10.0));
    device.push_input_point(TouchPoint::touch(now, 10.0, 1080.0 + 1500.0));
    sleep(Duration::from_millis(40));
    device.stop();

    assert!(snapshot(&recorded).is_empty());
}

#[test]
fn observer_sees_every_emitted_point() {
    let (device, recorded) = recording_device(config());
    let observed = Arc::new(AtomicUsize::new(0));
    let counter = observed.clone();
    device.set_event_callback(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert!(device.start());

    device.push_input_point(TouchPoint::touch(Instant::now(), 1.0, 1.0));
    sleep(Duration::from_millis(30));
    device.stop();

    let emitted = snapshot(&recorded).len();
    assert!(emitted > 0);
    assert_eq!(observed.load(Ordering::SeqCst), emitted);
}

#[test]
fn emit_failures_do_not_stop_the_loop() {
    let emitted: Recorded = Arc::new(Mutex::new(Vec::new()));
    let device = VirtualTouchDevice::with_device(
        config(),
        Box::new(FlakyDevice {
            emitted: emitted.clone(),
        }),
    )
    .unwrap();
    assert!(device.start());

    device.push_input_point(TouchPoint::touch(Instant::now(), 5.0, 5.0));
    sleep(Duration::from_millis(40));
    assert!(device.is_running());
    device.stop();

    assert!(snapshot(&emitted).len() > 1);
}

#[test]
fn smoothing_and_threshold_change_while_running() {
    let (device, recorded) = recording_device(config());
    assert!(device.start());

    device.push_input_point(TouchPoint::touch(Instant::now(), 200.0, 200.0));
    sleep(Duration::from_millis(20));
    device.set_smoothing_type(SmoothingKind::OneEuro, SmoothingParams::default());
    device.set_touch_transition_threshold(0.3);
    device.push_input_point(TouchPoint::touch(Instant::now(), 220.0, 210.0));
    sleep(Duration::from_millis(20));
    device.stop();

    assert_eq!(device.smoothing_type(), SmoothingKind::OneEuro);
    assert_eq!(device.touch_transition_threshold(), 0.3);
    let points = snapshot(&recorded);
    assert!(points.len() > 2);
    assert_strictly_increasing(&points[..points.len() - 1]);
}

#[test]
fn engine_can_be_restarted() {
    let (device, recorded) = recording_device(config());

    assert!(device.start());
    device.push_input_point(TouchPoint::touch(Instant::now(), 1.0, 1.0));
    sleep(Duration::from_millis(20));
    device.stop();
    let first_run = snapshot(&recorded).len();
    assert!(first_run > 0);

    assert!(device.start());
    device.push_input_point(TouchPoint::touch(Instant::now(), 2.0, 2.0));
    sleep(Duration::from_millis(20));
    device.stop();
    assert!(snapshot(&recorded).len() > first_run);
}

#[test]
fn repeated_no_touch_samples_release_once() {
    let (device, recorded) = recording_device(config());
    assert!(device.start());

    for i in 0..5 {
        device.push_input_point(TouchPoint::touch(Instant::now(), 50.0 + i as f32, 60.0));
        sleep(Duration::from_millis(10));
    }
    for _ in 0..6 {
        device.push_input_point(TouchPoint::release(Instant::now(), 55.0, 60.0));
        sleep(Duration::from_millis(15));
    }
    device.stop();

    let points = snapshot(&recorded);
    assert_eq!(releases(&points), 1);
    assert!(!points.last().unwrap().touching);
}

#[test]
fn callback_may_query_device_during_stop() {
    let device = Arc::new(
        VirtualTouchDevice::with_device(config(), Box::new(MockTouchDevice::new())).unwrap(),
    );
    let observed = Arc::new(AtomicUsize::new(0));

    let weak = Arc::downgrade(&device);
    let sink = observed.clone();
    device.set_event_callback(move |_| {
        if let Some(device) = weak.upgrade() {
            let _ = device.is_running();
            sink.fetch_add(1, Ordering::SeqCst);
        }
    });

    assert!(device.start());
    device.push_input_point(TouchPoint::touch(Instant::now(), 100.0, 100.0));
    sleep(Duration::from_millis(30));

    let (done_tx, done_rx) = mpsc::channel();
    let stopper = device.clone();
    std::thread::spawn(move || {
        stopper.stop();
        let _ = done_tx.send(());
    });

    done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("stop() did not return while the callback queried the device");
    assert!(!device.is_running());
    assert!(observed.load(Ordering::SeqCst) > 0);
}

#[test]
fn callback_may_stop_the_device() {
    let device = Arc::new(
        VirtualTouchDevice::with_device(config(), Box::new(MockTouchDevice::new())).unwrap(),
    );
    let weak = Arc::downgrade(&device);
    device.set_event_callback(move |point| {
        if !point.touching {
            if let Some(device) = weak.upgrade() {
                device.stop();
            }
        }
    });

    assert!(device.start());
    device.push_input_point(TouchPoint::touch(Instant::now(), 100.0, 100.0));
    sleep(Duration::from_millis(20));
    device.push_input_point(TouchPoint::release(Instant::now(), 100.0, 100.0));
    sleep(Duration::from_millis(40));

    let (done_tx, done_rx) = mpsc::channel();
    let stopper = device.clone();
    std::thread::spawn(move || {
        stopper.stop();
        let _ = done_tx.send(());
    });
    done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("stop() did not return after the callback stopped the device");
    assert!(!device.is_running());
    assert!(device.start(), "backend is handed back after the join");
    device.stop();
}
