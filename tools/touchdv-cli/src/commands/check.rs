//! Check virtual touch device access.

use touchdv_touch_model::ResamplerConfig;

pub fn run(config: &ResamplerConfig) -> anyhow::Result<()> {
    println!("touchdv System Check");
    println!("{}", "=".repeat(50));

    match config.validate() {
        Ok(()) => println!(
            "[OK] Config: {}x{}, {} Hz in, {} Hz out, smoothing {}",
            config.screen_width,
            config.screen_height,
            config.input_rate_hz,
            config.output_rate_hz,
            config.smoothing
        ),
        Err(e) => println!("[FAIL] Config: {e}"),
    }

    let backend_ok = check_backend();

    println!();
    if backend_ok && config.validate().is_ok() {
        println!("Virtual touch device can be created. touchdv is ready.");
    } else {
        println!("Some requirements are missing. See above for fixes.");
    }

    Ok(())
}

#[cfg(target_os = "linux")]
fn check_backend() -> bool {
    use touchdv_touch_device::uinput::{uinput_device_diagnostic, UinputTouchDevice};

    if UinputTouchDevice::is_supported() {
        println!("[OK] /dev/uinput is writable");
        true
    } else {
        println!("[FAIL] /dev/uinput is not writable");
        println!("     {}", uinput_device_diagnostic());
        false
    }
}

#[cfg(not(target_os = "linux"))]
fn check_backend() -> bool {
    println!("[WARN] No virtual touch backend on this platform; only --mock demos will run");
    false
}
