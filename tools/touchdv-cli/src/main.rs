//! touchdv CLI — drive and inspect the resampling virtual touch device.
//!
//! Usage:
//!   touchdv demo [OPTIONS]     Push a synthetic swipe through the engine
//!   touchdv check              Check virtual device access
//!   touchdv config [--write]   Show or save the effective configuration

use clap::{Parser, Subcommand};

use touchdv_common::config::AppConfig;
use touchdv_touch_model::SmoothingKind;

mod commands;

#[derive(Parser)]
#[command(
    name = "touchdv",
    about = "Resample sparse touch input into a smooth virtual touchscreen",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Push a synthetic diagonal swipe through the engine, then release
    Demo {
        /// Emit to an in-process mock instead of /dev/uinput
        #[arg(long)]
        mock: bool,

        /// Smoothing filter: none|ema|kalman|one-euro
        #[arg(long)]
        smoothing: Option<SmoothingKind>,

        /// Screen width override
        #[arg(long)]
        width: Option<u32>,

        /// Screen height override
        #[arg(long)]
        height: Option<u32>,

        /// Input sample rate override (Hz)
        #[arg(long)]
        input_hz: Option<f64>,

        /// Output rate override (Hz)
        #[arg(long)]
        output_hz: Option<f64>,

        /// Swipe duration (seconds)
        #[arg(short, long, default_value = "1.0")]
        duration: f64,
    },

    /// Check whether a virtual touch device can be created
    Check,

    /// Print the effective configuration as JSON
    Config {
        /// Save the effective configuration to the standard location
        #[arg(long)]
        write: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load();

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    touchdv_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Demo {
            mock,
            smoothing,
            width,
            height,
            input_hz,
            output_hz,
            duration,
        } => commands::demo::run(
            config.resampler,
            commands::demo::DemoOptions {
                mock,
                smoothing,
                width,
                height,
                input_hz,
                output_hz,
                duration_secs: duration,
            },
        ),
        Commands::Check => commands::check::run(&config.resampler),
        Commands::Config { write } => commands::config::run(&config, write),
    }
}
