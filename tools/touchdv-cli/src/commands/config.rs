//! Show or save the effective configuration.

use touchdv_common::config::{config_file_path, AppConfig};

pub fn run(config: &AppConfig, write: bool) -> anyhow::Result<()> {
    if let Err(e) = config.resampler.validate() {
        tracing::warn!(error = %e, "Effective configuration is invalid");
    }

    println!("{}", serde_json::to_string_pretty(config)?);

    if write {
        let path = config.save()?;
        println!();
        println!("Saved to {}", path.display());
    } else {
        println!();
        println!("Config file: {}", config_file_path().display());
    }

    Ok(())
}
