//! Config-related command implementations

use std::path::Path;

use adlens_core::config::{default_config_path, PipelineConfig};
use anyhow::{Context, Result};

/// Load the pipeline config for a command
pub fn load_config(explicit: Option<&Path>) -> Result<PipelineConfig> {
    let (config, source) = PipelineConfig::load(explicit).context("Failed to load config")?;
    match source {
        Some(path) => tracing::debug!(path = %path.display(), "Loaded pipeline config"),
        None => tracing::debug!("Using built-in pipeline config"),
    }
    Ok(config)
}

/// Print the effective configuration as TOML
pub fn cmd_config_show(explicit: Option<&Path>) -> Result<()> {
    let (config, source) = PipelineConfig::load(explicit).context("Failed to load config")?;
    let rendered = toml::to_string_pretty(&config).context("Failed to render config")?;

    match source {
        Some(path) => println!("# Loaded from {}\n", path.display()),
        None => println!("# Built-in defaults\n"),
    }
    println!("{}", rendered);
    Ok(())
}

/// Show which config file is in use and where overrides go
pub fn cmd_config_path(explicit: Option<&Path>) -> Result<()> {
    let (_, source) = PipelineConfig::load(explicit).context("Failed to load config")?;

    match source {
        Some(path) => println!("Active config: {}", path.display()),
        None => println!("Active config: (built-in defaults)"),
    }
    println!(
        "Override path: {}",
        default_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not available)".to_string())
    );
    Ok(())
}
