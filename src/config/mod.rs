mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./streamdemux.toml",
        "~/.config/streamdemux/config.toml",
        "/etc/streamdemux/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let demux = &config.demux;

    if !(demux.fallback_frame_rate.is_finite() && demux.fallback_frame_rate > 0.0) {
        anyhow::bail!(
            "demux.fallback_frame_rate must be a positive number, got {}",
            demux.fallback_frame_rate
        );
    }

    if let Some(ms) = demux.duration_override_ms {
        if !(ms.is_finite() && ms >= 0.0) {
            anyhow::bail!("demux.duration_override_ms must be non-negative, got {}", ms);
        }
    }

    // Full filter directives such as "streamdemux=debug" are allowed too
    let level = config.logging.level.trim();
    if level.is_empty() {
        anyhow::bail!("logging.level cannot be empty");
    }
    if !level.contains('=') && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        tracing::warn!("Unrecognized log level {:?}, passing it to the filter as is", level);
    }

    Ok(())
}
