//! Core TOML config loading: read from path or platform default.

use crate::schema::TvRelayConfig;
use std::path::Path;
use tracing::info;
use tvrelay_common::ConfigError;

use super::paths::default_config_path;

/// Load config from a specific TOML file path.
///
/// Deserializes the file using serde defaults for any missing fields.
/// No range checks happen here; [`crate::load_config`] validates the result.
pub fn load_from_path(path: &Path) -> Result<TvRelayConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ParseError(format!("failed to read {}: {e}", path.display())),
    })?;

    let config: TvRelayConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On Linux: `~/.config/tvrelay/config.toml`
///
/// A missing file is not an error: the built-in defaults are returned.
pub fn load_default() -> Result<TvRelayConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config found at {}, using defaults", path.display());
            Ok(TvRelayConfig::default())
        }
        Err(e) => Err(e),
    }
}
