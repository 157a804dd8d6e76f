//! tvrelay configuration.
//!
//! TOML-based configuration with validation. All sections use defaults, so
//! an empty or partial file works out of the box.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{ConnectionConfig, HttpConfig, PairingConfig, ServerConfig, TvRelayConfig};

use std::path::Path;
use tvrelay_common::ConfigError;

/// Load and validate config.
///
/// Reads `path` when given, otherwise the platform default location (falling
/// back to defaults when that file does not exist).
pub fn load_config(path: Option<&Path>) -> Result<TvRelayConfig, ConfigError> {
    let config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };

    validation::validate(&config)?;
    Ok(config)
}
