//! Full configuration validation.
//!
//! Every section is checked and all problems are collected into a single
//! `ConfigError`, so one run reports everything that needs fixing.

mod helpers;


use crate::schema::TvRelayConfig;
use tvrelay_common::ConfigError;

use helpers::validate_range;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &TvRelayConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push("server.host must not be empty".to_string());
    }

    validate_range(
        &mut errors,
        "pairing.max_code_attempts",
        config.pairing.max_code_attempts,
        1,
        4096,
    );
    validate_range(
        &mut errors,
        "connection.outbound_buffer",
        config.connection.outbound_buffer,
        1,
        65536,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
