use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures surfaced by the session registry and the control relay.
///
/// `MissingParameter` and `CodeNotFound` are normal outcomes at the HTTP
/// boundary; their `Display` text is the response body clients expect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("{0}")]
    MissingParameter(String),

    #[error("TVCode Not Found")]
    CodeNotFound,

    #[error("no free pairing code after {attempts} attempts")]
    CapacityExhausted { attempts: u32 },

    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TvRelayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
