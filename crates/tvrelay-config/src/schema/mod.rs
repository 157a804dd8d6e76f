//! Configuration schema types for tvrelay.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod connection;
mod http;
mod pairing;
mod server;

pub use connection::*;
pub use http::*;
pub use pairing::*;
pub use server::*;

use serde::{Deserialize, Serialize};

/// Root configuration for the relay server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TvRelayConfig {
    pub server: ServerConfig,
    pub pairing: PairingConfig,
    pub connection: ConnectionConfig,
    pub http: HttpConfig,
}
