use serde::{Deserialize, Serialize};

/// Per-connection settings for receiver sockets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Capacity of each connection's outbound event queue.
    pub outbound_buffer: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            outbound_buffer: 64,
        }
    }
}
