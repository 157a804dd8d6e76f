use serde::{Deserialize, Serialize};

/// Pairing code assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Draws allowed before registration gives up on finding a free code.
    pub max_code_attempts: u32,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            max_code_attempts: 64,
        }
    }
}
