use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Symbols a pairing code is drawn from.
pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of symbols in a pairing code.
pub const CODE_LENGTH: usize = 4;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Identity of one live real-time connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(new_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Short human-typeable code a controller uses to address a receiver.
///
/// Always exactly [`CODE_LENGTH`] symbols from [`CODE_ALPHABET`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PairingCode(String);

impl PairingCode {
    /// Build a code from alphabet indices. Indices wrap modulo the alphabet size.
    pub fn from_symbol_indices(indices: [usize; CODE_LENGTH]) -> Self {
        let code = indices
            .iter()
            .map(|&i| CODE_ALPHABET[i % CODE_ALPHABET.len()] as char)
            .collect();
        Self(code)
    }

    /// Parse a well-formed code; `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::is_well_formed(raw).then(|| Self(raw.to_string()))
    }

    pub fn is_well_formed(raw: &str) -> bool {
        raw.len() == CODE_LENGTH && raw.bytes().all(|b| CODE_ALPHABET.contains(&b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PairingCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
