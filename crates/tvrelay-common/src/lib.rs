pub mod errors;
pub mod id;

pub use errors::{ConfigError, RelayError, TvRelayError};
pub use id::{new_id, ConnectionId, PairingCode, CODE_ALPHABET, CODE_LENGTH};
