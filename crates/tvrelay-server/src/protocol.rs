//! Real-time channel wire protocol. Every frame is a JSON text message tagged
//! by `type`.

use serde::{Deserialize, Serialize};
use tvrelay_common::PairingCode;

/// Events the server pushes to a receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "connected")]
    Connected { code: PairingCode },

    #[serde(rename = "control")]
    Control { command: String },

    #[serde(rename = "reply")]
    Reply { message: String },

    #[serde(rename = "ack")]
    Ack { message: String },

    #[serde(rename = "bye")]
    Bye { last: String },

    #[serde(rename = "error")]
    Error { message: String },
}

/// Events a receiver sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "notice")]
    Notice { message: String },

    #[serde(rename = "msg")]
    Msg { message: String },

    #[serde(rename = "bye")]
    Bye,
}
