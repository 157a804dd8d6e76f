//! tvrelay: pairs TV receivers with remote controllers through a short
//! pairing code and relays control commands to the paired receiver.
//!
//! Receivers hold a WebSocket open at `/ws` and are told their code in a
//! `connected` event. Controllers call `GET /control?tvcode=..&ctls=..` and
//! the command arrives at the receiver as a `control` event.

pub mod code;
pub mod connection;
pub mod gateway;
pub mod http;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod server;

pub use code::{CodeSource, RandomCodes, ScriptedCodes};
pub use gateway::{ConnectionPhase, EventGateway, EventOutcome, OpenedConnection};
pub use protocol::{ClientEvent, ServerEvent};
pub use registry::{ConnectionHandle, SessionRegistry};
pub use relay::ControlRelay;
pub use server::RelayServer;
