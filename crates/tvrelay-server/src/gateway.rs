//! Connection lifecycle: registers receivers on connect, answers their
//! events, and removes them on disconnect.

use std::fmt;

use tokio::sync::mpsc;
use tvrelay_common::{ConnectionId, PairingCode, RelayError};

use crate::protocol::{ClientEvent, ServerEvent};
use crate::registry::{ConnectionHandle, SessionRegistry};

/// Where a receiver connection is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Connecting,
    Active,
    Closed,
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// A registered connection, ready for its socket loop.
pub struct OpenedConnection {
    pub id: ConnectionId,
    pub code: PairingCode,
    /// Events queued for this connection; the first one is `connected`.
    pub outbound: mpsc::Receiver<ServerEvent>,
}

/// What the socket loop should do after an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Send this event and keep the connection open.
    Reply(ServerEvent),
    /// Send this event, then close the connection.
    Close(ServerEvent),
}

#[derive(Clone)]
pub struct EventGateway {
    registry: SessionRegistry,
    outbound_buffer: usize,
}

impl EventGateway {
    pub fn new(registry: SessionRegistry, outbound_buffer: usize) -> Self {
        Self {
            registry,
            outbound_buffer: outbound_buffer.max(1),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Register a new connection and queue its `connected` notification.
    pub async fn open(&self) -> Result<OpenedConnection, RelayError> {
        let id = ConnectionId::new();
        let (tx, outbound) = mpsc::channel(self.outbound_buffer);
        let handle = ConnectionHandle::new(id.clone(), tx);

        let code = self.registry.register(handle.clone()).await?;

        if let Err(e) = handle.push(ServerEvent::Connected { code: code.clone() }) {
            tracing::warn!(connection = %id, error = %e, "Failed to queue connected event");
        }

        Ok(OpenedConnection { id, code, outbound })
    }

    /// React to one event from an active connection.
    pub async fn handle(&self, id: &ConnectionId, event: ClientEvent) -> EventOutcome {
        match event {
            ClientEvent::Notice { message } => {
                tracing::debug!(connection = %id, message = %message, "Notice");
                EventOutcome::Reply(ServerEvent::Reply {
                    message: format!("have {message}"),
                })
            }
            ClientEvent::Msg { message } => {
                let reply = format!("recv {message}");
                if !self.registry.record_last_value(id, message).await {
                    tracing::warn!(connection = %id, "Msg from connection without a session");
                }
                EventOutcome::Reply(ServerEvent::Ack { message: reply })
            }
            ClientEvent::Bye => {
                let last = self.registry.last_value(id).await.unwrap_or_default();
                tracing::debug!(connection = %id, "Client ended session");
                EventOutcome::Close(ServerEvent::Bye { last })
            }
        }
    }

    /// Drop the connection's session. Safe to call more than once.
    pub async fn close(&self, id: &ConnectionId) {
        self.registry.remove(id).await;
    }
}
