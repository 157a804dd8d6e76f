//! Per-connection socket loop: register, forward queued events, answer
//! inbound events, then clean up.

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tvrelay_common::{ConnectionId, RelayError};

use crate::gateway::{ConnectionPhase, EventGateway, EventOutcome, OpenedConnection};
use crate::protocol::{ClientEvent, ServerEvent};

type WsSink = SplitSink<WebSocket, Message>;

/// Drive a single receiver WebSocket until it closes.
pub async fn drive(socket: WebSocket, gateway: EventGateway) {
    let (mut sink, mut stream) = socket.split();
    let mut phase = ConnectionPhase::Connecting;

    let OpenedConnection {
        id,
        code,
        mut outbound,
    } = match gateway.open().await {
        Ok(opened) => opened,
        Err(e) => {
            tracing::error!(error = %e, "Registration failed, closing connection");
            let _ = send_event(
                &mut sink,
                &ServerEvent::Error {
                    message: e.to_string(),
                },
            )
            .await;
            let _ = sink.send(Message::Close(None)).await;
            return;
        }
    };

    tracing::debug!(connection = %id, from = %phase, "Connection phase change");
    phase = ConnectionPhase::Active;
    tracing::info!(connection = %id, code = %code, "Receiver connected");

    while phase == ConnectionPhase::Active {
        tokio::select! {
            // Queued events (connected, relayed controls) → socket
            Some(event) = outbound.recv() => {
                if let Err(e) = send_event(&mut sink, &event).await {
                    tracing::debug!(connection = %id, error = %e, "Send failed");
                    phase = ConnectionPhase::Closed;
                }
            }

            // Socket → gateway
            frame = stream.next() => {
                phase = on_frame(frame, &id, &gateway, &mut sink).await;
            }
        }
    }

    gateway.close(&id).await;
    tracing::info!(connection = %id, code = %code, phase = %phase, "Receiver disconnected");
}

/// Handle one inbound frame and report the phase the connection is in after it.
async fn on_frame(
    frame: Option<Result<Message, axum::Error>>,
    id: &ConnectionId,
    gateway: &EventGateway,
    sink: &mut WsSink,
) -> ConnectionPhase {
    match frame {
        Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
            Ok(event) => match gateway.handle(id, event).await {
                EventOutcome::Reply(reply) => match send_event(sink, &reply).await {
                    Ok(()) => ConnectionPhase::Active,
                    Err(_) => ConnectionPhase::Closed,
                },
                EventOutcome::Close(farewell) => {
                    let _ = send_event(sink, &farewell).await;
                    let _ = sink.send(Message::Close(None)).await;
                    ConnectionPhase::Closed
                }
            },
            Err(e) => {
                tracing::warn!(connection = %id, error = %e, "Invalid client event");
                let reply = ServerEvent::Error {
                    message: format!("invalid event: {e}"),
                };
                match send_event(sink, &reply).await {
                    Ok(()) => ConnectionPhase::Active,
                    Err(_) => ConnectionPhase::Closed,
                }
            }
        },
        Some(Ok(Message::Ping(data))) => {
            let _ = sink.send(Message::Pong(data)).await;
            ConnectionPhase::Active
        }
        Some(Ok(Message::Close(_))) | None => ConnectionPhase::Closed,
        Some(Err(e)) => {
            tracing::debug!(connection = %id, error = %e, "WS error");
            ConnectionPhase::Closed
        }
        Some(Ok(_)) => ConnectionPhase::Active,
    }
}

/// Send a ServerEvent as a JSON text frame.
async fn send_event(sink: &mut WsSink, event: &ServerEvent) -> Result<(), RelayError> {
    let json = serde_json::to_string(event).map_err(|e| RelayError::Transport(e.to_string()))?;
    sink.send(Message::Text(json.into()))
        .await
        .map_err(|e| RelayError::Transport(e.to_string()))
}
