//! HTTP boundary: `/control`, `/exists`, and the `/ws` upgrade.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tvrelay_common::RelayError;

use crate::connection;
use crate::gateway::EventGateway;
use crate::relay::ControlRelay;

/// How relay errors map to HTTP status codes. Bodies are the same either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMode {
    /// 400 for missing parameters, 404 for unknown codes.
    Standard,
    /// Always 200, for remote clients that only read the body.
    Legacy,
}

impl StatusMode {
    pub fn from_legacy_flag(legacy: bool) -> Self {
        if legacy {
            Self::Legacy
        } else {
            Self::Standard
        }
    }

    pub fn status_for(self, err: &RelayError) -> StatusCode {
        match self {
            Self::Legacy => StatusCode::OK,
            Self::Standard => match err {
                RelayError::MissingParameter(_) => StatusCode::BAD_REQUEST,
                RelayError::CodeNotFound => StatusCode::NOT_FOUND,
                RelayError::CapacityExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
                RelayError::Transport(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: EventGateway,
    pub relay: ControlRelay,
    pub status_mode: StatusMode,
}

/// Raw query pairs in request order. A repeated key keeps every value.
type QueryPairs = Vec<(String, String)>;

/// First value given for `key`, if any.
fn first_param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Build the Axum router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/control", get(control_handler))
        .route("/exists", get(exists_handler))
        .with_state(state)
}

/// GET /ws — receiver WebSocket upgrade.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| connection::drive(socket, state.gateway))
}

/// GET /control?tvcode=<code>&ctls=<command>
async fn control_handler(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Response {
    let result = state
        .relay
        .forward_control(first_param(&pairs, "tvcode"), first_param(&pairs, "ctls"))
        .await;
    respond(result.map(|()| "ok"), state.status_mode)
}

/// GET /exists?tvcode=<code>
async fn exists_handler(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Response {
    let result = state.relay.check_exists(first_param(&pairs, "tvcode")).await;
    respond(result.map(|()| "FIND"), state.status_mode)
}

fn respond(result: Result<&'static str, RelayError>, mode: StatusMode) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => {
            if let RelayError::MissingParameter(_) = e {
                tracing::warn!(error = %e, "Rejected relay request");
            }
            (mode.status_for(&e), e.to_string()).into_response()
        }
    }
}
