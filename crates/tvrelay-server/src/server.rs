//! `RelayServer`: wires the registry, gateway and relay behind one Axum
//! listener.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tvrelay_common::TvRelayError;
use tvrelay_config::TvRelayConfig;

use crate::code::{CodeSource, RandomCodes};
use crate::gateway::EventGateway;
use crate::http::{self, AppState, StatusMode};
use crate::registry::SessionRegistry;
use crate::relay::ControlRelay;

pub struct RelayServer {
    config: TvRelayConfig,
    registry: SessionRegistry,
}

impl RelayServer {
    /// Create a server drawing random pairing codes.
    pub fn new(config: TvRelayConfig) -> Self {
        Self::with_code_source(config, Arc::new(RandomCodes::new()))
    }

    pub fn with_code_source(config: TvRelayConfig, codes: Arc<dyn CodeSource>) -> Self {
        let registry = SessionRegistry::new(codes, config.pairing.max_code_attempts);
        Self { config, registry }
    }

    pub fn config(&self) -> &TvRelayConfig {
        &self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            gateway: EventGateway::new(
                self.registry.clone(),
                self.config.connection.outbound_buffer,
            ),
            relay: ControlRelay::new(self.registry.clone()),
            status_mode: StatusMode::from_legacy_flag(self.config.http.legacy_status_codes),
        };

        http::router(state).layer(TraceLayer::new_for_http())
    }

    async fn bind(&self) -> Result<TcpListener, TvRelayError> {
        let addr = self.config.server.bind_addr();
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "tvrelay listening");
        Ok(listener)
    }

    /// Bind and serve in the background. Returns the bound address.
    pub async fn listen(&self) -> Result<(SocketAddr, JoinHandle<()>), TvRelayError> {
        let listener = self.bind().await?;
        let addr = listener.local_addr()?;
        let router = self.router();

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "Server stopped");
            }
        });

        Ok((addr, handle))
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn serve<F>(&self, shutdown: F) -> Result<(), TvRelayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!(sessions = self.registry.count().await, "tvrelay stopped");
        Ok(())
    }
}
