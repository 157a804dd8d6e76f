//! tvrelay: pairing-code relay between TV receivers and remote controllers.

mod cli;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use tvrelay_server::RelayServer;

const DEFAULT_LOG_FILTER: &str = "tvrelay_server=info,tvrelay_config=info";

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    let filter = match &args.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match tvrelay_config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load config");
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut config);
    if let Err(e) = tvrelay_config::validation::validate(&config) {
        tracing::error!(error = %e, "Invalid command-line overrides");
        return ExitCode::FAILURE;
    }

    let server = RelayServer::new(config);
    match server.serve(shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "tvrelay failed");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested"),
        Err(e) => {
            tracing::warn!(error = %e, "Could not listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
