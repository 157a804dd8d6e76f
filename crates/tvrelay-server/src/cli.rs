use std::path::PathBuf;

use clap::Parser;
use tvrelay_config::TvRelayConfig;

/// tvrelay — pairs TV receivers with remote controllers by a short code.
#[derive(Parser, Debug)]
#[command(name = "tvrelay", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Interface to bind.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log filter override (e.g. debug, tvrelay_server=trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Answer every relay request with status 200.
    #[arg(long)]
    pub legacy_status_codes: bool,
}

impl Args {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply(&self, config: &mut TvRelayConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.legacy_status_codes {
            config.http.legacy_status_codes = true;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
