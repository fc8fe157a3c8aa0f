//! Data Room server
//!
//! Loads `.env` and environment configuration, then serves the HTTP API.

use std::sync::Arc;

use clap::Parser;
use dataroom_api::{ApiServer, ApiState};
use dataroom_core::{AppConfig, LogFormat};

mod logging;

#[derive(Debug, Parser)]
#[command(name = "dataroom", version, about = "Conversational data analysis server")]
struct Args {
    /// Bind address (overrides BACKEND_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides BACKEND_PORT)
    #[arg(long, short)]
    port: Option<u16>,

    /// Emit JSON logs (overrides LOG_FORMAT)
    #[arg(long)]
    json_logs: bool,

    /// More verbose logging
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_loaded = dotenvy::dotenv();

    let mut config = AppConfig::from_env()?;
    if let Some(host) = args.host {
        config.backend_host = host;
    }
    if let Some(port) = args.port {
        config.backend_port = port;
    }
    if args.json_logs {
        config.log_format = LogFormat::Json;
    }

    logging::init_tracing(config.log_format, args.verbose)?;

    if let Err(e) = env_loaded {
        if !matches!(e, dotenvy::Error::Io(_)) {
            tracing::warn!("Failed to load .env file: {}", e);
        }
    }

    if let Err(e) = config.validate() {
        tracing::warn!("{}", e);
    }

    let state = Arc::new(ApiState::from_config(&config)?);
    ApiServer::new(config, state).start().await
}
