use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use clicktrail_common::ServerConfig;
use clicktrail_server::{build_router, serve, AppState};
use clicktrail_store::EventLog;

#[derive(Parser)]
#[command(name = "clicktrail-server", about = "Telemetry ingestion server")]
struct Cli {
    /// Log file path, overrides CLICKTRAIL_LOG_PATH
    #[arg(long)]
    log_path: Option<PathBuf>,

    /// Listen port, overrides PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(path) = cli.log_path {
        config.log_path = path;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let log = EventLog::open(&config.log_path)
        .with_context(|| format!("Cannot prepare event log at {}", config.log_path.display()))?;
    let app = build_router(
        AppState::new(log, config.trust_forwarded_for),
        &config.allowed_origins,
    );

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server running on http://{addr}");

    serve(listener, app).await?;

    Ok(())
}
