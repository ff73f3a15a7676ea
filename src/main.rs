//! HTTP request logging service.
//!
//! Serves a small axum application behind the request logger, which writes
//! one structured record per request/response cycle.
//!
//! # Architecture Overview
//!
//! ```text
//! Client ──▶ catch-panic ──▶ request logger ──▶ timeout ──▶ handlers
//!                               │      ▲
//!                  tee request  │      │  tee response
//!                               ▼      │
//! Client ◀──────────────────── response body ──(end-of-stream)──▶ LogSink
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use request_logger::config::{load_config, AppConfig};
use request_logger::http::HttpServer;
use request_logger::lifecycle::Shutdown;
use request_logger::observability::logging;

#[derive(Parser)]
#[command(name = "request-logger")]
#[command(about = "HTTP service that logs every request/response cycle", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init(&config.logging)?;

    tracing::info!(
        title = %config.app.title,
        bind_address = %config.listener.bind_address,
        log_format = ?config.logging.format,
        max_body_bytes = config.capture.max_body_bytes,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
