//! Request Watch demo service.
//!
//! Serves a small HTTP API with every request wrapped by the request
//! watch layer.
//!
//! ```text
//!     Client Request
//!         │
//!         ▼
//!     TraceLayer ─▶ RequestIdLayer ─▶ RequestWatchLayer ─▶ TimeoutLayer ─▶ handler
//!                                            │
//!                                            ▼
//!                                  RequestWatchInterceptor
//!                                    begin / end lines
//!                                            │
//!                                            ▼
//!                                    TracingAuditLogger
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use request_watch::audit::TracingAuditLogger;
use request_watch::config::{load_config, AppConfig};
use request_watch::http::HttpServer;
use request_watch::lifecycle::Shutdown;
use request_watch::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "request-watch")]
#[command(about = "HTTP service with request audit and timing", long_about = None)]
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

    logging::init_logging(&config.observability)?;

    tracing::info!("request-watch v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        logger_level = config.watch.logger_level.as_str(),
        stop_watch_mode = ?config.watch.stop_watch_mode,
        body_logger = config.watch.body_logger,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config, Arc::new(TracingAuditLogger::new()));
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
