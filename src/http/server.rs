//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the demo handlers
//! - Wire up middleware (tracing, request ID, request watching, timeout)
//! - Bind server to listener
//! - Serve until the shutdown signal fires

use axum::{
    body::Bytes,
    extract::Query,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::audit::AuditLogger;
use crate::config::AppConfig;
use crate::http::middleware::RequestWatchLayer;
use crate::http::request::RequestIdLayer;
use crate::watch::RequestWatchInterceptor;

/// Upper bound for `/api/slow`.
const MAX_SLOW_MS: u64 = 5_000;

/// HTTP server exposing the demo API behind the request watch layer.
pub struct HttpServer {
    config: AppConfig,
    interceptor: RequestWatchInterceptor,
}

impl HttpServer {
    /// Create a new HTTP server that sends its audit trail to `logger`.
    pub fn new(config: AppConfig, logger: Arc<dyn AuditLogger>) -> Self {
        let interceptor = RequestWatchInterceptor::new(config.watch.clone(), logger);
        Self {
            config,
            interceptor,
        }
    }

    /// Router without a known local address (host IP reported as unknown).
    pub fn router(&self) -> Router {
        self.build_router(None)
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(&self, local_addr: Option<SocketAddr>) -> Router {
        let mut watch = RequestWatchLayer::new(self.interceptor.clone());
        if let Some(addr) = local_addr {
            watch = watch.with_local_addr(addr);
        }

        Router::new()
            .route("/api/ping", get(ping))
            .route("/api/echo", post(echo))
            .route("/api/slow", get(slow))
            .fallback(not_found)
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.timeouts.request_secs,
            )))
            .layer(watch)
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self
            .build_router(Some(addr))
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

async fn ping() -> &'static str {
    "pong"
}

async fn echo(body: Bytes) -> Bytes {
    body
}

#[derive(Debug, Deserialize)]
struct SlowParams {
    ms: Option<u64>,
}

async fn slow(Query(params): Query<SlowParams>) -> String {
    let ms = params.ms.unwrap_or(100).min(MAX_SLOW_MS);
    tokio::time::sleep(Duration::from_millis(ms)).await;
    format!("slept {}ms", ms)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}
