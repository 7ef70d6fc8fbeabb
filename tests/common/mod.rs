//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use tower::ServiceExt;

use request_watch::audit::MemoryAuditLogger;
use request_watch::config::{AppConfig, WatchConfig};
use request_watch::http::HttpServer;

/// A server wired to an in-memory audit sink.
pub struct TestApp {
    pub server: HttpServer,
    pub logger: Arc<MemoryAuditLogger>,
}

impl TestApp {
    pub fn new(watch: WatchConfig) -> Self {
        let config = AppConfig {
            watch,
            ..AppConfig::default()
        };
        let logger = Arc::new(MemoryAuditLogger::new());
        let server = HttpServer::new(config, logger.clone());
        Self { server, logger }
    }

    pub fn router(&self) -> Router {
        self.server.router()
    }

    /// Drive one request through a fresh router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }

    pub fn texts(&self) -> Vec<String> {
        self.logger.texts()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "text/plain")
        .header("content-length", body.len().to_string())
        .body(Body::from(body))
        .unwrap()
}

/// Lines between the start and end markers of a section.
pub fn section(texts: &[String], name: &str) -> Vec<String> {
    let start_marker = format!("**********{}-start*************", name);
    let end_marker = format!("**********{}-end*************", name);
    let start = texts.iter().position(|t| t.ends_with(&start_marker));
    let end = texts.iter().position(|t| t.ends_with(&end_marker));
    match (start, end) {
        (Some(s), Some(e)) => texts[s + 1..e].to_vec(),
        _ => Vec::new(),
    }
}
