//! Request watching middleware.
//!
//! Adapts axum requests to the interceptor: builds the request facts and
//! the execution context, then runs begin → inner service → end with the
//! request's scope owned by the response future.

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Request},
    http::{header, request::Parts, HeaderMap, Response},
};
use chrono::Local;
use futures_util::future::BoxFuture;
use futures_util::stream::{self, StreamExt};
use std::error::Error;
use std::net::SocketAddr;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};

use crate::config::WatchConfig;
use crate::http::request::{RequestId, X_REQUEST_ID};
use crate::observability::metrics;
use crate::watch::{
    parse_form, RequestContext, RequestFacts, RequestScope, RequestWatchInterceptor,
};

/// Timer task covering the inner service call.
pub const HANDLER_TASK: &str = "handler";

/// Layer that wraps every request with the interceptor.
#[derive(Clone)]
pub struct RequestWatchLayer {
    interceptor: RequestWatchInterceptor,
    local_addr: Option<SocketAddr>,
}

impl RequestWatchLayer {
    pub fn new(interceptor: RequestWatchInterceptor) -> Self {
        Self {
            interceptor,
            local_addr: None,
        }
    }

    /// Address reported as the host IP in the context block.
    pub fn with_local_addr(mut self, addr: SocketAddr) -> Self {
        self.local_addr = Some(addr);
        self
    }
}

impl<S> Layer<S> for RequestWatchLayer {
    type Service = RequestWatchService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestWatchService {
            inner,
            interceptor: self.interceptor.clone(),
            local_addr: self.local_addr,
        }
    }
}

#[derive(Clone)]
pub struct RequestWatchService<S> {
    inner: S,
    interceptor: RequestWatchInterceptor,
    local_addr: Option<SocketAddr>,
}

impl<S> Service<Request> for RequestWatchService<S>
where
    S: Service<Request, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Error + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let interceptor = self.interceptor.clone();
        let local_addr = self.local_addr;
        // Use the service that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let config = interceptor.config();
            let path = req.uri().path();
            if config.exclude_paths.iter().any(|p| path.starts_with(p.as_str())) {
                return inner.call(req).await;
            }

            let start = Instant::now();
            let receive_time = Local::now();
            let (parts, body) = req.into_parts();
            let mut facts = RequestFacts::from_parts(&parts.method, &parts.uri, &parts.headers);

            let body = if should_capture(&parts.headers, config) {
                match capture_body(body, config.max_capture_bytes).await {
                    Captured::Complete(bytes) => {
                        if is_form(&parts.headers) {
                            facts
                                .params
                                .extend(parse_form(&String::from_utf8_lossy(&bytes)));
                        }
                        facts.body = Some(bytes.clone());
                        Body::from(bytes)
                    }
                    Captured::Partial(body) => {
                        tracing::debug!(uri = %facts.uri, "Request body not captured");
                        body
                    }
                }
            } else {
                body
            };

            let context = request_context(&parts, config, local_addr)
                .with_receive_time(receive_time);
            let mut scope = RequestScope::with_context(context);

            interceptor.on_request_begin(&facts, &mut scope);
            interceptor.start_task(&mut scope, HANDLER_TASK);

            let result = inner.call(Request::from_parts(parts, body)).await;

            let error = result.as_ref().err().map(|e| e as &(dyn Error + 'static));
            interceptor.on_request_end(&facts, &mut scope, error);

            if let Ok(response) = &result {
                metrics::record_request(&facts.method, response.status().as_u16(), start);
            }
            result
        })
    }
}

/// Outcome of reading a request body for the audit trail.
enum Captured {
    /// The whole body, within the limit.
    Complete(Bytes),
    /// Capture gave up. The body replays what was read, then the rest of the
    /// stream or the read error, so the handler sees the same input.
    Partial(Body),
}

async fn capture_body(body: Body, limit: usize) -> Captured {
    let mut data = body.into_data_stream();
    let mut chunks: Vec<Bytes> = Vec::new();
    let mut size = 0usize;

    while let Some(frame) = data.next().await {
        match frame {
            Ok(chunk) => {
                size += chunk.len();
                chunks.push(chunk);
                if size > limit {
                    let replay = stream::iter(chunks.into_iter().map(Ok)).chain(data);
                    return Captured::Partial(Body::from_stream(replay));
                }
            }
            Err(e) => {
                let replay = stream::iter(chunks.into_iter().map(Ok))
                    .chain(stream::once(async move { Err::<Bytes, axum::Error>(e) }));
                return Captured::Partial(Body::from_stream(replay));
            }
        }
    }

    Captured::Complete(Bytes::from(chunks.concat()))
}

/// Buffer the body only when something will use it and its declared size
/// is within the capture limit.
fn should_capture(headers: &HeaderMap, config: &WatchConfig) -> bool {
    if !config.body_logger && !is_form(headers) {
        return false;
    }
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<usize>().ok())
        .map(|len| len > 0 && len <= config.max_capture_bytes)
        .unwrap_or(false)
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn request_context(
    parts: &Parts,
    config: &WatchConfig,
    local_addr: Option<SocketAddr>,
) -> RequestContext {
    let request_id = parts
        .extensions
        .get::<RequestId>()
        .map(|id| id.as_str().to_string())
        .or_else(|| {
            parts
                .headers
                .get(&X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_else(|| RequestId::new().0);

    RequestContext::new(request_id, config.host_id.clone())
        .with_host_ip(local_addr.map(|addr| addr.ip().to_string()))
        .with_remote_ip(remote_ip(parts))
}

/// Client address: first `x-forwarded-for` hop, then `x-real-ip`, then the
/// socket peer.
fn remote_ip(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("x-forwarded-for")
        .or_else(|| parts.headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::io;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for &(k, v) in pairs {
            map.insert(k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_capture_requires_body_logger_or_form() {
        let config = WatchConfig::default();
        let json = headers(&[("content-length", "10"), ("content-type", "application/json")]);
        assert!(!should_capture(&json, &config));

        let form = headers(&[
            ("content-length", "10"),
            ("content-type", "application/x-www-form-urlencoded"),
        ]);
        assert!(should_capture(&form, &config));

        let config = WatchConfig {
            body_logger: true,
            ..WatchConfig::default()
        };
        assert!(should_capture(&json, &config));
    }

    #[test]
    fn test_capture_respects_declared_length() {
        let config = WatchConfig {
            body_logger: true,
            max_capture_bytes: 100,
            ..WatchConfig::default()
        };
        assert!(!should_capture(&headers(&[("content-length", "101")]), &config));
        assert!(!should_capture(&headers(&[("content-length", "0")]), &config));
        assert!(!should_capture(&headers(&[("transfer-encoding", "chunked")]), &config));
        assert!(should_capture(&headers(&[("content-length", "100")]), &config));
    }

    #[test]
    fn test_request_context_sources() {
        let (mut parts, _) = axum::http::Request::builder()
            .uri("/")
            .header("x-request-id", "rid-1")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        parts
            .extensions
            .insert(ConnectInfo("127.0.0.1:5000".parse::<SocketAddr>().unwrap()));

        let config = WatchConfig {
            host_id: "node-7".into(),
            ..WatchConfig::default()
        };
        let ctx = request_context(&parts, &config, Some("10.1.1.1:8080".parse().unwrap()));

        assert_eq!(ctx.request_id, "rid-1");
        assert_eq!(ctx.host_id, "node-7");
        assert_eq!(ctx.host_ip.as_deref(), Some("10.1.1.1"));
        assert_eq!(ctx.remote_ip.as_deref(), Some("203.0.113.9"));

        parts.headers.remove("x-forwarded-for");
        assert_eq!(remote_ip(&parts).as_deref(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_capture_complete_body() {
        let Captured::Complete(bytes) = capture_body(Body::from("name=ada"), 64).await else {
            panic!("body within the limit must be captured");
        };
        assert_eq!(bytes, "name=ada");
    }

    #[tokio::test]
    async fn test_capture_replays_read_error() {
        let chunks = vec![
            Ok::<_, io::Error>("hello"),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ];
        let body = Body::from_stream(stream::iter(chunks));

        let Captured::Partial(replayed) = capture_body(body, 1024).await else {
            panic!("failed body must not be captured");
        };
        let mut data = replayed.into_data_stream();
        assert_eq!(data.next().await.unwrap().unwrap(), "hello");
        assert!(data.next().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_capture_over_limit_replays_whole_body() {
        let chunks = vec![
            Ok::<_, io::Error>("abcd"),
            Ok("efgh"),
            Ok("ijkl"),
        ];
        let body = Body::from_stream(stream::iter(chunks));

        let Captured::Partial(replayed) = capture_body(body, 6).await else {
            panic!("body over the limit must not be captured");
        };
        let bytes = axum::body::to_bytes(replayed, usize::MAX).await.unwrap();
        assert_eq!(bytes, "abcdefghijkl");
    }
}
