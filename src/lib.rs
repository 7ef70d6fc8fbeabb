//! Request audit and timing instrumentation.
//!
//! Wraps every inbound request with a template-driven audit trail, a
//! payload truncation policy and a request-scoped stopwatch.

pub mod audit;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod timing;
pub mod watch;

pub use audit::{AuditDescription, AuditLogger, MemoryAuditLogger, TracingAuditLogger};
pub use config::AppConfig;
pub use http::{HttpServer, RequestWatchLayer};
pub use lifecycle::Shutdown;
pub use watch::{RequestContext, RequestFacts, RequestScope, RequestWatchInterceptor};
