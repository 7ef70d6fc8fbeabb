//! Request watching subsystem.
//!
//! # Data Flow
//! ```text
//! caller (HTTP layer, or any dispatcher)
//!     → builds RequestFacts + RequestScope (with RequestContext)
//!     → interceptor.on_request_begin(facts, scope)
//!     → handler runs
//!     → interceptor.on_request_end(facts, scope, error)
//!     → scope dropped (timer slot already empty)
//! ```
//!
//! # Design Decisions
//! - The scope is owned by the request, so concurrent requests never see
//!   each other's timers
//! - Both entry points are infallible

pub mod context;
pub mod interceptor;
pub mod request;

pub use context::{RequestContext, RequestScope};
pub use interceptor::{
    banner_line, section_end, section_start, summary_line, RequestWatchInterceptor,
    BODY_SECTION, CONTEXT_SECTION, HEAD_SECTION, PARAM_SECTION,
};
pub use request::{parse_form, RequestFacts};
