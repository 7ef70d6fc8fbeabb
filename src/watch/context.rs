//! Per-request execution context and scope.
//!
//! # Responsibilities
//! - Carry the request facts supplied by the context provider
//! - Own the request's timer slot for the lifetime of the request
//! - Release the timer when the scope is dropped, even if the request is
//!   cancelled before `on_request_end` runs

use chrono::{DateTime, Local};

use crate::timing::StopWatch;

/// Name given to timers of requests that carry no context.
const ANONYMOUS_TIMER: &str = "anonymous";

/// Execution context of one in-flight request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub host_id: String,
    pub host_ip: Option<String>,
    pub remote_ip: Option<String>,
    pub receive_time: DateTime<Local>,
}

impl RequestContext {
    /// Context received now with no addresses.
    pub fn new(request_id: impl Into<String>, host_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            host_id: host_id.into(),
            host_ip: None,
            remote_ip: None,
            receive_time: Local::now(),
        }
    }

    pub fn with_host_ip(mut self, host_ip: Option<String>) -> Self {
        self.host_ip = host_ip;
        self
    }

    pub fn with_remote_ip(mut self, remote_ip: Option<String>) -> Self {
        self.remote_ip = remote_ip;
        self
    }

    pub fn with_receive_time(mut self, receive_time: DateTime<Local>) -> Self {
        self.receive_time = receive_time;
        self
    }

    /// Receive time as `YYYY-MM-DD HH:MM:SS.mmm`.
    pub fn formatted_receive_time(&self) -> String {
        self.receive_time.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    }
}

/// Storage owned by one request for its whole begin/end cycle.
///
/// The scope is created by the caller before `on_request_begin` and passed
/// to both interceptor entry points. It is never shared between requests.
#[derive(Debug, Default)]
pub struct RequestScope {
    context: Option<RequestContext>,
    timer: Option<StopWatch>,
}

impl RequestScope {
    pub fn new(context: Option<RequestContext>) -> Self {
        Self {
            context,
            timer: None,
        }
    }

    pub fn with_context(context: RequestContext) -> Self {
        Self::new(Some(context))
    }

    pub fn context(&self) -> Option<&RequestContext> {
        self.context.as_ref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.context.as_ref().map(|c| c.request_id.as_str())
    }

    /// The request's timer, created on first use and named after the
    /// request id.
    pub fn timer_mut(&mut self) -> &mut StopWatch {
        let name = self.request_id().unwrap_or(ANONYMOUS_TIMER).to_string();
        self.timer.get_or_insert_with(|| StopWatch::new(name))
    }

    /// The request's timer if one was created.
    pub fn existing_timer_mut(&mut self) -> Option<&mut StopWatch> {
        self.timer.as_mut()
    }

    pub fn timer(&self) -> Option<&StopWatch> {
        self.timer.as_ref()
    }

    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// Detach the timer from the scope.
    pub fn release_timer(&mut self) -> Option<StopWatch> {
        self.timer.take()
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            tracing::trace!(
                timer = %timer.id(),
                running = timer.is_running(),
                "Request scope dropped before completion, timer released"
            );
        }
    }
}
