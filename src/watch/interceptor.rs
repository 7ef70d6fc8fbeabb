//! Request watching interceptor.
//!
//! # Responsibilities
//! - Time each request with the scope's stopwatch
//! - Emit the banner, context, header, parameter and body sections at begin
//! - Emit the elapsed summary (and breakdown) at end, then release the timer
//!
//! # Design Decisions
//! - Audit output is a side channel: sink errors and panics are swallowed
//!   after a single low-severity report
//! - Detail lines are dropped in simply mode, headline lines never are
//! - Timer state lives in the caller-owned `RequestScope`

use std::error::Error;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use crate::audit::{truncate, AuditDescription, AuditLogger};
use crate::config::{StopWatchMode, WatchConfig};
use crate::observability::metrics;
use crate::watch::context::{RequestContext, RequestScope};
use crate::watch::request::RequestFacts;

pub const CONTEXT_SECTION: &str = "requestContext";
pub const HEAD_SECTION: &str = "requestHead";
pub const PARAM_SECTION: &str = "requestParam";
pub const BODY_SECTION: &str = "requestBody";

/// Opening marker of a log section.
pub fn section_start(name: &str) -> String {
    format!("**********{}-start*************", name)
}

/// Closing marker of a log section.
pub fn section_end(name: &str) -> String {
    format!("**********{}-end*************", name)
}

/// Headline line emitted first for every request.
pub fn banner_line(request: &RequestFacts) -> String {
    format!("*** API-URL:[{}] {} ***", request.method, request.uri)
}

/// Line emitted at request end.
pub fn summary_line(request: &RequestFacts, elapsed: Duration) -> String {
    format!(
        "[{}] {} elapsed: {}ms",
        request.method,
        request.uri,
        elapsed.as_millis()
    )
}

/// Per-line values shared by every line of one entry point call.
struct LineScope<'a> {
    request_id: Option<&'a str>,
    operate: &'static str,
    user: Option<String>,
}

/// Wraps request handling with audit and timing output.
#[derive(Clone)]
pub struct RequestWatchInterceptor {
    config: Arc<WatchConfig>,
    logger: Arc<dyn AuditLogger>,
}

impl RequestWatchInterceptor {
    pub fn new(config: WatchConfig, logger: Arc<dyn AuditLogger>) -> Self {
        Self {
            config: Arc::new(config),
            logger,
        }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Called when a request arrives, before the handler runs.
    pub fn on_request_begin(&self, request: &RequestFacts, scope: &mut RequestScope) {
        let timing = self.config.stop_watch_mode.is_enabled();
        if timing {
            if let Err(e) = scope.timer_mut().start(request.task_name()) {
                tracing::debug!(error = %e, uri = %request.uri, "Request timer not started");
            }
        }

        let line_scope = self.line_scope(request, scope, "begin");

        self.emit(&line_scope, banner_line(request), false, None);

        if self.config.use_request_context {
            if let Some(context) = scope.context() {
                self.emit_section(&line_scope, CONTEXT_SECTION, context_lines(context), true, None);
            }
        }

        self.emit_section(
            &line_scope,
            HEAD_SECTION,
            pairs(&request.headers),
            true,
            None,
        );
        self.emit_section(
            &line_scope,
            PARAM_SECTION,
            pairs(&request.params),
            false,
            None,
        );

        if self.config.body_logger {
            if let Some(body) = request.body_text() {
                self.emit_section(
                    &line_scope,
                    BODY_SECTION,
                    vec![body],
                    true,
                    Some(self.config.body_log_length),
                );
            }
        }

        if timing {
            if let Some(timer) = scope.existing_timer_mut() {
                if let Err(e) = timer.stop() {
                    tracing::debug!(error = %e, uri = %request.uri, "Request timer not stopped");
                }
            }
        }
    }

    /// Open a named task on the request's timer, typically around the
    /// handler. `on_request_end` closes it. No-op when timing is off.
    pub fn start_task(&self, scope: &mut RequestScope, name: &str) {
        if !self.config.stop_watch_mode.is_enabled() {
            return;
        }
        if let Err(e) = scope.timer_mut().start(name) {
            tracing::debug!(error = %e, task = name, "Request timer task not started");
        }
    }

    /// Called when request handling finished, successfully or not.
    pub fn on_request_end(
        &self,
        request: &RequestFacts,
        scope: &mut RequestScope,
        error: Option<&(dyn Error + 'static)>,
    ) {
        // Detach first so the slot is empty whatever happens below.
        let timer = scope.release_timer();

        if let Some(e) = error {
            tracing::debug!(error = %e, uri = %request.uri, "Request finished with error");
        }

        if !self.config.stop_watch_mode.is_enabled() {
            return;
        }

        let mut elapsed = Duration::ZERO;
        let mut breakdown = None;
        if let Some(mut timer) = timer {
            if timer.is_running() {
                if let Err(e) = timer.stop() {
                    tracing::debug!(error = %e, uri = %request.uri, "Request timer not stopped");
                }
            }
            elapsed = timer.total_elapsed();
            if self.config.stop_watch_mode == StopWatchMode::Detail {
                breakdown = Some(timer.pretty_print());
            }
        }

        let line_scope = self.line_scope(request, scope, "end");
        self.emit(&line_scope, summary_line(request, elapsed), false, None);
        if let Some(table) = breakdown {
            self.emit(&line_scope, table, false, None);
        }
    }

    fn line_scope<'a>(
        &self,
        request: &RequestFacts,
        scope: &'a RequestScope,
        operate: &'static str,
    ) -> LineScope<'a> {
        let user = self
            .config
            .user_header
            .as_deref()
            .and_then(|name| request.header(name))
            .map(str::to_string);

        LineScope {
            request_id: scope.request_id(),
            operate,
            user,
        }
    }

    fn emit_section(
        &self,
        line_scope: &LineScope<'_>,
        section: &str,
        lines: Vec<String>,
        detail: bool,
        limit: Option<usize>,
    ) {
        if detail && self.config.simply_mode {
            return;
        }
        self.emit(line_scope, section_start(section), detail, None);
        for line in lines {
            self.emit(line_scope, line, detail, limit);
        }
        self.emit(line_scope, section_end(section), detail, None);
    }

    /// Render one line and hand it to the sink. Never fails.
    fn emit(&self, line_scope: &LineScope<'_>, text: String, detail: bool, limit: Option<usize>) {
        if detail && self.config.simply_mode {
            return;
        }

        let text = match limit {
            Some(max) => truncate::apply(&text, max, self.config.body_log_mode),
            None => text,
        };

        let line = match line_scope.request_id {
            Some(id) if self.config.use_request_context => with_request_prefix(id, &text),
            _ => text,
        };

        let description = AuditDescription::new(self.config.line_template.as_str())
            .with_system(self.config.system.as_str())
            .with_module(self.config.module.as_str())
            .with_operate(line_scope.operate)
            .with_user(line_scope.user.clone())
            .with_data(line);

        let level = self.config.logger_level;
        let outcome = catch_unwind(AssertUnwindSafe(|| self.logger.log(level, &description)));

        match outcome {
            Ok(Ok(())) => metrics::record_audit_line(level.as_str()),
            Ok(Err(e)) => {
                metrics::record_sink_failure();
                tracing::debug!(error = %e, "Audit line dropped");
            }
            Err(_) => {
                metrics::record_sink_failure();
                tracing::debug!("Audit sink panicked, line dropped");
            }
        }
    }
}

/// Prefix every row of `text` with `[id] `.
fn with_request_prefix(id: &str, text: &str) -> String {
    if !text.contains('\n') {
        return format!("[{}] {}", id, text);
    }
    text.lines()
        .map(|row| format!("[{}] {}", id, row))
        .collect::<Vec<_>>()
        .join("\n")
}

fn pairs(items: &[(String, String)]) -> Vec<String> {
    items
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect()
}

fn context_lines(context: &RequestContext) -> Vec<String> {
    let unknown = || "unknown".to_string();
    vec![
        format!("requestId={}", context.request_id),
        format!("hostId={}", context.host_id),
        format!("hostIp={}", context.host_ip.clone().unwrap_or_else(unknown)),
        format!("remoteIp={}", context.remote_ip.clone().unwrap_or_else(unknown)),
        format!("receiveDate={}", context.formatted_receive_time()),
    ]
}
