//! Audit log sinks.
//!
//! The interceptor never logs directly; it hands every rendered line to an
//! [`AuditLogger`] injected at construction time.

use std::sync::Mutex;
use thiserror::Error;

use crate::audit::description::AuditDescription;
use crate::config::LoggerLevel;

/// `tracing` target used by [`TracingAuditLogger`].
pub const AUDIT_TARGET: &str = "request_watch::audit";

/// Errors a sink may report.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The sink could not accept the entry.
    #[error("audit sink error: {0}")]
    Sink(String),
}

/// Severity-leveled destination for audit lines.
pub trait AuditLogger: Send + Sync {
    /// Accept one audit entry at the given level.
    fn log(&self, level: LoggerLevel, description: &AuditDescription) -> Result<(), AuditError>;
}

/// Default sink: writes each rendered line as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLogger;

impl TracingAuditLogger {
    pub fn new() -> Self {
        Self
    }
}

impl AuditLogger for TracingAuditLogger {
    fn log(&self, level: LoggerLevel, description: &AuditDescription) -> Result<(), AuditError> {
        let line = description.render();
        let system = description.system.as_deref().unwrap_or_default();
        let module = description.module.as_deref().unwrap_or_default();
        let operate = description.operate.as_deref().unwrap_or_default();
        let user = description.user.as_deref().unwrap_or_default();

        match level {
            LoggerLevel::Trace => tracing::trace!(
                target: AUDIT_TARGET,
                system, module, operate, user,
                "{}", line
            ),
            LoggerLevel::Debug => tracing::debug!(
                target: AUDIT_TARGET,
                system, module, operate, user,
                "{}", line
            ),
            LoggerLevel::Info => tracing::info!(
                target: AUDIT_TARGET,
                system, module, operate, user,
                "{}", line
            ),
        }
        Ok(())
    }
}

/// A captured audit line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLine {
    pub level: LoggerLevel,
    pub text: String,
}

/// In-memory sink that keeps every rendered line. Used by tests and by
/// callers that want to inspect the audit trail programmatically.
#[derive(Debug, Default)]
pub struct MemoryAuditLogger {
    lines: Mutex<Vec<CapturedLine>>,
}

impl MemoryAuditLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line accepted so far.
    pub fn lines(&self) -> Vec<CapturedLine> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Rendered text of every line accepted so far.
    pub fn texts(&self) -> Vec<String> {
        self.lines().into_iter().map(|line| line.text).collect()
    }

    /// Drop all captured lines.
    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }
}

impl AuditLogger for MemoryAuditLogger {
    fn log(&self, level: LoggerLevel, description: &AuditDescription) -> Result<(), AuditError> {
        let mut lines = self
            .lines
            .lock()
            .map_err(|e| AuditError::Sink(format!("memory sink lock poisoned: {}", e)))?;
        lines.push(CapturedLine {
            level,
            text: description.render(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_logger_captures_rendered_lines() {
        let logger = MemoryAuditLogger::new();
        let desc = AuditDescription::new("<%operate%>: <%data%>")
            .with_operate("begin")
            .with_data("GET /");

        logger.log(LoggerLevel::Info, &desc).unwrap();

        assert_eq!(
            logger.lines(),
            vec![CapturedLine {
                level: LoggerLevel::Info,
                text: "begin: GET /".to_string(),
            }]
        );

        logger.clear();
        assert!(logger.texts().is_empty());
    }

    #[test]
    fn test_tracing_logger_accepts_every_level() {
        let logger = TracingAuditLogger::new();
        let desc = AuditDescription::new("<%data%>").with_data("line");
        for level in [LoggerLevel::Trace, LoggerLevel::Debug, LoggerLevel::Info] {
            assert!(logger.log(level, &desc).is_ok());
        }
    }

    #[test]
    fn test_error_display() {
        let err = AuditError::Sink("disk full".into());
        assert_eq!(err.to_string(), "audit sink error: disk full");
    }
}
