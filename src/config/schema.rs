//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.
//!
//! Enumerated watch options are parsed leniently: an unknown value falls back
//! to the option's default instead of failing the whole file.

use serde::{Deserialize, Deserializer, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request audit/timing settings.
    pub watch: WatchConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Output format of the process log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Pretty (development) or JSON (production) log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Raw value of a mode field. Text is parsed by name; any other value type
/// falls back to the mode's default.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientText {
    Text(String),
    Other(serde::de::IgnoredAny),
}

impl LenientText {
    fn as_str(&self) -> &str {
        match self {
            LenientText::Text(text) => text,
            LenientText::Other(_) => "",
        }
    }
}

/// Severity every audit line is emitted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoggerLevel {
    Trace,
    #[default]
    Debug,
    Info,
}

impl LoggerLevel {
    /// Parse a level name, falling back to `DEBUG` for anything unknown.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "TRACE" => LoggerLevel::Trace,
            "DEBUG" => LoggerLevel::Debug,
            "INFO" => LoggerLevel::Info,
            _ => LoggerLevel::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoggerLevel::Trace => "TRACE",
            LoggerLevel::Debug => "DEBUG",
            LoggerLevel::Info => "INFO",
        }
    }
}

impl<'de> Deserialize<'de> for LoggerLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = LenientText::deserialize(deserializer)?;
        Ok(Self::parse_or_default(raw.as_str()))
    }
}

/// What happens to a captured payload longer than the configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum BodyLogMode {
    /// Log the payload unchanged.
    Full,
    /// Log the leading characters followed by a `...` marker.
    #[default]
    Truncated,
    /// Log only `<BLOB:n>`.
    Skip,
}

impl BodyLogMode {
    /// Parse a mode name, falling back to `TRUNCATED` for anything unknown.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "FULL" => BodyLogMode::Full,
            "TRUNCATED" => BodyLogMode::Truncated,
            "SKIP" => BodyLogMode::Skip,
            _ => BodyLogMode::default(),
        }
    }
}

impl<'de> Deserialize<'de> for BodyLogMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = LenientText::deserialize(deserializer)?;
        Ok(Self::parse_or_default(raw.as_str()))
    }
}

/// Request timing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum StopWatchMode {
    /// No timing at all.
    None,
    /// Summary line with total elapsed time.
    #[default]
    Simply,
    /// Summary line plus a per-task breakdown.
    Detail,
}

impl StopWatchMode {
    /// Parse a mode name, falling back to `SIMPLY` for anything unknown.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "NONE" => StopWatchMode::None,
            "SIMPLY" => StopWatchMode::Simply,
            "DETAIL" => StopWatchMode::Detail,
            _ => StopWatchMode::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        *self != StopWatchMode::None
    }
}

impl<'de> Deserialize<'de> for StopWatchMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = LenientText::deserialize(deserializer)?;
        Ok(Self::parse_or_default(raw.as_str()))
    }
}

/// Request audit/timing configuration.
///
/// Read-only once the interceptor is built; shared through an `Arc`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Prefix lines with `[requestId]` and emit the context block.
    pub use_request_context: bool,

    /// Severity used for every audit line.
    pub logger_level: LoggerLevel,

    /// Log the captured request body.
    pub body_logger: bool,

    /// Length (in characters) above which the body log mode applies.
    pub body_log_length: usize,

    /// Policy for oversized bodies.
    pub body_log_mode: BodyLogMode,

    /// Drop detail lines, keep banner and summary lines.
    pub simply_mode: bool,

    /// Request timing mode.
    pub stop_watch_mode: StopWatchMode,

    /// `<%system%>` placeholder value.
    pub system: String,

    /// `<%module%>` placeholder value.
    pub module: String,

    /// Template every audit line is rendered through. The line text is the
    /// `<%data%>` value.
    pub line_template: String,

    /// Header whose value becomes the `<%user%>` placeholder.
    pub user_header: Option<String>,

    /// Host id reported in the context block.
    pub host_id: String,

    /// Bodies with a larger `Content-Length` are never buffered.
    pub max_capture_bytes: usize,

    /// Path prefixes that bypass auditing entirely.
    pub exclude_paths: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            use_request_context: false,
            logger_level: LoggerLevel::Debug,
            body_logger: false,
            body_log_length: 1024,
            body_log_mode: BodyLogMode::Truncated,
            simply_mode: false,
            stop_watch_mode: StopWatchMode::Simply,
            system: "http".to_string(),
            module: "request-watch".to_string(),
            line_template: "<%data%>".to_string(),
            user_header: None,
            host_id: default_host_id(),
            max_capture_bytes: 1024 * 1024, // 1MB
            exclude_paths: Vec::new(),
        }
    }
}

fn default_host_id() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_enum_values_fall_back() {
        let config: WatchConfig = toml::from_str(
            r#"
            logger_level = "WARN"
            body_log_mode = "compress"
            stop_watch_mode = "verbose"
            "#,
        )
        .unwrap();

        assert_eq!(config.logger_level, LoggerLevel::Debug);
        assert_eq!(config.body_log_mode, BodyLogMode::Truncated);
        assert_eq!(config.stop_watch_mode, StopWatchMode::Simply);
    }

    #[test]
    fn test_non_text_enum_values_fall_back() {
        let config: WatchConfig = toml::from_str(
            r#"
            logger_level = true
            body_log_mode = ["FULL"]
            stop_watch_mode = 1
            body_log_length = 64
            "#,
        )
        .unwrap();

        assert_eq!(config.logger_level, LoggerLevel::Debug);
        assert_eq!(config.body_log_mode, BodyLogMode::Truncated);
        assert_eq!(config.stop_watch_mode, StopWatchMode::Simply);
        assert_eq!(config.body_log_length, 64);
    }

    #[test]
    fn test_enum_values_are_case_insensitive() {
        let config: WatchConfig = toml::from_str(
            r#"
            logger_level = "info"
            body_log_mode = "Skip"
            stop_watch_mode = "detail"
            "#,
        )
        .unwrap();

        assert_eq!(config.logger_level, LoggerLevel::Info);
        assert_eq!(config.body_log_mode, BodyLogMode::Skip);
        assert_eq!(config.stop_watch_mode, StopWatchMode::Detail);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(!config.watch.use_request_context);
        assert!(!config.watch.body_logger);
        assert_eq!(config.watch.line_template, "<%data%>");
        assert!(config.watch.stop_watch_mode.is_enabled());
        assert!(!StopWatchMode::None.is_enabled());
    }
}
