//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, lenient enum fallback)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → WatchConfig shared via Arc with the interceptor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AppConfig, BodyLogMode, ListenerConfig, LogFormat, LoggerLevel, ObservabilityConfig,
    StopWatchMode, TimeoutConfig, WatchConfig,
};
pub use validation::ValidationError;
