//! Audit trail primitives.
//!
//! # Data Flow
//! ```text
//! interceptor line text
//!     → truncate.rs (size policy for captured payloads)
//!     → description.rs (template + placeholder values)
//!     → logger.rs (AuditLogger sink at the configured level)
//! ```

pub mod description;
pub mod logger;
pub mod truncate;

pub use description::AuditDescription;
pub use logger::{AuditError, AuditLogger, CapturedLine, MemoryAuditLogger, TracingAuditLogger};
pub use truncate::TRUNCATION_MARKER;
