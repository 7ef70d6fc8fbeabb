//! HTTP middleware.

pub mod request_watch;

pub use request_watch::{RequestWatchLayer, RequestWatchService};
