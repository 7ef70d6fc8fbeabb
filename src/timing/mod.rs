//! Request timing.
//!
//! A [`StopWatch`] is created lazily for a request, lives in that request's
//! [`RequestScope`](crate::watch::RequestScope) and is released when the
//! request ends. There is no process-wide timer table.

pub mod stopwatch;

pub use stopwatch::{StopWatch, TaskInfo, TimerError};
