//! Named stopwatch with sequential tasks.
//!
//! # Responsibilities
//! - Track an ordered list of named, completed task intervals
//! - Enforce at most one running task
//! - Sum completed intervals and render a breakdown table

use std::fmt::Write as _;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Timer discipline violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// `start` called while another task is running.
    #[error("task `{running}` is already running")]
    AlreadyRunning { running: String },

    /// `stop` called with nothing running.
    #[error("no task is running")]
    NotRunning,
}

/// One completed task interval.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    name: String,
    started: Instant,
    stopped: Instant,
}

impl TaskInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn elapsed(&self) -> Duration {
        self.stopped.duration_since(self.started)
    }
}

#[derive(Debug, Clone)]
struct RunningTask {
    name: String,
    started: Instant,
}

/// A stopwatch owned by one request.
#[derive(Debug, Clone)]
pub struct StopWatch {
    id: String,
    tasks: Vec<TaskInfo>,
    running: Option<RunningTask>,
}

impl StopWatch {
    /// Create an idle stopwatch named after its owner.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tasks: Vec::new(),
            running: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Open a new task.
    pub fn start(&mut self, name: impl Into<String>) -> Result<(), TimerError> {
        if let Some(running) = &self.running {
            return Err(TimerError::AlreadyRunning {
                running: running.name.clone(),
            });
        }
        self.running = Some(RunningTask {
            name: name.into(),
            started: Instant::now(),
        });
        Ok(())
    }

    /// Close the running task and return its duration.
    pub fn stop(&mut self) -> Result<Duration, TimerError> {
        let running = self.running.take().ok_or(TimerError::NotRunning)?;
        let task = TaskInfo {
            name: running.name,
            started: running.started,
            stopped: Instant::now(),
        };
        let elapsed = task.elapsed();
        self.tasks.push(task);
        Ok(elapsed)
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Name of the running task, if any.
    pub fn current_task_name(&self) -> Option<&str> {
        self.running.as_ref().map(|t| t.name.as_str())
    }

    /// Completed tasks in completion order.
    pub fn tasks(&self) -> &[TaskInfo] {
        &self.tasks
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Sum of completed intervals. A running task is not counted.
    pub fn total_elapsed(&self) -> Duration {
        self.tasks.iter().map(TaskInfo::elapsed).sum()
    }

    /// Summary line plus a table of completed tasks ordered by start time.
    pub fn pretty_print(&self) -> String {
        let total = self.total_elapsed();
        let total_nanos = total.as_nanos();

        let mut out = format!(
            "StopWatch '{}': running time = {} ms",
            self.id,
            total.as_millis()
        );
        out.push('\n');
        out.push_str("---------------------------------------------\n");
        out.push_str("ms         %     Task name\n");
        out.push_str("---------------------------------------------\n");

        let mut ordered: Vec<&TaskInfo> = self.tasks.iter().collect();
        ordered.sort_by_key(|t| t.started);

        for task in ordered {
            let nanos = task.elapsed().as_nanos();
            let percent = if total_nanos == 0 {
                0
            } else {
                nanos * 100 / total_nanos
            };
            // Writing into a String cannot fail.
            let _ = writeln!(
                out,
                "{:0>9}  {:>3}%  {}",
                task.elapsed().as_millis(),
                percent,
                task.name
            );
        }
        out
    }
}
