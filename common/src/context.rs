use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::SolveError;

/// Per-call limits and identity supplied by the caller.
///
/// Checked by the solvers before every oracle call that starts a new unit of
/// work: each cell test while proving certainties, each model while
/// enumerating.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolveContext<'a> {
    /// Set by the caller to request an early exit.
    pub cancel: Option<&'a AtomicBool>,
    pub deadline: Option<Instant>,
    /// Included in log lines so concurrent solves can be told apart.
    pub task: Option<u64>,
}

impl<'a> SolveContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_task(mut self, task: u64) -> Self {
        self.task = Some(task);
        self
    }

    /// `Err(Cancelled)` once cancellation was requested, `Err(Timeout)` once
    /// the deadline has passed.
    pub fn checkpoint(&self) -> Result<(), SolveError> {
        if self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Err(SolveError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(SolveError::Timeout);
        }
        Ok(())
    }

    /// Log prefix naming the task, empty without one.
    pub(crate) fn tag(&self) -> String {
        self.task.map(|task| format!("[task {task}] ")).unwrap_or_default()
    }
}
