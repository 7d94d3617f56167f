//! TaskGroup — bounded fan-out with first-error propagation.
//!
//! Tasks are dispatched onto a tokio `JoinSet` once a semaphore permit is
//! available, so at most `limit` of them run at a time. The first task to
//! fail records its error; from then on `spawn` stops dispatching new work.
//! Tasks already running are never aborted: `wait` joins every one of them
//! before returning the recorded error, which gives callers a hard barrier.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::error::{SnapshotError, SnapshotResult};

/// Shared failure slot. Only the first recorded error is kept.
#[derive(Default)]
struct FirstError {
    failed: AtomicBool,
    error: Mutex<Option<SnapshotError>>,
}

impl FirstError {
    fn record(&self, error: SnapshotError) {
        let mut slot = self.error.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(error);
        }
        self.failed.store(true, Ordering::Release);
    }

    fn is_set(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    fn take(&self) -> Option<SnapshotError> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// A group of concurrently running tasks producing `T`.
pub struct TaskGroup<T> {
    semaphore: Arc<Semaphore>,
    tasks: JoinSet<Option<T>>,
    failure: Arc<FirstError>,
    dispatched: usize,
    suppressed: usize,
}

impl<T: Send + 'static> TaskGroup<T> {
    /// Create a group running at most `limit` tasks at once (minimum 1).
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit.max(1))),
            tasks: JoinSet::new(),
            failure: Arc::new(FirstError::default()),
            dispatched: 0,
            suppressed: 0,
        }
    }

    /// Dispatch `task`, waiting for a free slot first.
    ///
    /// Once a task in the group has failed, the future is dropped without
    /// running. Fails only if the group can no longer schedule work.
    pub async fn spawn<F>(&mut self, task: F) -> SnapshotResult<()>
    where
        F: Future<Output = SnapshotResult<T>> + Send + 'static,
    {
        if self.failure.is_set() {
            self.suppressed += 1;
            return Ok(());
        }
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| SnapshotError::Dispatch(e.to_string()))?;
        // A sibling may have failed while we waited for the permit.
        if self.failure.is_set() {
            self.suppressed += 1;
            return Ok(());
        }

        let failure = self.failure.clone();
        self.tasks.spawn(async move {
            let _permit = permit;
            match task.await {
                Ok(output) => Some(output),
                Err(e) => {
                    failure.record(e);
                    None
                }
            }
        });
        self.dispatched += 1;
        Ok(())
    }

    /// Number of tasks actually dispatched so far.
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    /// Join every dispatched task.
    ///
    /// Returns the outputs of all tasks (in completion order) or the first
    /// error any of them produced. A panicked task counts as a dispatch
    /// failure.
    pub async fn wait(mut self) -> SnapshotResult<Vec<T>> {
        let mut outputs = Vec::with_capacity(self.dispatched);
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(Some(output)) => outputs.push(output),
                Ok(None) => {}
                Err(e) => self
                    .failure
                    .record(SnapshotError::Dispatch(format!("task did not complete: {e}"))),
            }
        }
        if self.suppressed > 0 {
            debug!(
                dispatched = self.dispatched,
                suppressed = self.suppressed,
                "tasks suppressed after failure"
            );
        }
        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(outputs),
        }
    }
}
