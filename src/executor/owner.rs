//! Task-queue executor backed by a private owner thread.

use super::task::{self, Task};
use super::worker::{spawn_worker_thread, Shared};
use super::{Executor, ExecutorConfig, ExecutorError, ExecutorStats};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Process-wide owner thread.
///
/// Created on first access and never torn down; every caller in the process
/// that asks for it shares the same worker.
static GLOBAL_OWNER: OnceCell<OwnerThread> = OnceCell::new();

/// Handle to a dedicated thread that runs submitted operations one by one.
///
/// Clones share the same thread and queue.
#[derive(Clone)]
pub struct OwnerThread {
    shared: Arc<Shared>,
    worker: ThreadId,
    name: Arc<str>,
}

impl OwnerThread {
    /// Spawn a new owner thread.
    pub fn spawn(config: ExecutorConfig) -> Result<Self, ExecutorError> {
        let shared = Arc::new(Shared::new());
        let worker = spawn_worker_thread(&config.thread_name, Arc::clone(&shared))
            .map_err(ExecutorError::Spawn)?;
        Ok(Self {
            shared,
            worker,
            name: config.thread_name.into(),
        })
    }

    /// The process-wide owner thread, spawned on first call.
    ///
    /// Safe to call from many threads at once; exactly one worker is created.
    /// If spawning fails the error is returned and the next call tries again.
    pub fn global() -> Result<&'static OwnerThread, ExecutorError> {
        GLOBAL_OWNER.get_or_try_init(|| OwnerThread::spawn(ExecutorConfig::default()))
    }

    /// Name of the worker thread.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity of the worker thread.
    pub fn thread_id(&self) -> ThreadId {
        self.worker
    }

    /// Number of operations waiting behind the one currently running.
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn stats(&self) -> ExecutorStats {
        self.shared.counters.snapshot()
    }
}

impl Executor for OwnerThread {
    fn is_owner_thread(&self) -> bool {
        thread::current().id() == self.worker
    }

    fn execute<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<ExecutorError> + Send + 'static,
    {
        if self.is_owner_thread() {
            // Enqueueing here would have the worker wait on itself.
            self.shared.counters.record_inline();
            tracing::trace!(thread = %self.name, "running reentrant operation inline");
            return op();
        }

        let id = self.shared.counters.record_submitted();
        let (task, outcome_rx) = Task::new(id, op);
        tracing::trace!(thread = %self.name, task = id, "enqueueing task");
        self.shared.queue.push(task);
        task::wait_for(outcome_rx)
    }
}

impl std::fmt::Debug for OwnerThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerThread")
            .field("name", &self.name)
            .field("worker", &self.worker)
            .field("pending", &self.pending())
            .finish()
    }
}
