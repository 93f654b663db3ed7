//! The owner thread's run loop.
//!
//! The worker is spawned once per [`OwnerThread`](super::OwnerThread) and
//! never exits: it parks on the task queue while idle and runs each task to
//! completion before taking the next one.

use super::queue::TaskQueue;
use super::Counters;
use std::io;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// State shared between the submitting side and the worker.
pub(crate) struct Shared {
    pub(crate) queue: TaskQueue,
    pub(crate) counters: Counters,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            queue: TaskQueue::new(),
            counters: Counters::default(),
        }
    }
}

/// Spawn the named worker thread and return its identity.
///
/// The join handle is dropped on purpose: the thread lives as long as the
/// process.
pub(crate) fn spawn_worker_thread(name: &str, shared: Arc<Shared>) -> io::Result<ThreadId> {
    let thread_name = name.to_string();
    let handle = thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || run(&thread_name, &shared))?;
    Ok(handle.thread().id())
}

fn run(name: &str, shared: &Shared) {
    tracing::info!(thread = name, "owner thread started");
    loop {
        let task = shared.queue.pop_blocking();
        let id = task.id();
        tracing::trace!(thread = name, task = id, "running task");
        // Failures and panics are captured inside the task and travel back to
        // the submitter; nothing here can end the loop.
        task.run(&|| shared.counters.record_completed());
        tracing::trace!(thread = name, task = id, "task completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::task::{wait_for, Task};
    use crate::executor::ExecutorError;

    #[test]
    fn test_worker_runs_tasks_on_its_own_thread() {
        let shared = Arc::new(Shared::new());
        let worker_id = spawn_worker_thread("test-worker", Arc::clone(&shared)).unwrap();
        assert_ne!(worker_id, thread::current().id());

        let (task, rx) = Task::new(0, || Ok::<_, ExecutorError>(thread::current().id()));
        shared.queue.push(task);
        assert_eq!(wait_for(rx).unwrap(), worker_id);
    }

    #[test]
    fn test_worker_thread_is_named() {
        let shared = Arc::new(Shared::new());
        spawn_worker_thread("named-owner", Arc::clone(&shared)).unwrap();

        let (task, rx) = Task::new(0, || {
            Ok::<_, ExecutorError>(thread::current().name().map(str::to_string))
        });
        shared.queue.push(task);
        assert_eq!(wait_for(rx).unwrap(), Some("named-owner".to_string()));
    }
}
