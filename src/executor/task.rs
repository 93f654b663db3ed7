//! Units of work handed to the owner thread.

use super::ExecutorError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::thread;

/// What an operation left behind: its own `Result`, or the payload of a panic
/// raised while it ran.
pub(crate) type Outcome<T, E> = thread::Result<Result<T, E>>;

/// Type-erased job run on whichever thread owns the foreign handle.
///
/// The hook passed in runs after the operation returns and before the waiting
/// caller is released.
pub(crate) type Job = Box<dyn FnOnce(&dyn Fn()) + Send + 'static>;

/// An operation paired with the channel that carries its outcome back to the
/// submitting caller.
///
/// A task is created per call and consumed by [`Task::run`], so its outcome
/// is delivered at most once.
pub(crate) struct Task {
    id: u64,
    job: Job,
}

impl Task {
    pub(crate) fn new<T, E, F>(id: u64, op: F) -> (Self, Receiver<Outcome<T, E>>)
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let (job, outcome_rx) = into_job(op);
        (Self { id, job }, outcome_rx)
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Run the operation on the current thread, call `on_complete`, then
    /// deliver the outcome.
    pub(crate) fn run(self, on_complete: &dyn Fn()) {
        (self.job)(on_complete)
    }
}

/// Wrap `op` so that running the returned job captures its outcome, panics
/// included, and sends it to the returned receiver.
pub(crate) fn into_job<T, E, F>(op: F) -> (Job, Receiver<Outcome<T, E>>)
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let (outcome_tx, outcome_rx) = mpsc::sync_channel(1);
    let job: Job = Box::new(move |on_complete: &dyn Fn()| {
        let outcome = panic::catch_unwind(AssertUnwindSafe(op));
        if outcome.is_err() {
            tracing::warn!("operation panicked; re-raising on the submitting thread");
        }
        on_complete();
        // The submitter may have unwound already; nobody is left to tell.
        let _ = outcome_tx.send(outcome);
    });
    (job, outcome_rx)
}

/// Block until the outcome of a submitted job arrives and surface it as if the
/// operation had been called directly.
pub(crate) fn wait_for<T, E>(outcome_rx: Receiver<Outcome<T, E>>) -> Result<T, E>
where
    E: From<ExecutorError>,
{
    match outcome_rx.recv() {
        Ok(Ok(result)) => result,
        Ok(Err(payload)) => panic::resume_unwind(payload),
        Err(_) => Err(ExecutorError::WorkerLost.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Failed(&'static str),
        Executor(String),
    }

    impl From<ExecutorError> for TestError {
        fn from(err: ExecutorError) -> Self {
            TestError::Executor(err.to_string())
        }
    }

    #[test]
    fn test_task_delivers_value() {
        let (task, rx) = Task::new(7, || Ok::<_, TestError>(42));
        assert_eq!(task.id(), 7);
        task.run(&|| {});
        assert_eq!(wait_for(rx), Ok(42));
    }

    #[test]
    fn test_task_delivers_error() {
        let (task, rx) = Task::new(1, || Err::<(), _>(TestError::Failed("boom")));
        task.run(&|| {});
        assert_eq!(wait_for(rx), Err(TestError::Failed("boom")));
    }

    #[test]
    fn test_dropped_task_reports_worker_lost() {
        let (task, rx) = Task::new(1, || Ok::<_, TestError>(()));
        drop(task);
        assert!(matches!(wait_for(rx), Err(TestError::Executor(_))));
    }

    #[test]
    fn test_panic_is_reraised_on_waiter() {
        let (task, rx) = Task::new(1, || -> Result<(), TestError> { panic!("inside op") });
        task.run(&|| {});
        let caught = panic::catch_unwind(AssertUnwindSafe(|| wait_for(rx)));
        let payload = caught.expect_err("panic should propagate to the waiter");
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"inside op"));
    }
}
