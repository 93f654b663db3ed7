//! Executor that borrows a privileged thread owned by the host.
//!
//! Some hosts insist that a foreign runtime is only touched from one specific
//! thread they control, typically the process main thread or a UI thread. No
//! worker is spawned here. Instead the host's serial dispatch mechanism,
//! described by [`HostScheduler`], delivers each operation to that thread and
//! supplies the ordering and mutual exclusion.
//!
//! [`MainLoop`] is a ready-made host for programs that do not already have an
//! event loop: the thread that creates it becomes the privileged thread and
//! pumps dispatched work by calling [`MainLoop::run`].

use super::task;
use super::{Counters, Executor, ExecutorError, ExecutorStats};
use std::marker::PhantomData;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Work handed to the host for its privileged thread.
pub type HostJob = Box<dyn FnOnce() + Send + 'static>;

/// Serial dispatch onto a privileged thread, as provided by the host.
///
/// Implementations must run dispatched jobs one at a time, in the order they
/// were dispatched, on the privileged thread.
pub trait HostScheduler: Send + Sync {
    /// Whether the calling thread is the privileged thread.
    fn is_current(&self) -> bool;

    /// Queue `job` for the privileged thread. Returns once the host has
    /// accepted the job, not once it has run.
    fn dispatch(&self, job: HostJob) -> Result<(), ExecutorError>;
}

/// Executor that synchronously hands operations to a host-owned thread.
#[derive(Clone)]
pub struct AffinityDispatcher {
    host: Arc<dyn HostScheduler>,
    counters: Arc<Counters>,
}

impl AffinityDispatcher {
    pub fn new(host: Arc<dyn HostScheduler>) -> Self {
        Self {
            host,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn stats(&self) -> ExecutorStats {
        self.counters.snapshot()
    }
}

impl Executor for AffinityDispatcher {
    fn is_owner_thread(&self) -> bool {
        self.host.is_current()
    }

    fn execute<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<ExecutorError> + Send + 'static,
    {
        if self.host.is_current() {
            self.counters.record_inline();
            return op();
        }

        let id = self.counters.record_submitted();
        let (job, outcome_rx) = task::into_job(op);
        let counters = Arc::clone(&self.counters);
        tracing::trace!(task = id, "dispatching to privileged thread");
        if let Err(err) = self
            .host
            .dispatch(Box::new(move || job(&|| counters.record_completed())))
        {
            self.counters.withdraw_submitted();
            return Err(err.into());
        }
        task::wait_for(outcome_rx)
    }
}

/// A minimal host event loop owned by the thread that creates it.
///
/// Jobs dispatched through any [`MainThread`] handle are run, in dispatch
/// order, by whichever of [`run`](MainLoop::run) or
/// [`run_pending`](MainLoop::run_pending) the owning thread calls.
///
/// The loop cannot leave the thread that created it:
///
/// ```compile_fail
/// use automated_browser::executor::MainLoop;
///
/// let main_loop = MainLoop::new();
/// std::thread::spawn(move || main_loop.run());
/// ```
pub struct MainLoop {
    jobs: Receiver<HostJob>,
    handle: MainThread,
    // Pins the loop to its creating thread, which `MainThread` treats as privileged.
    _not_send: PhantomData<*const ()>,
}

/// Cloneable, thread-safe handle that dispatches onto a [`MainLoop`].
#[derive(Clone)]
pub struct MainThread {
    sender: Sender<HostJob>,
    thread: ThreadId,
}

impl MainLoop {
    /// Claim the calling thread as the privileged thread.
    pub fn new() -> Self {
        let (sender, jobs) = mpsc::channel();
        Self {
            jobs,
            handle: MainThread {
                sender,
                thread: thread::current().id(),
            },
            _not_send: PhantomData,
        }
    }

    pub fn handle(&self) -> MainThread {
        self.handle.clone()
    }

    /// Run dispatched jobs until every [`MainThread`] handle has been dropped.
    pub fn run(self) {
        let MainLoop { jobs, handle, .. } = self;
        drop(handle);
        tracing::debug!("main loop running");
        for job in jobs {
            job();
        }
        tracing::debug!("main loop finished; no handles left");
    }

    /// Run the jobs already dispatched and return how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            match self.jobs.try_recv() {
                Ok(job) => {
                    job();
                    ran += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return ran,
            }
        }
    }
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl HostScheduler for MainThread {
    fn is_current(&self) -> bool {
        thread::current().id() == self.thread
    }

    fn dispatch(&self, job: HostJob) -> Result<(), ExecutorError> {
        self.sender
            .send(job)
            .map_err(|_| ExecutorError::HostUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Rejected,
        Executor(String),
    }

    impl From<ExecutorError> for TestError {
        fn from(err: ExecutorError) -> Self {
            TestError::Executor(err.to_string())
        }
    }

    #[test]
    fn test_inline_on_privileged_thread() {
        let main_loop = MainLoop::new();
        let dispatcher = AffinityDispatcher::new(Arc::new(main_loop.handle()));

        assert!(dispatcher.is_owner_thread());
        assert_eq!(dispatcher.execute(|| Ok::<_, TestError>(1)), Ok(1));
        assert_eq!(main_loop.run_pending(), 0);
        assert_eq!(dispatcher.stats().inline, 1);
    }

    #[test]
    fn test_dispatch_from_many_threads() {
        let main_loop = MainLoop::new();
        let privileged = thread::current().id();
        let dispatcher = AffinityDispatcher::new(Arc::new(main_loop.handle()));
        let active = Arc::new(AtomicUsize::new(0));
        let total = Arc::new(AtomicUsize::new(0));

        let callers: Vec<_> = (0..4)
            .map(|_| {
                let dispatcher = dispatcher.clone();
                let active = Arc::clone(&active);
                let total = Arc::clone(&total);
                thread::spawn(move || {
                    for _ in 0..25 {
                        let active = Arc::clone(&active);
                        let total = Arc::clone(&total);
                        let ran_on = dispatcher
                            .execute(move || {
                                assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0);
                                total.fetch_add(1, Ordering::SeqCst);
                                active.fetch_sub(1, Ordering::SeqCst);
                                Ok::<_, TestError>(thread::current().id())
                            })
                            .unwrap();
                        assert_eq!(ran_on, privileged);
                    }
                })
            })
            .collect();
        drop(dispatcher);

        // The callers hold the remaining handles; the loop ends once they finish.
        main_loop.run();
        for caller in callers {
            caller.join().unwrap();
        }
        assert_eq!(total.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_reentrant_dispatch_runs_inline() {
        let main_loop = MainLoop::new();
        let dispatcher = AffinityDispatcher::new(Arc::new(main_loop.handle()));

        let caller = {
            let dispatcher = dispatcher.clone();
            thread::spawn(move || {
                let nested = dispatcher.clone();
                dispatcher.execute(move || {
                    let outer = thread::current().id();
                    let inner = nested.execute(|| Ok::<_, TestError>(thread::current().id()))?;
                    Ok::<_, TestError>(outer == inner)
                })
            })
        };
        drop(dispatcher);

        main_loop.run();
        assert_eq!(caller.join().unwrap(), Ok(true));
    }

    #[test]
    fn test_failure_is_returned_to_caller() {
        let main_loop = MainLoop::new();
        let dispatcher = AffinityDispatcher::new(Arc::new(main_loop.handle()));

        let caller = thread::spawn(move || {
            let failed = dispatcher.execute(|| Err::<(), _>(TestError::Rejected));
            let succeeded = dispatcher.execute(|| Ok::<_, TestError>("next"));
            (failed, succeeded)
        });

        main_loop.run();
        let (failed, succeeded) = caller.join().unwrap();
        assert_eq!(failed, Err(TestError::Rejected));
        assert_eq!(succeeded, Ok("next"));
    }

    #[test]
    fn test_dispatch_after_loop_is_gone() {
        let main_loop = MainLoop::new();
        let handle = main_loop.handle();
        drop(main_loop);

        let dispatcher = AffinityDispatcher::new(Arc::new(handle));
        let caller = dispatcher.clone();
        let result = thread::spawn(move || caller.execute(|| Ok::<_, TestError>(())))
            .join()
            .unwrap();
        assert!(matches!(result, Err(TestError::Executor(_))));

        // A rejected dispatch was never submitted.
        let stats = dispatcher.stats();
        assert_eq!(stats.submitted, 0);
        assert_eq!(stats.completed, 0);
    }

    #[test]
    fn test_pending_jobs_run_on_creating_thread() {
        let main_loop = MainLoop::new();
        let creator = thread::current().id();
        let dispatcher = AffinityDispatcher::new(Arc::new(main_loop.handle()));

        let caller = thread::spawn(move || {
            let ran_on = dispatcher.execute(|| Ok::<_, TestError>(thread::current().id()));
            (ran_on, dispatcher.is_owner_thread())
        });

        let mut ran = 0;
        while ran == 0 {
            ran = main_loop.run_pending();
            thread::yield_now();
        }
        let (ran_on, caller_is_owner) = caller.join().unwrap();
        assert_eq!(ran_on, Ok(creator));
        assert!(!caller_is_owner);
    }
}
