//! Single-owner execution for a non-thread-safe foreign handle.
//!
//! Every operation against the handle is funnelled onto one thread. Callers on
//! any other thread block until their operation has run there; callers already
//! on that thread run inline, so operations may submit further operations
//! without deadlocking.
//!
//! Two strategies back the same [`Executor`] contract:
//! - [`OwnerThread`] spawns a private worker thread fed by an unbounded FIFO
//!   queue.
//! - [`AffinityDispatcher`] borrows a privileged thread the host already runs
//!   (a UI or main thread) and hands work to it through the host's own serial
//!   dispatch, described by [`HostScheduler`].
//!
//! [`Serializer`] picks one of them when it is constructed; nothing past that
//! point needs to know which.

pub mod affinity;
mod owner;
mod queue;
mod task;
mod worker;

pub use affinity::{AffinityDispatcher, HostScheduler, MainLoop, MainThread};
pub use owner::OwnerThread;

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Default name given to the dedicated worker thread.
pub const DEFAULT_THREAD_NAME: &str = "automated-browser-owner";

/// Failures originating in the executor rather than in a submitted operation.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Failed to spawn owner thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("Owner thread dropped the task without reporting an outcome")]
    WorkerLost,

    #[error("Host scheduler is no longer accepting work")]
    HostUnavailable,
}

/// Run operations one at a time on a single designated thread.
///
/// `execute` looks like a direct synchronous call to the caller: it returns
/// the operation's value or its error unchanged. A panic inside the operation
/// is re-raised on the calling thread.
pub trait Executor {
    /// Whether the calling thread is the one operations run on.
    fn is_owner_thread(&self) -> bool;

    /// Run `op` on the owner thread and wait for its outcome.
    fn execute<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<ExecutorError> + Send + 'static;
}

/// Configuration for a dedicated owner thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Name of the spawned worker thread
    pub thread_name: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl ExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

/// Snapshot of an executor's counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Operations handed to the owner thread from another thread
    pub submitted: u64,
    /// Handed-over operations whose outcome has been delivered
    pub completed: u64,
    /// Operations run directly because the caller already was the owner
    pub inline: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    inline: AtomicU64,
}

impl Counters {
    /// Record a submission and return its sequence number.
    pub(crate) fn record_submitted(&self) -> u64 {
        self.submitted.fetch_add(1, Ordering::Relaxed)
    }

    /// Undo a submission the host refused to accept.
    pub(crate) fn withdraw_submitted(&self) {
        self.submitted.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_inline(&self) {
        self.inline.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ExecutorStats {
        ExecutorStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            inline: self.inline.load(Ordering::Relaxed),
        }
    }
}

/// The executor strategy chosen for a deployment.
///
/// Cloning is cheap; clones share the same owner thread.
#[derive(Clone)]
pub enum Serializer {
    /// A private worker thread with its own task queue.
    Dedicated(OwnerThread),
    /// A privileged thread supplied by the host.
    HostAffinity(AffinityDispatcher),
}

impl Serializer {
    /// Spawn a new private owner thread.
    pub fn dedicated(config: ExecutorConfig) -> Result<Self, ExecutorError> {
        OwnerThread::spawn(config).map(Serializer::Dedicated)
    }

    /// Use the process-wide owner thread, creating it on first use.
    pub fn shared() -> Result<Self, ExecutorError> {
        OwnerThread::global().map(|owner| Serializer::Dedicated(owner.clone()))
    }

    /// Dispatch onto the host's privileged thread.
    pub fn host_affinity(host: Arc<dyn HostScheduler>) -> Self {
        Serializer::HostAffinity(AffinityDispatcher::new(host))
    }

    pub fn stats(&self) -> ExecutorStats {
        match self {
            Serializer::Dedicated(owner) => owner.stats(),
            Serializer::HostAffinity(dispatcher) => dispatcher.stats(),
        }
    }
}

impl Executor for Serializer {
    fn is_owner_thread(&self) -> bool {
        match self {
            Serializer::Dedicated(owner) => owner.is_owner_thread(),
            Serializer::HostAffinity(dispatcher) => dispatcher.is_owner_thread(),
        }
    }

    fn execute<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<ExecutorError> + Send + 'static,
    {
        match self {
            Serializer::Dedicated(owner) => owner.execute(op),
            Serializer::HostAffinity(dispatcher) => dispatcher.execute(op),
        }
    }
}

impl std::fmt::Debug for Serializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Serializer::Dedicated(owner) => f.debug_tuple("Dedicated").field(owner).finish(),
            Serializer::HostAffinity(_) => f.write_str("HostAffinity"),
        }
    }
}
