//! Queue of tasks waiting for the owner thread.

use super::task::Task;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Unbounded FIFO of pending tasks shared between submitters and the worker.
///
/// Insertion order is the order in which submitters acquire the lock, so two
/// racing submissions still end up totally ordered.
pub(crate) struct TaskQueue {
    pending: Mutex<VecDeque<Task>>,
    available: Condvar,
}

impl TaskQueue {
    /// Create a new empty task queue
    pub(crate) fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Append a task and wake the worker if it is idle.
    pub(crate) fn push(&self, task: Task) {
        let mut pending = self.pending.lock();
        pending.push_back(task);
        self.available.notify_one();
    }

    /// Remove the head task, blocking while the queue is empty.
    pub(crate) fn pop_blocking(&self) -> Task {
        let mut pending = self.pending.lock();
        loop {
            if let Some(task) = pending.pop_front() {
                return task;
            }
            self.available.wait(&mut pending);
        }
    }

    /// Remove the head task without waiting.
    #[cfg(test)]
    pub(crate) fn try_pop(&self) -> Option<Task> {
        self.pending.lock().pop_front()
    }

    /// Get the number of queued tasks
    pub(crate) fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Check if the queue is empty
    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn noop(id: u64) -> Task {
        Task::new(id, || Ok::<_, ()>(())).0
    }

    #[test]
    fn test_task_queue_basic() {
        let queue = TaskQueue::new();
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn test_task_queue_fifo() {
        let queue = TaskQueue::new();

        for i in 0..5 {
            queue.push(noop(i));
        }
        assert_eq!(queue.len(), 5);

        for i in 0..5 {
            assert_eq!(queue.pop_blocking().id(), i);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_blocking_wakes_on_push() {
        let queue = Arc::new(TaskQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop_blocking().id())
        };

        // Give the consumer a chance to park on the condition variable.
        thread::sleep(Duration::from_millis(50));
        queue.push(noop(99));

        assert_eq!(consumer.join().unwrap(), 99);
        assert!(queue.is_empty());
    }
}
