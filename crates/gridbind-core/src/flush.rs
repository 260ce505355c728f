//! End-of-turn task queue.
//!
//! Tasks posted here run when the owner of the processing turn calls
//! [`FlushQueue::flush`], typically right before the view is pushed to the
//! screen or the client. Components use it to coalesce notifications: a
//! table posts one size notification per turn no matter how many resets
//! happened inside that turn.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::logging::targets;

/// Upper bound on drain passes per flush. Tasks that keep posting new tasks
/// are deferred to the next flush after this many passes.
const MAX_FLUSH_PASSES: usize = 16;

/// A unique identifier for a deferred task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Get the raw u64 value of this task ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

type BoxedTask = Box<dyn FnOnce() + Send + 'static>;

struct TaskData {
    id: TaskId,
    task: BoxedTask,
}

/// A thread-safe queue of tasks that run on the next flush.
///
/// # Example
///
/// ```
/// use gridbind_core::FlushQueue;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let queue = FlushQueue::new();
/// let runs = Arc::new(AtomicUsize::new(0));
///
/// let runs_clone = runs.clone();
/// queue.post(move || {
///     runs_clone.fetch_add(1, Ordering::SeqCst);
/// });
///
/// assert_eq!(runs.load(Ordering::SeqCst), 0);
/// assert_eq!(queue.flush(), 1);
/// assert_eq!(runs.load(Ordering::SeqCst), 1);
/// ```
#[derive(Default)]
pub struct FlushQueue {
    tasks: Mutex<VecDeque<TaskData>>,
}

impl FlushQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a task to run on the next flush.
    ///
    /// Returns the task ID that can be used to cancel the task.
    pub fn post<F>(&self, task: F) -> TaskId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = next_task_id();
        self.tasks.lock().push_back(TaskData {
            id,
            task: Box::new(task),
        });
        tracing::trace!(target: targets::FLUSH, task = id.as_u64(), "task posted");
        id
    }

    /// Cancel a pending task.
    ///
    /// Returns `true` if the task was found and cancelled.
    pub fn cancel(&self, id: TaskId) -> bool {
        let mut tasks = self.tasks.lock();
        if let Some(pos) = tasks.iter().position(|t| t.id == id) {
            tasks.remove(pos);
            true
        } else {
            false
        }
    }

    /// Check if there are any pending tasks.
    pub fn has_pending(&self) -> bool {
        !self.tasks.lock().is_empty()
    }

    /// Get the number of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Run every pending task in posting order.
    ///
    /// Tasks run with the queue unlocked, so a task may post follow-up work;
    /// follow-ups run in the same flush. Returns the number of tasks run.
    pub fn flush(&self) -> usize {
        let mut processed = 0;
        for _ in 0..MAX_FLUSH_PASSES {
            let batch: Vec<TaskData> = self.tasks.lock().drain(..).collect();
            if batch.is_empty() {
                break;
            }
            for task_data in batch {
                (task_data.task)();
                processed += 1;
            }
        }
        if processed > 0 {
            tracing::debug!(target: targets::FLUSH, processed, "flush complete");
        }
        processed
    }
}

static_assertions::assert_impl_all!(FlushQueue: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_tasks_run_in_order() {
        let queue = FlushQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = order.clone();
            queue.post(move || order.lock().push(i));
        }

        assert_eq!(queue.pending_count(), 3);
        assert_eq!(queue.flush(), 3);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
        assert!(!queue.has_pending());
    }

    #[test]
    fn test_cancel() {
        let queue = FlushQueue::new();
        let ran = Arc::new(Mutex::new(false));

        let ran_clone = ran.clone();
        let id = queue.post(move || *ran_clone.lock() = true);
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));

        assert_eq!(queue.flush(), 0);
        assert!(!*ran.lock());
    }

    #[test]
    fn test_task_may_post_follow_up() {
        let queue = Arc::new(FlushQueue::new());
        let ran = Arc::new(Mutex::new(Vec::new()));

        let queue_clone = queue.clone();
        let ran_clone = ran.clone();
        queue.post(move || {
            ran_clone.lock().push("first");
            let ran_inner = ran_clone.clone();
            queue_clone.post(move || ran_inner.lock().push("second"));
        });

        assert_eq!(queue.flush(), 2);
        assert_eq!(*ran.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_flush_empty_queue() {
        let queue = FlushQueue::new();
        assert_eq!(queue.flush(), 0);
    }
}
