//! Delayed-task scheduling for debounced navigation.
//!
//! The controller's only mutable state is a single pending-navigation
//! slot; arming and cancelling that slot goes through the [`Scheduler`]
//! trait so hosts can plug in their own event loop.
//!
//! Two implementations ship with the crate:
//!
//! - [`ThreadScheduler`] (feature `timer`, on by default) — spawns a
//!   short-lived thread per task that sleeps for the delay, checks the
//!   cancellation flag, and runs.
//! - [`ManualScheduler`] — queues tasks until [`fire_all`](ManualScheduler::fire_all)
//!   is called. For hosts that drive their own ticks, and for
//!   deterministic tests.
//!
//! # Example
//!
//! ```
//! use query_state::scheduler::{ManualScheduler, Scheduler};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let scheduler = ManualScheduler::new();
//! let fired = Arc::new(AtomicUsize::new(0));
//!
//! let count = fired.clone();
//! let first = scheduler.schedule(Duration::from_millis(50), Box::new(move || {
//!     count.fetch_add(1, Ordering::SeqCst);
//! }));
//!
//! // Superseded before firing: cancel and arm a replacement.
//! first.cancel();
//! let count = fired.clone();
//! scheduler.schedule(Duration::from_millis(50), Box::new(move || {
//!     count.fetch_add(1, Ordering::SeqCst);
//! }));
//!
//! scheduler.fire_all();
//! assert_eq!(fired.load(Ordering::SeqCst), 1);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A boxed deferred task.
pub type Task = Box<dyn FnOnce() + Send>;

/// Handle to a scheduled task; the one cancellation point in the crate.
///
/// Cancelling is idempotent and races benignly with firing: the runner
/// checks the flag immediately before executing the task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
    fired: Arc<AtomicBool>,
}

impl TaskHandle {
    fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Prevent the task from running if it has not fired yet.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Return `true` once `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return `true` once the task has run.
    pub fn is_finished(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    fn mark_finished(&self) {
        self.fired.store(true, Ordering::SeqCst);
    }
}

/// Delayed-task primitive used for debounced navigation writes.
pub trait Scheduler: Send + Sync {
    /// Arm `task` to run after `delay`; the returned handle cancels it.
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle;
}

// ============================================================================
// ThreadScheduler
// ============================================================================

/// Scheduler backed by one short-lived thread per task.
///
/// Good enough for debounce delays in the tens-to-hundreds of
/// milliseconds; hosts with their own timer wheel should implement
/// [`Scheduler`] directly.
#[cfg(feature = "timer")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScheduler;

#[cfg(feature = "timer")]
impl Scheduler for ThreadScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        let runner = handle.clone();

        std::thread::spawn(move || {
            std::thread::sleep(delay);
            if !runner.is_cancelled() {
                runner.mark_finished();
                task();
            }
        });

        handle
    }
}

// ============================================================================
// ManualScheduler
// ============================================================================

/// Scheduler that never fires on its own.
///
/// Armed tasks accumulate until [`fire_all`](Self::fire_all) runs every
/// non-cancelled one, in arming order. The delay is recorded but not
/// waited on.
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<Vec<(TaskHandle, Task)>>,
}

impl ManualScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every armed, non-cancelled task in arming order.
    pub fn fire_all(&self) {
        let drained: Vec<(TaskHandle, Task)> = match self.queue.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => return,
        };

        for (handle, task) in drained {
            if !handle.is_cancelled() {
                handle.mark_finished();
                task();
            }
        }
    }

    /// Number of armed tasks that have not been cancelled.
    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .map(|queue| {
                queue
                    .iter()
                    .filter(|(handle, _)| !handle.is_cancelled())
                    .count()
            })
            .unwrap_or(0)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, _delay: Duration, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        if let Ok(mut queue) = self.queue.lock() {
            queue.push((handle.clone(), task));
        }
        handle
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
