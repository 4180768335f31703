//! Bounded background task scheduler.
//!
//! A fixed pool of worker threads drains a FIFO queue of task ids. All
//! shared state lives behind a single mutex around the task store; workers
//! only hold it to claim and finalize tasks, never while a pipeline runs.

mod store;
mod task;

pub use store::MAX_RETAINED_TERMINAL;
pub use task::{TaskId, TaskKind, TaskOutput, TaskParams, TaskState, TaskStatus};

pub(crate) use task::PipelineOutcome;

use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

use crate::analyzer;
use crate::config::ConfigStore;
use crate::error::{AnalyzerError, Result};

use store::TaskStore;
use task::Task;

/// Pending tasks admitted before submissions are rejected.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

struct Shared {
    store: Mutex<TaskStore>,
    queue_capacity: usize,
}

impl Shared {
    fn store(&self) -> MutexGuard<'_, TaskStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Bounded worker pool executing analysis tasks in submission order.
///
/// The pool size is read from the config snapshot at construction and
/// stays fixed for the scheduler's lifetime; later updates to
/// `max_concurrent_analyses` only take effect on a new scheduler.
pub struct TaskScheduler {
    shared: Arc<Shared>,
    config: Arc<ConfigStore>,
    sender: Option<Sender<TaskId>>,
    workers: Vec<JoinHandle<()>>,
}

impl TaskScheduler {
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self::with_capacity(config, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(config: Arc<ConfigStore>, queue_capacity: usize) -> Self {
        let workers = config.get().max_concurrent_analyses;
        let shared = Arc::new(Shared {
            store: Mutex::new(TaskStore::new(MAX_RETAINED_TERMINAL)),
            queue_capacity,
        });

        let (sender, receiver) = mpsc::channel::<TaskId>();
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..workers)
            .map(|index| {
                let shared = shared.clone();
                let receiver = receiver.clone();
                thread::Builder::new()
                    .name(format!("analysis-worker-{index}"))
                    .spawn(move || worker_loop(&shared, &receiver))
            })
            .collect::<std::io::Result<Vec<_>>>()
            .unwrap_or_else(|e| {
                // A short pool would stall the queue; spawn failure means
                // the process cannot run analyses at all.
                panic!("failed to spawn analysis workers: {e}");
            });

        debug!(workers, queue_capacity, "Scheduler started");

        Self {
            shared,
            config,
            sender: Some(sender),
            workers: handles,
        }
    }

    /// Admit a task at the back of the queue.
    ///
    /// The current config snapshot is captured here; the task observes it
    /// unchanged no matter how long it waits. Fails with a capacity error
    /// when the pending queue is full, creating no task.
    pub fn submit(&self, kind: TaskKind, params: TaskParams) -> Result<TaskId> {
        let snapshot = self.config.get();
        let mut store = self.shared.store();
        if store.pending_len() >= self.shared.queue_capacity {
            return Err(AnalyzerError::Capacity(format!(
                "pending queue is full ({} tasks)",
                self.shared.queue_capacity
            )));
        }
        let task = Task::new(kind, params, snapshot);
        let id = task.id;
        store.insert(task);

        // Send while holding the store lock so queue order matches
        // insertion order under concurrent submissions. The channel is
        // unbounded, so the send never blocks.
        if let Some(sender) = &self.sender {
            if sender.send(id).is_err() {
                // Workers are gone; surface the dead pool instead of
                // leaving the task pending forever.
                return Err(AnalyzerError::InvalidState(
                    "scheduler is shut down".to_string(),
                ));
            }
        }
        debug!(task_id = %id, kind = ?kind, "Task submitted");
        Ok(id)
    }

    /// Status snapshot for a task, or not-found once it was evicted.
    pub fn poll(&self, id: TaskId) -> Result<TaskStatus> {
        self.shared
            .store()
            .status(id)
            .ok_or_else(|| AnalyzerError::NotFound(format!("task {id}")))
    }

    /// Request cancellation. Returns the state observed at the time of the
    /// request: Cancelled for a queued task, Running when the flag was
    /// raised and the worker has yet to notice.
    pub fn cancel(&self, id: TaskId) -> Result<TaskState> {
        self.shared.store().cancel(id)
    }

    pub fn pending(&self) -> usize {
        self.shared.store().pending_len()
    }

    pub fn running(&self) -> usize {
        self.shared.store().running_len()
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        // Closing the channel lets workers drain the queue and exit.
        drop(self.sender.take());
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("Analysis worker panicked during shutdown");
            }
        }
    }
}

fn worker_loop(shared: &Shared, receiver: &Mutex<Receiver<TaskId>>) {
    loop {
        let (id, claimed) = {
            let guard = receiver.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let id = match guard.recv() {
                Ok(id) => id,
                Err(_) => break,
            };
            // Claim while still holding the receiver so tasks enter
            // Running in dequeue order; no other path takes the store
            // lock with the receiver held.
            (id, shared.store().claim(id))
        };

        let Some(claimed) = claimed else {
            // Cancelled while queued, or already evicted.
            continue;
        };

        // A cancel may land between claim and the first flag check inside
        // the pipeline; the flag covers that window.
        let outcome = if claimed.cancel.load(Ordering::Relaxed) {
            Ok(PipelineOutcome::Cancelled)
        } else {
            analyzer::execute(claimed.kind, &claimed.params, &claimed.config, &claimed.cancel)
        };

        shared.store().finish(id, outcome);
    }
}
