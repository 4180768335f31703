//! Task bookkeeping behind the scheduler's coordination lock.

use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::{AnalyzerError, Result};

use super::task::{PipelineOutcome, Task, TaskId, TaskKind, TaskParams, TaskState, TaskStatus};

/// Terminal tasks retained before the oldest-finished one is evicted.
pub const MAX_RETAINED_TERMINAL: usize = 64;

/// Everything a worker needs to execute a claimed task.
pub(crate) struct ClaimedTask {
    pub kind: TaskKind,
    pub params: TaskParams,
    pub config: Arc<AnalysisConfig>,
    pub cancel: Arc<AtomicBool>,
}

/// Map of live and recently finished tasks.
///
/// Ids stay unique for the store's lifetime; state transitions are
/// enforced here and are monotonic. Terminal tasks are retained up to
/// [`MAX_RETAINED_TERMINAL`] and then evicted oldest-first, after which
/// their ids poll as not found.
pub(crate) struct TaskStore {
    tasks: FxHashMap<TaskId, Task>,
    terminal: VecDeque<TaskId>,
    pending: usize,
    max_retained: usize,
}

impl TaskStore {
    pub(crate) fn new(max_retained: usize) -> Self {
        Self {
            tasks: FxHashMap::default(),
            terminal: VecDeque::new(),
            pending: 0,
            max_retained,
        }
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending
    }

    pub(crate) fn running_len(&self) -> usize {
        self.tasks
            .values()
            .filter(|t| t.state == TaskState::Running)
            .count()
    }

    pub(crate) fn insert(&mut self, task: Task) {
        debug_assert_eq!(task.state, TaskState::Pending);
        self.pending += 1;
        self.tasks.insert(task.id, task);
    }

    pub(crate) fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.tasks.get(&id).map(Task::status)
    }

    /// Transition a Pending task to Running and hand out its execution
    /// snapshot. Returns `None` when the task is no longer claimable
    /// (cancelled while queued, or evicted).
    pub(crate) fn claim(&mut self, id: TaskId) -> Option<ClaimedTask> {
        let task = self.tasks.get_mut(&id)?;
        if task.state != TaskState::Pending {
            return None;
        }
        task.state = TaskState::Running;
        self.pending -= 1;
        debug!(task_id = %id, kind = ?task.kind, "Task running");
        Some(ClaimedTask {
            kind: task.kind,
            params: task.params.clone(),
            config: task.config.clone(),
            cancel: task.cancel.clone(),
        })
    }

    /// Finalize a Running task from its pipeline outcome.
    pub(crate) fn finish(&mut self, id: TaskId, outcome: Result<PipelineOutcome>) {
        let Some(task) = self.tasks.get_mut(&id) else {
            return;
        };
        if task.state != TaskState::Running {
            return;
        }

        match outcome {
            Ok(PipelineOutcome::Completed(output)) => {
                task.state = TaskState::Completed;
                task.result = Some(output);
            }
            Ok(PipelineOutcome::Cancelled) => {
                task.state = TaskState::Cancelled;
            }
            Err(e) => {
                task.state = TaskState::Failed;
                task.error = Some(e.to_string());
            }
        }
        task.completed_at = Some(chrono::Utc::now());
        debug!(task_id = %id, state = ?task.state, "Task finished");
        self.retire(id);
    }

    /// Cancel a task.
    ///
    /// Pending tasks transition directly to Cancelled; Running tasks get
    /// their cooperative flag raised and finalize at the next file
    /// boundary. Cancelling a terminal task is an error.
    pub(crate) fn cancel(&mut self, id: TaskId) -> Result<TaskState> {
        let task = self
            .tasks
            .get_mut(&id)
            .ok_or_else(|| AnalyzerError::NotFound(format!("task {id}")))?;

        match task.state {
            TaskState::Pending => {
                task.state = TaskState::Cancelled;
                task.completed_at = Some(chrono::Utc::now());
                self.pending -= 1;
                debug!(task_id = %id, "Pending task cancelled");
                self.retire(id);
                Ok(TaskState::Cancelled)
            }
            TaskState::Running => {
                task.cancel.store(true, Ordering::Relaxed);
                debug!(task_id = %id, "Cancellation requested for running task");
                Ok(TaskState::Running)
            }
            state => Err(AnalyzerError::InvalidState(format!(
                "task {id} is already {state:?}"
            ))),
        }
    }

    /// Record a terminal task and evict beyond the retention bound.
    fn retire(&mut self, id: TaskId) {
        self.terminal.push_back(id);
        while self.terminal.len() > self.max_retained {
            if let Some(evicted) = self.terminal.pop_front() {
                self.tasks.remove(&evicted);
                debug!(task_id = %evicted, "Evicted terminal task");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::task::TaskOutput;

    fn pending_task() -> Task {
        Task::new(
            TaskKind::Structure,
            TaskParams::for_path("/project"),
            Arc::new(AnalysisConfig::default()),
        )
    }

    #[test]
    fn test_insert_and_status() {
        let mut store = TaskStore::new(MAX_RETAINED_TERMINAL);
        let task = pending_task();
        let id = task.id;
        store.insert(task);

        let status = store.status(id).unwrap();
        assert_eq!(status.state, TaskState::Pending);
        assert_eq!(store.pending_len(), 1);
    }

    #[test]
    fn test_claim_transitions_to_running() {
        let mut store = TaskStore::new(MAX_RETAINED_TERMINAL);
        let task = pending_task();
        let id = task.id;
        store.insert(task);

        let claimed = store.claim(id).unwrap();
        assert_eq!(claimed.kind, TaskKind::Structure);
        assert_eq!(store.status(id).unwrap().state, TaskState::Running);
        assert_eq!(store.pending_len(), 0);
        assert_eq!(store.running_len(), 1);
    }

    #[test]
    fn test_claim_cancelled_task_returns_none() {
        let mut store = TaskStore::new(MAX_RETAINED_TERMINAL);
        let task = pending_task();
        let id = task.id;
        store.insert(task);

        store.cancel(id).unwrap();
        assert!(store.claim(id).is_none());
    }

    #[test]
    fn test_finish_completed() {
        let mut store = TaskStore::new(MAX_RETAINED_TERMINAL);
        let task = pending_task();
        let id = task.id;
        store.insert(task);
        store.claim(id).unwrap();

        store.finish(
            id,
            Ok(PipelineOutcome::Completed(TaskOutput::Structure(Vec::new()))),
        );
        let status = store.status(id).unwrap();
        assert_eq!(status.state, TaskState::Completed);
        assert!(status.result.is_some());
        assert!(status.completed_at.is_some());
    }

    #[test]
    fn test_finish_failed_records_error() {
        let mut store = TaskStore::new(MAX_RETAINED_TERMINAL);
        let task = pending_task();
        let id = task.id;
        store.insert(task);
        store.claim(id).unwrap();

        store.finish(id, Err(AnalyzerError::NotFound("/gone".to_string())));
        let status = store.status(id).unwrap();
        assert_eq!(status.state, TaskState::Failed);
        assert!(status.error.as_deref().unwrap().contains("/gone"));
    }

    #[test]
    fn test_cancel_pending_goes_directly_to_cancelled() {
        let mut store = TaskStore::new(MAX_RETAINED_TERMINAL);
        let task = pending_task();
        let id = task.id;
        store.insert(task);

        assert_eq!(store.cancel(id).unwrap(), TaskState::Cancelled);
        assert_eq!(store.status(id).unwrap().state, TaskState::Cancelled);
        assert_eq!(store.pending_len(), 0);
    }

    #[test]
    fn test_cancel_running_raises_flag_only() {
        let mut store = TaskStore::new(MAX_RETAINED_TERMINAL);
        let task = pending_task();
        let id = task.id;
        store.insert(task);
        let claimed = store.claim(id).unwrap();

        assert_eq!(store.cancel(id).unwrap(), TaskState::Running);
        assert!(claimed.cancel.load(Ordering::Relaxed));
        // State changes only when the worker observes the flag.
        assert_eq!(store.status(id).unwrap().state, TaskState::Running);

        store.finish(id, Ok(PipelineOutcome::Cancelled));
        assert_eq!(store.status(id).unwrap().state, TaskState::Cancelled);
    }

    #[test]
    fn test_cancel_terminal_is_invalid_state() {
        let mut store = TaskStore::new(MAX_RETAINED_TERMINAL);
        let task = pending_task();
        let id = task.id;
        store.insert(task);
        store.claim(id).unwrap();
        store.finish(
            id,
            Ok(PipelineOutcome::Completed(TaskOutput::Structure(Vec::new()))),
        );

        let err = store.cancel(id).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidState(_)));
    }

    #[test]
    fn test_cancel_unknown_is_not_found() {
        let mut store = TaskStore::new(MAX_RETAINED_TERMINAL);
        let err = store.cancel(TaskId::generate()).unwrap_err();
        assert!(matches!(err, AnalyzerError::NotFound(_)));
    }

    #[test]
    fn test_eviction_bound() {
        let mut store = TaskStore::new(2);
        let mut ids = Vec::new();
        for _ in 0..3 {
            let task = pending_task();
            let id = task.id;
            store.insert(task);
            store.claim(id).unwrap();
            store.finish(
                id,
                Ok(PipelineOutcome::Completed(TaskOutput::Structure(Vec::new()))),
            );
            ids.push(id);
        }

        // Oldest terminal task evicted; newer two retained.
        assert!(store.status(ids[0]).is_none());
        assert!(store.status(ids[1]).is_some());
        assert!(store.status(ids[2]).is_some());
    }

    #[test]
    fn test_no_transition_out_of_terminal() {
        let mut store = TaskStore::new(MAX_RETAINED_TERMINAL);
        let task = pending_task();
        let id = task.id;
        store.insert(task);
        store.claim(id).unwrap();
        store.finish(id, Ok(PipelineOutcome::Cancelled));

        // A late finish from a confused worker is ignored.
        store.finish(
            id,
            Ok(PipelineOutcome::Completed(TaskOutput::Structure(Vec::new()))),
        );
        assert_eq!(store.status(id).unwrap().state, TaskState::Cancelled);
    }
}
