//! Background task model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use uuid::Uuid;

use crate::analysis::AnalyzedFile;
use crate::config::AnalysisConfig;
use crate::discovery::FileDescriptor;

/// Opaque unique task identifier, generated at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of analysis a task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    Structure,
    FileAnalysis,
    CodeAnalysis,
}

/// Task lifecycle state.
///
/// Transitions are monotonic: Pending→Running→{Completed|Failed}, plus
/// Pending→Cancelled and Running→Cancelled. There is no way out of a
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Call arguments captured at submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskParams {
    pub project_path: PathBuf,
    #[serde(default)]
    pub target_patterns: Option<Vec<String>>,
    /// Ignore file name override; the config default applies when absent.
    #[serde(default)]
    pub ignore_file: Option<String>,
    /// Per-call size limit override.
    #[serde(default)]
    pub max_file_size: Option<u64>,
}

impl TaskParams {
    pub fn for_path(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            target_patterns: None,
            ignore_file: None,
            max_file_size: None,
        }
    }
}

/// Result payload of a finished task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum TaskOutput {
    Structure(Vec<FileDescriptor>),
    Analysis(BTreeMap<String, AnalyzedFile>),
}

/// Outcome of one pipeline execution.
#[derive(Debug)]
pub(crate) enum PipelineOutcome {
    Completed(TaskOutput),
    Cancelled,
}

/// A tracked unit of background work.
///
/// The config snapshot is frozen at submission: later store updates never
/// change what a queued or running task observes.
#[derive(Debug)]
pub(crate) struct Task {
    pub id: TaskId,
    pub kind: TaskKind,
    pub params: TaskParams,
    pub config: Arc<AnalysisConfig>,
    pub state: TaskState,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<TaskOutput>,
    pub error: Option<String>,
    /// Cooperative cancellation flag, checked between files.
    pub cancel: Arc<AtomicBool>,
}

impl Task {
    pub(crate) fn new(kind: TaskKind, params: TaskParams, config: Arc<AnalysisConfig>) -> Self {
        Self {
            id: TaskId::generate(),
            kind,
            params,
            config,
            state: TaskState::Pending,
            created_at: Utc::now(),
            completed_at: None,
            result: None,
            error: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn status(&self) -> TaskStatus {
        TaskStatus {
            id: self.id,
            kind: self.kind,
            state: self.state,
            created_at: self.created_at,
            completed_at: self.completed_at,
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

/// Point-in-time snapshot returned by `poll`.
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatus {
    pub id: TaskId,
    pub kind: TaskKind,
    pub state: TaskState,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Present once the task completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskOutput>,
    /// Present once the task failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
