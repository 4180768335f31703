//! Typed request/response surface over the analysis engine.
//!
//! Transport and rendering live outside this crate; callers hand in a
//! deserialized [`ToolRequest`] and get a serializable [`ToolResponse`]
//! back. Every request is dispatched exhaustively, so adding a tool
//! without handling it is a compile error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::analysis::AnalyzedFile;
use crate::analyzer::ProjectAnalyzer;
use crate::config::{AnalysisConfig, ConfigPatch, ConfigStore, OutputFormat};
use crate::discovery::{FileDescriptor, ProjectStats};
use crate::error::Result;
use crate::scheduler::{TaskId, TaskKind, TaskParams, TaskScheduler, TaskState, TaskStatus};

/// One call into the engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolRequest {
    /// Deterministic listing of the project tree.
    ProjectStructure {
        project_path: PathBuf,
        #[serde(default)]
        ignore_file: Option<String>,
        /// Format hint for the external formatter; the configured default
        /// applies when absent.
        #[serde(default)]
        output_format: Option<OutputFormat>,
    },
    /// File contents keyed by relative path.
    AnalyzeFiles {
        project_path: PathBuf,
        #[serde(default)]
        target_patterns: Option<Vec<String>>,
        #[serde(default)]
        ignore_file: Option<String>,
        #[serde(default)]
        output_format: Option<OutputFormat>,
        #[serde(default)]
        max_file_size: Option<u64>,
    },
    /// Like `analyze_files` with diagnostics and code info.
    AnalyzeCode {
        project_path: PathBuf,
        #[serde(default)]
        target_patterns: Option<Vec<String>>,
        #[serde(default)]
        ignore_file: Option<String>,
        #[serde(default)]
        output_format: Option<OutputFormat>,
    },
    /// Merge a partial configuration over the live one.
    ConfigureAnalyzer { config: ConfigPatch },
    /// Aggregate counts and sizes.
    GetStats {
        #[serde(default)]
        project_path: Option<PathBuf>,
    },
    /// Queue an analysis for background execution.
    StartBackgroundTask { kind: TaskKind, params: TaskParams },
    /// Poll a background task.
    GetBackgroundResult { task_id: TaskId },
}

/// Result of one call, mirroring the request variants.
#[derive(Debug, Serialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolResponse {
    ProjectStructure {
        output_format: OutputFormat,
        files: Vec<FileDescriptor>,
    },
    AnalyzeFiles {
        output_format: OutputFormat,
        files: BTreeMap<String, AnalyzedFile>,
    },
    AnalyzeCode {
        output_format: OutputFormat,
        files: BTreeMap<String, AnalyzedFile>,
    },
    ConfigureAnalyzer {
        config: AnalysisConfig,
    },
    GetStats {
        output_format: OutputFormat,
        stats: ProjectStats,
    },
    StartBackgroundTask {
        task_id: TaskId,
    },
    GetBackgroundResult {
        status: TaskStatus,
    },
}

/// The assembled engine: shared config, synchronous operations, and the
/// background scheduler.
pub struct AnalyzerService {
    config: Arc<ConfigStore>,
    analyzer: ProjectAnalyzer,
    scheduler: TaskScheduler,
}

impl AnalyzerService {
    pub fn new(config: AnalysisConfig) -> Self {
        Self::with_store(Arc::new(ConfigStore::new(config)))
    }

    pub fn with_store(config: Arc<ConfigStore>) -> Self {
        let analyzer = ProjectAnalyzer::new(config.clone());
        let scheduler = TaskScheduler::new(config.clone());
        Self {
            config,
            analyzer,
            scheduler,
        }
    }

    /// Dispatch one request.
    pub fn handle(&self, request: ToolRequest) -> Result<ToolResponse> {
        let default_format = self.config.get().output_format;
        match request {
            ToolRequest::ProjectStructure {
                project_path,
                ignore_file,
                output_format,
            } => {
                let mut params = TaskParams::for_path(project_path);
                params.ignore_file = ignore_file;
                let files = self.analyzer.project_structure(&params)?;
                Ok(ToolResponse::ProjectStructure {
                    output_format: output_format.unwrap_or(default_format),
                    files,
                })
            }
            ToolRequest::AnalyzeFiles {
                project_path,
                target_patterns,
                ignore_file,
                output_format,
                max_file_size,
            } => {
                let mut params = TaskParams::for_path(project_path);
                params.target_patterns = target_patterns;
                params.ignore_file = ignore_file;
                params.max_file_size = max_file_size;
                let files = self.analyzer.analyze_files(&params)?;
                Ok(ToolResponse::AnalyzeFiles {
                    output_format: output_format.unwrap_or(default_format),
                    files,
                })
            }
            ToolRequest::AnalyzeCode {
                project_path,
                target_patterns,
                ignore_file,
                output_format,
            } => {
                let mut params = TaskParams::for_path(project_path);
                params.target_patterns = target_patterns;
                params.ignore_file = ignore_file;
                let files = self.analyzer.analyze_code(&params)?;
                Ok(ToolResponse::AnalyzeCode {
                    output_format: output_format.unwrap_or(default_format),
                    files,
                })
            }
            ToolRequest::ConfigureAnalyzer { config } => {
                let updated = self.config.update(&config)?;
                info!("Analyzer reconfigured");
                Ok(ToolResponse::ConfigureAnalyzer {
                    config: (*updated).clone(),
                })
            }
            ToolRequest::GetStats { project_path } => {
                let stats = self.analyzer.stats(project_path.as_deref())?;
                Ok(ToolResponse::GetStats {
                    output_format: default_format,
                    stats,
                })
            }
            ToolRequest::StartBackgroundTask { kind, params } => {
                let task_id = self.scheduler.submit(kind, params)?;
                Ok(ToolResponse::StartBackgroundTask { task_id })
            }
            ToolRequest::GetBackgroundResult { task_id } => {
                let status = self.scheduler.poll(task_id)?;
                Ok(ToolResponse::GetBackgroundResult { status })
            }
        }
    }

    /// Request cancellation of a background task.
    pub fn cancel_task(&self, task_id: TaskId) -> Result<TaskState> {
        self.scheduler.cancel(task_id)
    }
}
