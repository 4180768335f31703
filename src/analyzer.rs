//! Synchronous analysis operations and the pipeline shared with workers.
//!
//! Every operation, whether called directly or executed by a scheduler
//! worker, runs the same Discoverer→Analyzer pipeline against a frozen
//! config snapshot, so a configuration update issued mid-run never changes
//! what an in-flight operation observes.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::analysis::{self, AnalyzedFile};
use crate::config::{AnalysisConfig, ConfigStore};
use crate::discovery::{Classification, FileDescriptor, FileDiscoverer, ProjectStats};
use crate::error::{AnalyzerError, Result};
use crate::ignore::{IgnoreMatcher, path_matches_pattern};
use crate::scheduler::PipelineOutcome;
use crate::scheduler::{TaskKind, TaskOutput, TaskParams};

/// Overlay per-call parameter overrides on a config snapshot.
fn effective_config(config: &AnalysisConfig, params: &TaskParams) -> AnalysisConfig {
    let mut effective = config.clone();
    if let Some(limit) = params.max_file_size {
        effective.max_file_size = limit;
    }
    effective
}

/// Run one analysis pipeline to completion or cooperative cancellation.
///
/// The cancellation flag is checked between files; an in-flight file read
/// always finishes or is abandoned whole.
pub(crate) fn execute(
    kind: TaskKind,
    params: &TaskParams,
    config: &AnalysisConfig,
    cancel: &AtomicBool,
) -> Result<PipelineOutcome> {
    let effective = effective_config(config, params);
    let root = params.project_path.as_path();
    let matcher = IgnoreMatcher::load(root, &effective, params.ignore_file.as_deref());
    let discoverer = FileDiscoverer::new(root, matcher, Arc::new(effective.clone()))?;

    debug!(root = %root.display(), kind = ?kind, "Pipeline started");

    match kind {
        TaskKind::Structure => {
            let mut descriptors = Vec::new();
            for descriptor in discoverer.walk() {
                if cancel.load(Ordering::Relaxed) {
                    return Ok(PipelineOutcome::Cancelled);
                }
                descriptors.push(descriptor);
            }
            Ok(PipelineOutcome::Completed(TaskOutput::Structure(
                descriptors,
            )))
        }
        TaskKind::FileAnalysis | TaskKind::CodeAnalysis => {
            let with_code_info = kind == TaskKind::CodeAnalysis;
            let mut files = BTreeMap::new();

            for descriptor in discoverer.walk() {
                if cancel.load(Ordering::Relaxed) {
                    return Ok(PipelineOutcome::Cancelled);
                }
                if descriptor.classification == Classification::SkippedExcluded {
                    continue;
                }
                if let Some(patterns) = &params.target_patterns {
                    if !patterns.is_empty()
                        && !patterns
                            .iter()
                            .any(|p| path_matches_pattern(p, &descriptor.relative_path))
                    {
                        continue;
                    }
                }
                if descriptor.classification == Classification::Binary
                    && !effective.include_binary_info
                {
                    continue;
                }

                let analyzed = analysis::analyze(&descriptor, &effective, with_code_info);
                files.insert(descriptor.relative_key(), analyzed);
            }
            Ok(PipelineOutcome::Completed(TaskOutput::Analysis(files)))
        }
    }
}

/// Entry point for the synchronous operations of the tool surface.
pub struct ProjectAnalyzer {
    config: Arc<ConfigStore>,
}

impl ProjectAnalyzer {
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self { config }
    }

    fn run(&self, kind: TaskKind, params: &TaskParams) -> Result<TaskOutput> {
        let never_cancelled = AtomicBool::new(false);
        match execute(kind, params, &self.config.get(), &never_cancelled)? {
            PipelineOutcome::Completed(output) => Ok(output),
            PipelineOutcome::Cancelled => Err(AnalyzerError::InvalidState(
                "synchronous pipeline reported cancellation".to_string(),
            )),
        }
    }

    /// Deterministic structure listing of the project tree.
    pub fn project_structure(&self, params: &TaskParams) -> Result<Vec<FileDescriptor>> {
        match self.run(TaskKind::Structure, params)? {
            TaskOutput::Structure(descriptors) => Ok(descriptors),
            TaskOutput::Analysis(_) => Err(AnalyzerError::InvalidState(
                "structure pipeline produced analysis output".to_string(),
            )),
        }
    }

    /// Content extraction keyed by relative path.
    pub fn analyze_files(&self, params: &TaskParams) -> Result<BTreeMap<String, AnalyzedFile>> {
        match self.run(TaskKind::FileAnalysis, params)? {
            TaskOutput::Analysis(files) => Ok(files),
            TaskOutput::Structure(_) => Err(AnalyzerError::InvalidState(
                "analysis pipeline produced structure output".to_string(),
            )),
        }
    }

    /// Like [`analyze_files`](Self::analyze_files) with diagnostics and
    /// import/signature extraction populated.
    pub fn analyze_code(&self, params: &TaskParams) -> Result<BTreeMap<String, AnalyzedFile>> {
        match self.run(TaskKind::CodeAnalysis, params)? {
            TaskOutput::Analysis(files) => Ok(files),
            TaskOutput::Structure(_) => Err(AnalyzerError::InvalidState(
                "analysis pipeline produced structure output".to_string(),
            )),
        }
    }

    /// Aggregate counts and sizes from a discovery pass.
    pub fn stats(&self, project_path: Option<&Path>) -> Result<ProjectStats> {
        let root = project_path.unwrap_or_else(|| Path::new("."));
        let config = self.config.get();
        let matcher = IgnoreMatcher::load(root, &config, None);
        let discoverer = FileDiscoverer::new(root, matcher, config.clone())?;
        Ok(ProjectStats::collect(discoverer.included()))
    }
}
