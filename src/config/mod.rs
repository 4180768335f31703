//! Analysis configuration and the atomically swapped config store.
//!
//! The live configuration is process-wide state, but it is only ever
//! observed through immutable snapshots: `ConfigStore::get` hands out a
//! cheap `Arc` clone, and `update` publishes a whole new snapshot after
//! validating the merge. Tasks capture their own snapshot at submission
//! and are never affected by later updates.

mod loading;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::error::{AnalyzerError, Result};

/// Output format hint carried in the configuration.
///
/// The engine never renders output itself; this value is consumed by the
/// external formatter that serializes results for the calling protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Plain,
    #[default]
    Markdown,
    Json,
}

/// Immutable analysis configuration snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub project_name: String,
    /// Name of the ignore file looked up in the project root.
    pub ignore_file: String,
    /// Upper bound on bytes read per file. Files above it are marked
    /// skipped-too-large without reading any bytes.
    pub max_file_size: u64,
    /// Extension allowlist. Empty means every extension is allowed.
    pub supported_extensions: BTreeSet<String>,
    /// Unconditional glob exclusions. These cannot be negated and take
    /// precedence over the extension allowlist.
    pub exclude_patterns: BTreeSet<String>,
    /// Whether binary files appear (as metadata-only entries) in analysis
    /// results.
    pub include_binary_info: bool,
    pub output_format: OutputFormat,
    /// Worker pool size for background analyses.
    pub max_concurrent_analyses: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            project_name: "Project".to_string(),
            ignore_file: ".gitignore".to_string(),
            max_file_size: 1024 * 1024,
            supported_extensions: [
                "py", "js", "ts", "jsx", "tsx", "java", "cpp", "c", "h", "go", "rs", "php", "rb",
                "swift", "kt", "scala", "sh", "md", "txt", "json", "yaml", "yml", "xml", "html",
                "css",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            exclude_patterns: [
                "__pycache__",
                ".pytest_cache",
                "node_modules",
                ".git",
                ".vscode",
                ".idea",
                "*.pyc",
                "*.pyo",
                "*.pyd",
                ".DS_Store",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            include_binary_info: true,
            output_format: OutputFormat::default(),
            max_concurrent_analyses: 3,
        }
    }
}

impl AnalysisConfig {
    /// Validate field ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size == 0 {
            return Err(AnalyzerError::Config(
                "max_file_size must be greater than 0".to_string(),
            ));
        }
        if self.max_concurrent_analyses == 0 {
            return Err(AnalyzerError::Config(
                "max_concurrent_analyses must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `ext` (without leading dot) passes the extension allowlist.
    pub fn extension_allowed(&self, ext: Option<&str>) -> bool {
        if self.supported_extensions.is_empty() {
            return true;
        }
        ext.is_some_and(|e| {
            let e = e.trim_start_matches('.').to_lowercase();
            self.supported_extensions.contains(&e)
        })
    }
}

/// Partial configuration used for runtime updates.
///
/// Every field is optional; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigPatch {
    pub project_name: Option<String>,
    pub ignore_file: Option<String>,
    pub max_file_size: Option<u64>,
    pub supported_extensions: Option<BTreeSet<String>>,
    pub exclude_patterns: Option<BTreeSet<String>>,
    pub include_binary_info: Option<bool>,
    pub output_format: Option<OutputFormat>,
    pub max_concurrent_analyses: Option<usize>,
}

impl ConfigPatch {
    /// Merge this patch over `base`, producing a candidate snapshot.
    fn apply_to(&self, base: &AnalysisConfig) -> AnalysisConfig {
        let mut next = base.clone();
        if let Some(v) = &self.project_name {
            next.project_name = v.clone();
        }
        if let Some(v) = &self.ignore_file {
            next.ignore_file = v.clone();
        }
        if let Some(v) = self.max_file_size {
            next.max_file_size = v;
        }
        if let Some(v) = &self.supported_extensions {
            // Accept entries with or without a leading dot.
            next.supported_extensions = v
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect();
        }
        if let Some(v) = &self.exclude_patterns {
            next.exclude_patterns = v.clone();
        }
        if let Some(v) = self.include_binary_info {
            next.include_binary_info = v;
        }
        if let Some(v) = self.output_format {
            next.output_format = v;
        }
        if let Some(v) = self.max_concurrent_analyses {
            next.max_concurrent_analyses = v;
        }
        next
    }
}

/// Holder of the current configuration snapshot.
pub struct ConfigStore {
    current: RwLock<Arc<AnalysisConfig>>,
}

impl ConfigStore {
    /// Create a store seeded with `config`.
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Return the current snapshot. Cheap and never blocks on updates for
    /// longer than the pointer swap itself.
    pub fn get(&self) -> Arc<AnalysisConfig> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Validate `patch`, merge it over the current snapshot, and publish
    /// the result atomically.
    ///
    /// On any invalid field the store is left unchanged and
    /// `AnalyzerError::Config` is returned.
    pub fn update(&self, patch: &ConfigPatch) -> Result<Arc<AnalysisConfig>> {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let candidate = patch.apply_to(&guard);
        candidate.validate()?;
        let next = Arc::new(candidate);
        *guard = next.clone();
        debug!(
            max_file_size = next.max_file_size,
            workers = next.max_concurrent_analyses,
            "Configuration updated"
        );
        Ok(next)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}
