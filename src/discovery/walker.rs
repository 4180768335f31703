//! Ignore-aware directory walking.

use rustc_hash::FxHashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{trace, warn};
use walkdir::WalkDir;

use crate::analysis::classify_file;
use crate::config::AnalysisConfig;
use crate::error::{AnalyzerError, Result};
use crate::ignore::IgnoreMatcher;

use super::descriptor::{Classification, FileDescriptor};

/// Walks a project tree and produces file descriptors.
///
/// Traversal is depth-first with siblings in lexicographic name order, so
/// two walks of an unchanged tree yield the same sequence. Excluded
/// directories are pruned without being descended; excluded files are
/// emitted as `skipped-excluded` markers and oversize files as
/// `skipped-too-large` without reading any bytes. Symbolic links are
/// followed, resolved to their real path, and deduplicated by it, so a
/// link whose target was already visited is neither re-descended nor
/// re-emitted.
#[derive(Debug)]
pub struct FileDiscoverer {
    root: PathBuf,
    matcher: IgnoreMatcher,
    config: Arc<AnalysisConfig>,
}

impl FileDiscoverer {
    /// Create a discoverer rooted at `root`.
    ///
    /// Fails with `NotFound` for a missing root and `Io` for a root that
    /// is not a directory.
    pub fn new(root: &Path, matcher: IgnoreMatcher, config: Arc<AnalysisConfig>) -> Result<Self> {
        if !root.exists() {
            return Err(AnalyzerError::NotFound(root.display().to_string()));
        }
        if !root.is_dir() {
            return Err(AnalyzerError::io(
                root.display().to_string(),
                std::io::Error::other("project root is not a directory"),
            ));
        }
        Ok(Self {
            root: root.to_path_buf(),
            matcher,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazy, finite, restartable descriptor sequence over the tree.
    pub fn walk(&self) -> impl Iterator<Item = FileDescriptor> + '_ {
        let matcher = &self.matcher;
        let root = self.root.clone();
        let mut visited: FxHashSet<PathBuf> = FxHashSet::default();
        if let Ok(real_root) = fs::canonicalize(&root) {
            visited.insert(real_root);
        }

        WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                let rel = match entry.path().strip_prefix(&root) {
                    Ok(rel) => rel,
                    Err(_) => return true,
                };
                if rel.as_os_str().is_empty() {
                    // Never prune the root itself.
                    return true;
                }

                if entry.file_type().is_dir() && matcher.is_excluded(rel, true) {
                    trace!(path = %rel.display(), "Pruning excluded directory");
                    return false;
                }

                // Dedup by real path to break symlink cycles and diamonds.
                if entry.file_type().is_dir() || entry.path_is_symlink() {
                    if let Ok(real) = fs::canonicalize(entry.path()) {
                        if !visited.insert(real) {
                            trace!(path = %rel.display(), "Skipping already-visited link target");
                            return false;
                        }
                    }
                }

                true
            })
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    warn!(error = %e, "Walk entry error");
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .filter_map(move |e| self.describe(e.path(), e.metadata().ok().map(|m| m.len())))
    }

    /// Only the descriptors that survived exclusion and the size limit.
    pub fn included(&self) -> impl Iterator<Item = FileDescriptor> + '_ {
        self.walk().filter(|d| !d.classification.is_skipped())
    }

    fn describe(&self, path: &Path, size: Option<u64>) -> Option<FileDescriptor> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let size = size?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        let classification = if self.matcher.is_excluded(rel, false) {
            Classification::SkippedExcluded
        } else if size > self.config.max_file_size {
            Classification::SkippedTooLarge
        } else {
            match classify_file(path) {
                Ok(c) => c,
                Err(e) => {
                    // Unreadable files stay in the listing; the analysis
                    // read reports the failure as a diagnostic.
                    warn!(path = %path.display(), error = %e, "Could not sample file");
                    Classification::Text
                }
            }
        };

        Some(FileDescriptor {
            relative_path: rel.to_path_buf(),
            absolute_path: path.to_path_buf(),
            size,
            extension,
            classification,
        })
    }
}
