//! Aggregate project statistics derived from a discovery pass.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::descriptor::FileDescriptor;

/// Counts and sizes over the files a discovery pass retained.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectStats {
    pub total_files: usize,
    pub total_size: u64,
    /// File count per lowercased extension; extensionless files are
    /// grouped under `(none)`.
    pub file_types: BTreeMap<String, usize>,
    pub largest_file: Option<PathBuf>,
    pub largest_file_size: u64,
}

impl ProjectStats {
    /// Fold a descriptor sequence into aggregate statistics.
    pub fn collect(descriptors: impl Iterator<Item = FileDescriptor>) -> Self {
        let mut stats = Self::default();
        for descriptor in descriptors {
            stats.total_files += 1;
            stats.total_size += descriptor.size;

            if descriptor.size > stats.largest_file_size {
                stats.largest_file_size = descriptor.size;
                stats.largest_file = Some(descriptor.relative_path.clone());
            }

            let key = descriptor
                .extension
                .clone()
                .unwrap_or_else(|| "(none)".to_string());
            *stats.file_types.entry(key).or_default() += 1;
        }
        stats
    }
}
