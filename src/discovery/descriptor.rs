//! File descriptors produced by discovery.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Content classification assigned during discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// Decodable text content, eligible for analysis.
    Text,
    /// Binary content detected from the leading sample.
    Binary,
    /// Size exceeds the configured limit; no bytes were read.
    SkippedTooLarge,
    /// Matched by an ignore rule, config exclusion, or the extension
    /// allowlist.
    SkippedExcluded,
}

impl Classification {
    /// Whether this file was skipped rather than classified by content.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::SkippedTooLarge | Self::SkippedExcluded)
    }
}

/// Immutable description of one discovered file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Path relative to the walk root.
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
    /// Size in bytes as reported by metadata.
    pub size: u64,
    /// Lowercased extension, if any.
    pub extension: Option<String>,
    pub classification: Classification,
}

impl FileDescriptor {
    /// Relative path joined with `/` regardless of platform.
    pub fn relative_key(&self) -> String {
        self.relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_skipped() {
        assert!(Classification::SkippedTooLarge.is_skipped());
        assert!(Classification::SkippedExcluded.is_skipped());
        assert!(!Classification::Text.is_skipped());
        assert!(!Classification::Binary.is_skipped());
    }

    #[test]
    fn test_classification_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Classification::SkippedTooLarge).unwrap(),
            "\"skipped-too-large\""
        );
        assert_eq!(
            serde_json::to_string(&Classification::Text).unwrap(),
            "\"text\""
        );
    }

    #[test]
    fn test_relative_key_uses_forward_slashes() {
        let descriptor = FileDescriptor {
            relative_path: PathBuf::from("src").join("main.rs"),
            absolute_path: PathBuf::from("/project/src/main.rs"),
            size: 10,
            extension: Some("rs".to_string()),
            classification: Classification::Text,
        };
        assert_eq!(descriptor.relative_key(), "src/main.rs");
    }
}
