//! Startup configuration loading.
//!
//! The configuration document is a JSON file with the fields of
//! [`AnalysisConfig`](super::AnalysisConfig); absent fields fall back to the
//! defaults. Runtime updates through the store never persist back to disk.

use std::fs;
use std::path::Path;

use crate::error::{AnalyzerError, Result};

use super::AnalysisConfig;

impl AnalysisConfig {
    /// Load and validate a configuration document from `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| AnalyzerError::io(path.display().to_string(), e))?;

        let config: Self = serde_json::from_str(&content).map_err(|e| AnalyzerError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_from_file_partial_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analyzer.json");
        fs::write(&path, r#"{"project_name": "demo", "max_file_size": 4096}"#).unwrap();

        let config = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(config.project_name, "demo");
        assert_eq!(config.max_file_size, 4096);
        // Unspecified fields keep their defaults.
        assert_eq!(config.max_concurrent_analyses, 3);
    }

    #[test]
    fn test_from_file_missing() {
        let err = AnalysisConfig::from_file(Path::new("/nonexistent/analyzer.json")).unwrap_err();
        assert!(matches!(err, AnalyzerError::Io { .. }));
    }

    #[test]
    fn test_from_file_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analyzer.json");
        fs::write(&path, "{not json").unwrap();

        let err = AnalysisConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, AnalyzerError::Parse { .. }));
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analyzer.json");
        fs::write(&path, r#"{"max_file_size": 0}"#).unwrap();

        let err = AnalysisConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, AnalyzerError::Config(_)));
    }
}
