//! Content reading and binary detection.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, trace};

use crate::config::AnalysisConfig;
use crate::discovery::{Classification, FileDescriptor};

use super::diagnostics::{self, CodeInfo, Diagnostic};

/// Bytes sampled from the head of a file for binary detection.
pub const BINARY_SAMPLE_SIZE: usize = 8 * 1024;

/// Fraction of undecodable bytes in the sample above which a file is
/// treated as binary.
const INVALID_UTF8_RATIO: f64 = 0.30;

/// Result of reading and classifying one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedFile {
    pub descriptor: FileDescriptor,
    /// Decoded text content; omitted for binary and skipped files.
    pub content: Option<String>,
    /// Best-effort structural check failures. Never empty the file from
    /// the result set; a failed check is data, not an error.
    pub diagnostics: Vec<Diagnostic>,
    /// Import/signature extraction, populated for code analysis only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_info: Option<CodeInfo>,
}

/// Classify a byte sample as text or binary.
///
/// A null byte, or too high a share of undecodable bytes, means binary.
pub fn classify_bytes(sample: &[u8]) -> Classification {
    if sample.is_empty() {
        return Classification::Text;
    }
    if sample.contains(&0) {
        return Classification::Binary;
    }

    let mut invalid = 0usize;
    let mut rest = sample;
    loop {
        match std::str::from_utf8(rest) {
            Ok(_) => break,
            Err(e) => {
                let valid = e.valid_up_to();
                match e.error_len() {
                    Some(len) => {
                        invalid += len;
                        rest = &rest[valid + len..];
                    }
                    // Truncated sequence at the sample boundary; not
                    // evidence of binary content.
                    None => break,
                }
            }
        }
    }

    if invalid as f64 / sample.len() as f64 > INVALID_UTF8_RATIO {
        Classification::Binary
    } else {
        Classification::Text
    }
}

/// Sample the head of `path` and classify it.
pub(crate) fn classify_file(path: &Path) -> std::io::Result<Classification> {
    let file = fs::File::open(path)?;
    let mut sample = Vec::with_capacity(BINARY_SAMPLE_SIZE);
    file.take(BINARY_SAMPLE_SIZE as u64)
        .read_to_end(&mut sample)?;
    Ok(classify_bytes(&sample))
}

/// Read and analyze one discovered file.
///
/// This is a pure function of the file bytes and the config snapshot: it
/// reads at most `max_file_size` bytes and has no other side effects.
/// Skipped descriptors pass through untouched; binary content is always
/// omitted. Structural check failures become diagnostics attached to the
/// file and never abort the read.
pub fn analyze(
    descriptor: &FileDescriptor,
    config: &AnalysisConfig,
    with_code_info: bool,
) -> AnalyzedFile {
    let mut analyzed = AnalyzedFile {
        descriptor: descriptor.clone(),
        content: None,
        diagnostics: Vec::new(),
        code_info: None,
    };

    if descriptor.classification != Classification::Text {
        trace!(
            path = %descriptor.relative_path.display(),
            classification = ?descriptor.classification,
            "No content to analyze"
        );
        return analyzed;
    }

    let content = match read_limited(&descriptor.absolute_path, config.max_file_size) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!(path = %descriptor.absolute_path.display(), error = %e, "Read failed");
            analyzed.diagnostics.push(Diagnostic {
                check: "read".to_string(),
                message: e.to_string(),
            });
            return analyzed;
        }
    };

    analyzed.diagnostics = diagnostics::run_checks(descriptor.extension.as_deref(), &content);
    if with_code_info {
        analyzed.code_info = Some(diagnostics::extract_code_info(
            descriptor.extension.as_deref(),
            &content,
        ));
    }
    analyzed.content = Some(content);
    analyzed
}

fn read_limited(path: &Path, limit: u64) -> std::io::Result<Vec<u8>> {
    let file = fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.take(limit).read_to_end(&mut bytes)?;
    Ok(bytes)
}
