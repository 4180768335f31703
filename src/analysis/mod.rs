//! Content classification and per-file analysis.

mod content;
mod diagnostics;

pub use content::{AnalyzedFile, BINARY_SAMPLE_SIZE, analyze, classify_bytes};
pub use diagnostics::{CodeInfo, Diagnostic, extract_code_info, run_checks};

pub(crate) use content::classify_file;
