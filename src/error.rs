use thiserror::Error;

/// Error taxonomy for the analysis engine.
///
/// Callers always receive either a well-formed result (possibly carrying
/// embedded per-file diagnostics) or one of these structured failures.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O failure at {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Capacity exceeded: {0}")]
    Capacity(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

impl AnalyzerError {
    /// Build an I/O error with the offending path attached.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
