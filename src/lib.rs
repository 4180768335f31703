//! Project analysis engine: deterministic file discovery, content
//! classification, and a bounded background scheduler behind a typed tool
//! surface.
//!
//! The crate is transport-agnostic. A host process deserializes requests
//! into [`tools::ToolRequest`], hands them to [`tools::AnalyzerService`],
//! and serializes the [`tools::ToolResponse`] back out in whatever
//! protocol it speaks.

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod discovery;
pub mod error;
pub mod ignore;
pub mod scheduler;
pub mod tools;

pub use analyzer::ProjectAnalyzer;
pub use config::{AnalysisConfig, ConfigPatch, ConfigStore, OutputFormat};
pub use discovery::{Classification, FileDescriptor, FileDiscoverer, ProjectStats};
pub use error::{AnalyzerError, Result};
pub use ignore::IgnoreMatcher;
pub use scheduler::{TaskId, TaskKind, TaskParams, TaskScheduler, TaskState, TaskStatus};
pub use tools::{AnalyzerService, ToolRequest, ToolResponse};
