//! Deterministic, ignore-aware file discovery.
//!
//! - [`FileDiscoverer`] walks a tree depth-first in lexicographic order and
//!   produces [`FileDescriptor`]s.
//! - [`ProjectStats`] folds a discovery pass into aggregate counts.

mod descriptor;
mod stats;
mod walker;

pub use descriptor::{Classification, FileDescriptor};
pub use stats::ProjectStats;
pub use walker::FileDiscoverer;
