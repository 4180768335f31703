//! Path exclusion: ignore-file rules, config exclusions, and the
//! extension allowlist combined into a single predicate.

mod glob;
mod rule;

pub use rule::{IgnoreRule, parse_file};

use std::collections::BTreeSet;
use std::path::Path;
use tracing::trace;

use crate::config::AnalysisConfig;

/// Compiled exclusion predicate for one analysis run.
///
/// Built once per run from an ignore file and a config snapshot, then
/// queried for every discovered path. Evaluation is a pure function of the
/// rule set and the path, so verdicts are deterministic across calls.
#[derive(Debug)]
pub struct IgnoreMatcher {
    rules: Vec<IgnoreRule>,
    exclude_rules: Vec<IgnoreRule>,
    supported_extensions: BTreeSet<String>,
}

impl IgnoreMatcher {
    /// Load the ignore file named by `config` (or `ignore_file` when given)
    /// from `root` and compile it together with the config exclusions.
    pub fn load(root: &Path, config: &AnalysisConfig, ignore_file: Option<&str>) -> Self {
        let name = ignore_file.unwrap_or(&config.ignore_file);
        let rules = parse_file(&root.join(name));
        Self::from_rules(rules, config)
    }

    /// Build a matcher from an explicit rule sequence and a config snapshot.
    pub fn from_rules(rules: Vec<IgnoreRule>, config: &AnalysisConfig) -> Self {
        // Config exclusions are unconditional: negation markers are not
        // honored here, so a leading `!` is treated as pattern text and a
        // parsed negation flag is discarded by only keeping non-negated
        // parses.
        let exclude_rules = config
            .exclude_patterns
            .iter()
            .filter_map(|p| IgnoreRule::parse_line(p))
            .filter(|r| !r.is_negated())
            .collect();

        Self {
            rules,
            exclude_rules,
            supported_extensions: config.supported_extensions.clone(),
        }
    }

    /// Final exclusion verdict for a path relative to the walk root.
    ///
    /// Ignore-file verdict (last matching rule wins, negation re-includes)
    /// OR config exclusion (cannot be negated) OR extension not on a
    /// non-empty allowlist. Config exclusions therefore take precedence
    /// over the allowlist whenever both could apply.
    pub fn is_excluded(&self, rel_path: &Path, is_dir: bool) -> bool {
        let rel = rel_string(rel_path);
        if rel.is_empty() {
            return false;
        }

        if self.config_excluded(&rel, is_dir) {
            trace!(path = %rel, "Excluded by config pattern");
            return true;
        }

        if self.ignore_verdict(&rel, is_dir) {
            trace!(path = %rel, "Excluded by ignore rule");
            return true;
        }

        if !is_dir && !self.extension_allowed(rel_path) {
            trace!(path = %rel, "Extension not on allowlist");
            return true;
        }

        false
    }

    /// Verdict from the ignore-file rules alone.
    fn ignore_verdict(&self, rel: &str, is_dir: bool) -> bool {
        let mut excluded = false;
        for rule in &self.rules {
            if rule.matches(rel, is_dir) {
                excluded = !rule.is_negated();
            }
        }
        excluded
    }

    fn config_excluded(&self, rel: &str, is_dir: bool) -> bool {
        self.exclude_rules.iter().any(|r| r.matches(rel, is_dir))
    }

    fn extension_allowed(&self, rel_path: &Path) -> bool {
        if self.supported_extensions.is_empty() {
            return true;
        }
        rel_path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.supported_extensions.contains(&e.to_lowercase()))
    }
}

/// Whether a single glob pattern selects the given relative file path.
///
/// Uses the same semantics as ignore rules: unrooted unless the pattern
/// contains a separator, and a pattern naming a directory selects its
/// descendants.
pub fn path_matches_pattern(pattern: &str, rel_path: &Path) -> bool {
    IgnoreRule::parse_line(pattern)
        .is_some_and(|r| !r.is_negated() && r.matches(&rel_string(rel_path), false))
}

/// Join path components with `/` regardless of platform separator.
fn rel_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
