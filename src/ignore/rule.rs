//! Gitignore-style rule parsing and evaluation.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

use super::glob;

/// A single ignore rule with its gitignore modifiers.
///
/// Rules form an ordered sequence; on conflict the last matching rule
/// determines the verdict, and a negated rule re-includes a path excluded
/// by an earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    pattern: String,
    negated: bool,
    dir_only: bool,
    rooted: bool,
}

impl IgnoreRule {
    /// Parse one ignore-file line. Returns `None` for blanks and comments.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            return None;
        }

        let negated = text.starts_with('!');
        if negated {
            text = &text[1..];
        }

        let dir_only = text.ends_with('/');
        if dir_only {
            text = text.trim_end_matches('/');
        }

        // A separator anywhere but the end anchors the pattern to the root.
        let rooted = text.contains('/');
        let pattern = text.trim_start_matches('/').to_string();
        if pattern.is_empty() {
            return None;
        }

        Some(Self {
            pattern,
            negated,
            dir_only,
            rooted,
        })
    }

    /// Whether this rule is a negation (`!pattern`).
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// The pattern text without modifiers.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Evaluate this rule against a `/`-separated relative path.
    ///
    /// A rule matches the node itself or, through a matched ancestor
    /// directory, any of its descendants. Directory-only rules match a
    /// directory node or descendants of a matched directory, never a plain
    /// file as the terminal match.
    pub fn matches(&self, rel_path: &str, is_dir: bool) -> bool {
        let comps: Vec<&str> = rel_path.split('/').filter(|c| !c.is_empty()).collect();
        if comps.is_empty() {
            return false;
        }
        let pattern_segs: Vec<&str> = self.pattern.split('/').collect();

        let starts: Vec<usize> = if self.rooted {
            vec![0]
        } else {
            (0..comps.len()).collect()
        };

        for start in starts {
            for end in (start + 1)..=comps.len() {
                if glob::match_segments(&pattern_segs, &comps[start..end]) {
                    let terminal = end == comps.len();
                    if self.dir_only {
                        // Matched prefix must name a directory: either an
                        // ancestor of the node, or the node itself if it is
                        // a directory.
                        if !terminal || is_dir {
                            return true;
                        }
                    } else {
                        return true;
                    }
                }
            }
        }
        false
    }
}

/// Parse an ignore file into its ordered rule sequence.
///
/// A missing or unreadable file is not fatal: it contributes no rules.
pub fn parse_file(path: &Path) -> Vec<IgnoreRule> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Ignore file not readable, no rules loaded");
            return Vec::new();
        }
    };

    BufReader::new(file)
        .lines()
        .map_while(|l| l.ok())
        .filter_map(|l| IgnoreRule::parse_line(&l))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        assert!(IgnoreRule::parse_line("").is_none());
        assert!(IgnoreRule::parse_line("   ").is_none());
        assert!(IgnoreRule::parse_line("# comment").is_none());
    }

    #[test]
    fn test_parse_modifiers() {
        let rule = IgnoreRule::parse_line("!build/").unwrap();
        assert!(rule.is_negated());
        assert!(rule.dir_only);
        assert!(!rule.rooted);
        assert_eq!(rule.pattern(), "build");

        let rooted = IgnoreRule::parse_line("/dist").unwrap();
        assert!(rooted.rooted);
        assert!(!rooted.dir_only);

        let inner_slash = IgnoreRule::parse_line("src/*.tmp").unwrap();
        assert!(inner_slash.rooted);
    }

    #[test]
    fn test_unrooted_matches_any_depth() {
        let rule = IgnoreRule::parse_line("*.log").unwrap();
        assert!(rule.matches("debug.log", false));
        assert!(rule.matches("deep/nested/debug.log", false));
        assert!(!rule.matches("debug.txt", false));
    }

    #[test]
    fn test_rooted_only_matches_from_root() {
        let rule = IgnoreRule::parse_line("/build").unwrap();
        assert!(rule.matches("build", true));
        assert!(rule.matches("build/out.o", false));
        assert!(!rule.matches("sub/build", true));
    }

    #[test]
    fn test_dir_only_does_not_match_plain_file() {
        let rule = IgnoreRule::parse_line("cache/").unwrap();
        assert!(rule.matches("cache", true));
        assert!(!rule.matches("cache", false));
        // Descendants of a matched directory are covered.
        assert!(rule.matches("cache/entry.bin", false));
        assert!(rule.matches("a/cache/entry.bin", false));
    }

    #[test]
    fn test_file_rule_covers_directory_descendants() {
        let rule = IgnoreRule::parse_line("node_modules").unwrap();
        assert!(rule.matches("node_modules", true));
        assert!(rule.matches("node_modules/pkg/index.js", false));
    }

    #[test]
    fn test_double_star_rule() {
        let rule = IgnoreRule::parse_line("docs/**/*.md").unwrap();
        assert!(rule.matches("docs/guide/intro.md", false));
        assert!(rule.matches("docs/a/b/c.md", false));
        assert!(!rule.matches("src/intro.md", false));
    }

    #[test]
    fn test_parse_file_ordering_preserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".gitignore");
        fs::write(&path, "# header\n*.log\n!keep.log\n\nbuild/\n").unwrap();

        let rules = parse_file(&path);
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].pattern(), "*.log");
        assert!(rules[1].is_negated());
        assert!(rules[2].dir_only);
    }

    #[test]
    fn test_parse_file_missing_yields_empty() {
        assert!(parse_file(Path::new("/nonexistent/.gitignore")).is_empty());
    }
}
