//! Minimal glob matching over path segments.
//!
//! Supports `*` and `?` within a segment and `**` spanning any number of
//! segments, which covers the pattern language of ignore rules and config
//! exclusions.

/// Match a pattern against a path, both pre-split into `/` segments.
///
/// `**` matches zero or more whole segments; `*` and `?` never cross a
/// segment boundary.
pub(crate) fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.first() {
        None => path.is_empty(),
        Some(&"**") => {
            if match_segments(&pattern[1..], path) {
                return true;
            }
            !path.is_empty() && match_segments(pattern, &path[1..])
        }
        Some(seg) => match path.first() {
            Some(name) => {
                match_segment(seg, name) && match_segments(&pattern[1..], &path[1..])
            }
            None => false,
        },
    }
}

/// Wildcard match of a single segment (`*`, `?`, literals).
pub(crate) fn match_segment(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let s: Vec<char> = name.chars().collect();

    let mut pi = 0;
    let mut si = 0;
    // Last `*` position and the path index it was tried at, for backtracking.
    let mut star: Option<(usize, usize)> = None;

    while si < s.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == s[si]) {
            pi += 1;
            si += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, si));
            pi += 1;
        } else if let Some((star_pi, star_si)) = star {
            pi = star_pi + 1;
            si = star_si + 1;
            star = Some((star_pi, star_si + 1));
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, path: &str) -> bool {
        let p: Vec<&str> = pattern.split('/').collect();
        let s: Vec<&str> = path.split('/').collect();
        match_segments(&p, &s)
    }

    #[test]
    fn test_literal_segment() {
        assert!(match_segment("main.rs", "main.rs"));
        assert!(!match_segment("main.rs", "main.go"));
    }

    #[test]
    fn test_star_within_segment() {
        assert!(match_segment("*.pyc", "module.pyc"));
        assert!(match_segment("*", "anything"));
        assert!(match_segment("test_*", "test_walker"));
        assert!(!match_segment("*.pyc", "module.py"));
    }

    #[test]
    fn test_question_mark() {
        assert!(match_segment("file?.txt", "file1.txt"));
        assert!(!match_segment("file?.txt", "file10.txt"));
    }

    #[test]
    fn test_multiple_stars() {
        assert!(match_segment("a*b*c", "aXXbYYc"));
        assert!(!match_segment("a*b*c", "acb"));
    }

    #[test]
    fn test_star_does_not_cross_segments() {
        assert!(!matches("src/*.rs", "src/nested/main.rs"));
        assert!(matches("src/*.rs", "src/main.rs"));
    }

    #[test]
    fn test_double_star_spans_segments() {
        assert!(matches("**/*.rs", "src/nested/main.rs"));
        assert!(matches("**/*.rs", "main.rs"));
        assert!(matches("src/**", "src/a/b/c"));
        assert!(matches("src/**/test.rs", "src/test.rs"));
        assert!(matches("src/**/test.rs", "src/a/b/test.rs"));
    }

    #[test]
    fn test_empty_path() {
        assert!(matches("**", ""));
        assert!(!matches("a", ""));
    }
}
