//! Best-effort structural checks and code extraction.
//!
//! These are deliberately shallow: per-extension heuristics whose failures
//! become diagnostics attached to the file, never scan aborts. Deep
//! language-specific analysis is out of scope.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// One structural check failure for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Name of the check that produced this entry.
    pub check: String,
    pub message: String,
}

impl Diagnostic {
    fn new(check: &str, message: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            message: message.into(),
        }
    }
}

/// Imports and function signatures extracted from a code file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeInfo {
    pub imports: Vec<String>,
    pub functions: Vec<String>,
}

/// Extensions whose bracket structure is worth checking.
const BRACE_LANGUAGES: &[&str] = &[
    "rs", "js", "ts", "jsx", "tsx", "java", "c", "cpp", "h", "go", "php", "swift", "kt", "scala",
    "css", "json", "py",
];

/// Run every check recognized for `extension` against `content`.
pub fn run_checks(extension: Option<&str>, content: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let Some(ext) = extension else {
        return diagnostics;
    };

    match ext {
        "json" => {
            if let Err(e) = serde_json::from_str::<serde_json::Value>(content) {
                diagnostics.push(Diagnostic::new("json-syntax", e.to_string()));
            }
        }
        "py" => {
            if let Some(d) = check_python_indentation(content) {
                diagnostics.push(d);
            }
            if let Some(d) = check_bracket_balance(content, ext) {
                diagnostics.push(d);
            }
        }
        _ if BRACE_LANGUAGES.contains(&ext) => {
            if let Some(d) = check_bracket_balance(content, ext) {
                diagnostics.push(d);
            }
        }
        _ => {}
    }

    diagnostics
}

/// Flag files that mix tab and space indentation.
fn check_python_indentation(content: &str) -> Option<Diagnostic> {
    let mut tab_lines = 0usize;
    let mut space_lines = 0usize;

    for line in content.lines() {
        if line.starts_with('\t') {
            tab_lines += 1;
        } else if line.starts_with(' ') {
            space_lines += 1;
        }
    }

    if tab_lines > 0 && space_lines > 0 {
        Some(Diagnostic::new(
            "python-indent",
            format!(
                "mixed indentation: {} tab-indented and {} space-indented lines",
                tab_lines, space_lines
            ),
        ))
    } else {
        None
    }
}

/// Check `()[]{}` nesting, skipping string literals and the remainder of a
/// line after `//` or `#`. Heuristic only; unbalanced brackets inside
/// block comments will still be reported.
fn check_bracket_balance(content: &str, extension: &str) -> Option<Diagnostic> {
    // In Rust a single quote usually starts a lifetime, not a string.
    let lifetime_quotes = extension == "rs";
    let mut stack: Vec<(char, usize)> = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let chars: Vec<char> = line.chars().collect();
        let mut in_string: Option<char> = None;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if let Some(quote) = in_string {
                if c == '\\' {
                    i += 1;
                } else if c == quote {
                    in_string = None;
                }
                i += 1;
                continue;
            }

            match c {
                '\'' if lifetime_quotes => {
                    // Only a char literal closes within two characters
                    // (`'x'` or an escape); anything else is a lifetime
                    // and the brackets after it still count.
                    if chars.get(i + 1) == Some(&'\\') || chars.get(i + 2) == Some(&'\'') {
                        in_string = Some('\'');
                    }
                }
                '"' | '\'' | '`' => in_string = Some(c),
                '#' => break,
                '/' if chars.get(i + 1) == Some(&'/') => break,
                '(' | '[' | '{' => stack.push((c, line_no + 1)),
                ')' | ']' | '}' => {
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match stack.pop() {
                        Some((open, _)) if open == expected => {}
                        _ => {
                            return Some(Diagnostic::new(
                                "bracket-balance",
                                format!("unmatched '{}' at line {}", c, line_no + 1),
                            ));
                        }
                    }
                }
                _ => {}
            }
            i += 1;
        }
        // Unterminated string literals reset at end of line; many
        // languages allow apostrophes in comments and prose.
    }

    stack.pop().map(|(open, line)| {
        Diagnostic::new(
            "bracket-balance",
            format!("unclosed '{}' opened at line {}", open, line),
        )
    })
}

static PY_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:from\s+([\w.]+)\s+import|import\s+([\w.]+))").expect("valid regex")
});
static PY_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:async\s+)?def\s+(\w+)\s*\(").expect("valid regex"));
static RS_USE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:pub\s+)?use\s+([\w:]+)").expect("valid regex"));
static RS_FN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:pub(?:\([\w\s:]+\))?\s+)?(?:async\s+)?fn\s+(\w+)").expect("valid regex")
});
static JS_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*import\s+[^;]*?from\s+['"]([^'"]+)['"]"#).expect("valid regex")
});
static JS_FN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:export\s+)?(?:async\s+)?function\s+(\w+)").expect("valid regex")
});
static GO_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^\s*import\s+(?:\w+\s+)?"([^"]+)""#).expect("valid regex"));
static GO_FN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^func\s+(?:\([^)]*\)\s*)?(\w+)\s*\(").expect("valid regex")
});

/// Extract imports and function names for the recognized extensions.
///
/// Unrecognized extensions yield an empty `CodeInfo`.
pub fn extract_code_info(extension: Option<&str>, content: &str) -> CodeInfo {
    let (import_re, fn_re) = match extension {
        Some("py") => (&*PY_IMPORT, &*PY_DEF),
        Some("rs") => (&*RS_USE, &*RS_FN),
        Some("js" | "ts" | "jsx" | "tsx") => (&*JS_IMPORT, &*JS_FN),
        Some("go") => (&*GO_IMPORT, &*GO_FN),
        _ => return CodeInfo::default(),
    };

    let imports = import_re
        .captures_iter(content)
        .filter_map(|c| c.iter().skip(1).flatten().next())
        .map(|m| m.as_str().to_string())
        .collect();
    let functions = fn_re
        .captures_iter(content)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect();

    CodeInfo { imports, functions }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_json_no_diagnostics() {
        assert!(run_checks(Some("json"), r#"{"key": [1, 2, 3]}"#).is_empty());
    }

    #[test]
    fn test_invalid_json_reported() {
        let diagnostics = run_checks(Some("json"), "{broken");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].check, "json-syntax");
    }

    #[test]
    fn test_unknown_extension_no_checks() {
        assert!(run_checks(Some("md"), "# heading [unclosed").is_empty());
        assert!(run_checks(None, "{{{{").is_empty());
    }

    #[test]
    fn test_balanced_brackets_pass() {
        let src = "fn main() {\n    let v = vec![1, 2];\n}\n";
        assert!(run_checks(Some("rs"), src).is_empty());
    }

    #[test]
    fn test_unclosed_bracket_reported() {
        let diagnostics = run_checks(Some("rs"), "fn main() {\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].check, "bracket-balance");
        assert!(diagnostics[0].message.contains("unclosed '{'"));
    }

    #[test]
    fn test_unmatched_closer_reported() {
        let diagnostics = run_checks(Some("c"), "int main() { return 0; }}\n");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("unmatched '}'"));
    }

    #[test]
    fn test_brackets_in_strings_ignored() {
        let src = "let s = \"unclosed { in string\";\n";
        assert!(run_checks(Some("rs"), src).is_empty());
    }

    #[test]
    fn test_rust_lifetimes_are_not_strings() {
        let src = "fn first<'a>(items: &'a [String]) -> &'a str {\n    &items[0]\n}\n";
        assert!(run_checks(Some("rs"), src).is_empty());
    }

    #[test]
    fn test_rust_char_literal_brackets_ignored() {
        let src = "fn f() {\n    let open = '(';\n    let nl = '\\n';\n}\n";
        assert!(run_checks(Some("rs"), src).is_empty());
    }

    #[test]
    fn test_brackets_in_line_comments_ignored() {
        assert!(run_checks(Some("rs"), "// { not real\nfn f() {}\n").is_empty());
        assert!(run_checks(Some("py"), "# { not real\nx = 1\n").is_empty());
    }

    #[test]
    fn test_python_mixed_indentation() {
        let src = "def a():\n\treturn 1\n\ndef b():\n    return 2\n";
        let diagnostics = run_checks(Some("py"), src);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].check, "python-indent");
    }

    #[test]
    fn test_python_consistent_indentation_ok() {
        let src = "def a():\n    return 1\n";
        assert!(run_checks(Some("py"), src).is_empty());
    }

    #[test]
    fn test_extract_python_imports_and_defs() {
        let src = "import os\nfrom pathlib import Path\n\nasync def fetch():\n    pass\n\ndef main():\n    pass\n";
        let info = extract_code_info(Some("py"), src);
        assert_eq!(info.imports, vec!["os", "pathlib"]);
        assert_eq!(info.functions, vec!["fetch", "main"]);
    }

    #[test]
    fn test_extract_rust() {
        let src = "use std::path::Path;\npub use crate::error;\n\npub fn run() {}\nasync fn helper() {}\n";
        let info = extract_code_info(Some("rs"), src);
        assert_eq!(info.imports, vec!["std::path::Path", "crate::error"]);
        assert_eq!(info.functions, vec!["run", "helper"]);
    }

    #[test]
    fn test_extract_javascript() {
        let src = "import { thing } from 'lib';\nexport async function handler() {}\n";
        let info = extract_code_info(Some("ts"), src);
        assert_eq!(info.imports, vec!["lib"]);
        assert_eq!(info.functions, vec!["handler"]);
    }

    #[test]
    fn test_extract_unknown_extension_empty() {
        let info = extract_code_info(Some("md"), "import nothing");
        assert_eq!(info, CodeInfo::default());
    }
}
