//! Architectural Enforcement
//!
//! Source-scanning checks that keep the studio's production code honest:
//! - No blocking sleeps; delays run as spawned timer tasks
//! - No blocking I/O inside the async core
//! - No panicking shortcuts in the core library
//! - No UI toolkit dependencies in the core
//!
//! The scanners work on plain text. Everything from the first `#[cfg(test)]`
//! in a file onwards counts as test code and is skipped.

use std::fs;
use std::path::{Path, PathBuf};

/// Source directories of the production crates, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["voicemation/core/src", "voicemation/cli/src"];

/// Workspace root, derived from this package's location
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// All `.rs` files below `dir` (relative to the workspace root)
pub fn rust_sources(dir: &str) -> Vec<PathBuf> {
    let root = workspace_root().join(dir);
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect()
}

/// A line of production code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number
    pub number: usize,
    /// Line text with any `//` comment removed
    pub code: String,
}

/// Production lines of a source file: comments stripped, test module dropped
pub fn production_lines(content: &str) -> Vec<SourceLine> {
    content
        .lines()
        .take_while(|line| line.trim() != "#[cfg(test)]")
        .enumerate()
        .map(|(idx, line)| SourceLine {
            number: idx + 1,
            code: line.split("//").next().unwrap_or(line).to_string(),
        })
        .collect()
}

/// Run `check` on every production line of every production crate
///
/// `check` gets the file path, all of the file's production lines and the
/// index of the current line, and returns a description for a violation.
pub fn scan<F>(check: F) -> Vec<String>
where
    F: Fn(&Path, &[SourceLine], usize) -> Option<String>,
{
    let mut violations = Vec::new();

    for dir in PRODUCTION_DIRS {
        for path in rust_sources(dir) {
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            let lines = production_lines(&content);
            for idx in 0..lines.len() {
                if let Some(problem) = check(&path, &lines, idx) {
                    violations.push(format!(
                        "{}:{} - {}: {}",
                        path.display(),
                        lines[idx].number,
                        problem,
                        lines[idx].code.trim()
                    ));
                }
            }
        }
    }

    violations
}

/// Panic with a readable report if there are violations
pub fn report(title: &str, violations: &[String]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n{title}\n");
    for violation in violations {
        eprintln!("  {violation}");
    }
    panic!("\nFound {} violation(s).", violations.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let source = "fn a() {}\n// note\nlet x = 1; // trailing\n#[cfg(test)]\nmod tests {}\n";
        let lines = production_lines(source);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].code, "");
        assert_eq!(lines[2].code.trim(), "let x = 1;");
        assert_eq!(lines[2].number, 3);
    }

    #[test]
    fn test_production_sources_exist() {
        for dir in PRODUCTION_DIRS {
            assert!(!rust_sources(dir).is_empty(), "no sources found in {dir}");
        }
    }
}
