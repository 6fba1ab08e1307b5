//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: production code uses `tokio::fs`, `tokio::io` and async
//! `reqwest`, never `std::fs`, `std::net` or `reqwest::blocking`.

use std::path::Path;

use architectural_enforcement::{report, scan, SourceLine};

const FORBIDDEN: &[(&str, &str)] = &[
    ("std::fs", "blocking file I/O"),
    ("std::net", "blocking network I/O"),
    ("std::process::Command", "blocking process I/O"),
    ("reqwest::blocking", "blocking HTTP client"),
    ("std::io::stdin()", "blocking stdin"),
];

fn blocking_io_violation(_path: &Path, lines: &[SourceLine], idx: usize) -> Option<String> {
    let code = &lines[idx].code;
    FORBIDDEN
        .iter()
        .find(|(pattern, _)| code.contains(pattern))
        .map(|(_, problem)| (*problem).to_string())
}

#[test]
fn test_no_blocking_io_in_production_code() {
    let violations = scan(blocking_io_violation);
    report("Blocking I/O found in production code.", &violations);
}
