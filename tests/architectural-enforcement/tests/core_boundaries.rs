//! Integration Test: Core Boundaries
//!
//! **Policy**:
//! - The core library propagates errors; it never calls `unwrap()`/`expect()`
//!   outside tests.
//! - The core has no UI toolkit dependencies. Views talk to it through
//!   `ViewEvent` and `StudioMessage` only.

use std::fs;
use std::path::Path;

use architectural_enforcement::{report, scan, workspace_root, SourceLine};

const UI_CRATES: &[&str] = &["ratatui", "crossterm", "egui", "iced", "gtk", "tauri"];

fn panic_shortcut(path: &Path, lines: &[SourceLine], idx: usize) -> Option<String> {
    if !path.to_string_lossy().contains("voicemation/core/src") {
        return None;
    }
    let code = &lines[idx].code;
    if code.contains(".unwrap()") || code.contains(".expect(") {
        Some("panicking shortcut in core".to_string())
    } else {
        None
    }
}

#[test]
fn test_no_unwrap_in_core() {
    let violations = scan(panic_shortcut);
    report("unwrap()/expect() found in core production code.", &violations);
}

#[test]
fn test_core_has_no_ui_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("voicemation/core/Cargo.toml"))
        .expect("core manifest readable");

    let found: Vec<String> = manifest
        .lines()
        .filter_map(|line| {
            let name = line.split('=').next()?.trim();
            UI_CRATES.contains(&name).then(|| name.to_string())
        })
        .collect();

    assert!(found.is_empty(), "core depends on UI crates: {found:?}");
}
