//! Integration Test: Sleep Prohibition
//!
//! **Policy**: production code never blocks a thread to wait. Delays (status
//! display, highlight settle/expiry, recording auto-stop) are `tokio::time::sleep`
//! calls inside their own spawned task, so the studio loop keeps running.
//! Periodic work uses `tokio::time::interval`.

use std::path::Path;

use architectural_enforcement::{report, scan, SourceLine};

/// How far above a sleep the enclosing `tokio::spawn` may be
const SPAWN_WINDOW: usize = 5;

fn sleep_violation(_path: &Path, lines: &[SourceLine], idx: usize) -> Option<String> {
    let code = &lines[idx].code;

    if code.contains("thread::sleep") {
        return Some("blocking sleep".to_string());
    }

    if code.contains("::sleep(") {
        let start = idx.saturating_sub(SPAWN_WINDOW);
        let spawned = lines[start..idx]
            .iter()
            .any(|line| line.code.contains("tokio::spawn"));
        if !spawned {
            return Some("sleep outside a spawned timer task".to_string());
        }
    }

    None
}

#[test]
fn test_no_sleep_in_event_loop() {
    let violations = scan(sleep_violation);
    report(
        "Sleep calls found outside spawned timer tasks. Use a spawned timer that reports back through a signal channel.",
        &violations,
    );
}

#[test]
fn test_detector_flags_inline_sleep() {
    let lines: Vec<SourceLine> = [
        "async fn handle(&mut self) {",
        "    tokio::time::sleep(Duration::from_secs(2)).await;",
        "}",
    ]
    .iter()
    .enumerate()
    .map(|(i, code)| SourceLine {
        number: i + 1,
        code: (*code).to_string(),
    })
    .collect();

    assert!(sleep_violation(Path::new("x.rs"), &lines, 1).is_some());
}

#[test]
fn test_detector_allows_spawned_timer() {
    let lines: Vec<SourceLine> = [
        "let signals = self.signals.clone();",
        "self.timer = Some(tokio::spawn(async move {",
        "    tokio::time::sleep(delay).await;",
        "    let _ = signals.send(signal);",
        "}));",
    ]
    .iter()
    .enumerate()
    .map(|(i, code)| SourceLine {
        number: i + 1,
        code: (*code).to_string(),
    })
    .collect();

    assert!(sleep_violation(Path::new("x.rs"), &lines, 2).is_none());
}
