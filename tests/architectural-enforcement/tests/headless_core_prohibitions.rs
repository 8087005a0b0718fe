//! Integration Test: Headless Core Prohibitions
//!
//! `hud-core` is a per-frame collaborator of a game loop. Its contract
//! with the host:
//!
//! **Policy**: the coordinator never reads the clock; every time-based
//! decision takes `now` as a parameter so tests can replay any moment.
//! **Policy**: the coordinator is synchronous and single-threaded; no
//! threads, no async runtime, no locks. Sharing is `Rc<RefCell<_>>`.
//!
//! The checks scan the crate's source text, so a violation fails the
//! suite before review. Test code (the `#[cfg(test)]` tail of each
//! module) is exempt.

use std::fs;
use std::path::{Path, PathBuf};

/// Test that production code never samples a clock itself
#[test]
fn test_core_never_reads_the_clock() {
    let violations = scan_core(&[
        ("Instant::now", "clock read; take `now` as a parameter"),
        ("SystemTime::now", "clock read; take `now` as a parameter"),
    ]);

    if !violations.is_empty() {
        eprintln!("\nClock reads found in hud-core production code!\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nThe host samples the clock once per frame and passes it in.");
        eprintln!("Injected time is what lets the tests replay fades and expiries.");

        panic!(
            "\nFound {} clock read(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

/// Test that production code stays synchronous and single-threaded
#[test]
fn test_core_stays_single_threaded() {
    let violations = scan_core(&[
        ("std::thread", "thread use in a single-threaded crate"),
        ("tokio::", "async runtime in a synchronous crate"),
        ("async fn", "async surface in a synchronous crate"),
        ("Mutex<", "lock in a single-threaded crate; use RefCell"),
        ("RwLock<", "lock in a single-threaded crate; use RefCell"),
    ]);

    if !violations.is_empty() {
        eprintln!("\nConcurrency primitives found in hud-core production code!\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nThe coordinator runs inside the frame loop on one thread;");
        eprintln!("surfaces own the runtime. Sharing goes through Rc<RefCell<_>>.");

        panic!(
            "\nFound {} concurrency violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

fn core_src() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../hud/core/src")
}

/// Scan every source file of hud-core for the given patterns
fn scan_core(patterns: &[(&str, &str)]) -> Vec<String> {
    let root = core_src();
    assert!(
        root.exists(),
        "hud-core sources not found at {}",
        root.display()
    );

    let mut violations = Vec::new();
    for entry in walkdir::WalkDir::new(&root)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.path().extension().and_then(|s| s.to_str()) == Some("rs") {
            check_file(entry.path(), patterns, &mut violations);
        }
    }
    violations
}

fn check_file(path: &Path, patterns: &[(&str, &str)], violations: &mut Vec<String>) {
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };

    let lines: Vec<&str> = content.lines().collect();
    let boundary = test_boundary(&lines);

    for (idx, line) in lines.iter().enumerate().take(boundary) {
        // Skip comments
        let code_part = line.split("//").next().unwrap_or(line);

        for (pattern, why) in patterns {
            if code_part.contains(pattern) {
                violations.push(format!(
                    "{}:{} - {}: {}",
                    path.display(),
                    idx + 1,
                    why,
                    line.trim()
                ));
            }
        }
    }
}

/// Index of the first line of the `#[cfg(test)]` tail, or the file
/// length if there is none. Everything after it is test code.
fn test_boundary(lines: &[&str]) -> usize {
    lines
        .iter()
        .position(|line| line.trim() == "#[cfg(test)]")
        .unwrap_or(lines.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_detection() {
        let code = vec!["fn real() {}", "#[cfg(test)]", "mod tests {", "}"];
        assert_eq!(test_boundary(&code), 1, "tail starts at the attribute");

        let no_tests = vec!["fn real() {}", "fn other() {}"];
        assert_eq!(
            test_boundary(&no_tests),
            no_tests.len(),
            "no tail means the whole file is production code"
        );
    }

    #[test]
    fn test_comments_do_not_trip_the_scan() {
        let line = "    // the host calls Instant::now() for us";
        let code_part = line.split("//").next().unwrap_or(line);
        assert!(!code_part.contains("Instant::now"));
    }
}
