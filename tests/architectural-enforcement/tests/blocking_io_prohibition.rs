//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Async functions MUST NOT perform blocking I/O.
//! **Required**: `tokio::fs`, `tokio::io::stdin`, `tokio::io::stdout` in async code.
//!
//! Blocking calls are acceptable in non-async functions (configuration
//! loading before the terminal starts, renderer buffers) and in tests.

use architectural_enforcement::{
    assert_no_violations, production_sources, FnKind, SourceFile, Violation,
};

const BLOCKING_CALLS: &[(&str, &str)] = &[
    ("std::fs::", "Blocking file I/O"),
    ("std::net::", "Blocking network I/O"),
    ("std::process::Command", "Blocking process I/O"),
    ("std::io::stdin()", "Blocking stdin"),
    ("std::io::stdout()", "Blocking stdout"),
    ("reqwest::blocking", "Blocking HTTP client"),
];

fn check_file(file: &SourceFile, violations: &mut Vec<Violation>) {
    for (idx, code) in file.production_lines() {
        if file.enclosing_fn(idx) != Some(FnKind::Async) {
            continue;
        }
        for (pattern, message) in BLOCKING_CALLS {
            if code.contains(pattern) {
                violations.push(file.violation(idx, message));
            }
        }
    }
}

/// Test that async production code does not use blocking I/O
#[test]
fn test_no_blocking_io_in_async_functions() {
    let mut violations = Vec::new();
    for file in production_sources() {
        check_file(&file, &mut violations);
    }

    assert_no_violations(
        "Blocking I/O calls found in async functions",
        &violations,
        &[
            "❌ FORBIDDEN in async fn: std::fs, std::net, std::process::Command, std::io::stdin/stdout",
            "✅ REQUIRED: tokio::fs::read_to_string(..).await, tokio::io::stdout()",
            "✅ ACCEPTABLE: non-async functions and test code",
        ],
    );
}

/// The checker itself flags blocking calls in async bodies only
#[test]
fn test_checker_catches_async_blocking_read() {
    let source = r#"
pub fn sync_load() {
    let _ = std::fs::read_to_string("a");
}

pub async fn async_load() {
    let _ = std::fs::read_to_string("b");
}
"#;
    let file = SourceFile::from_source("fixture.rs", source);
    let mut violations = Vec::new();
    check_file(&file, &mut violations);

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].line, 7);
}
