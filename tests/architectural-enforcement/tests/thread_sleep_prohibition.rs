//! Integration Test: Thread Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT block a thread to wait.
//! Every delay in the terminal (typing ticks, line delays, crash grace,
//! reveal pauses) is a `tokio::time` timer, so a paused test clock can
//! drive it deterministically. A `std::thread::sleep` would stall the
//! runtime and make those timings untestable.

use architectural_enforcement::{assert_no_violations, production_sources, Violation};

/// Test that production code never calls `thread::sleep`
#[test]
fn test_no_thread_sleep_in_production_code() {
    let mut violations: Vec<Violation> = Vec::new();

    for file in production_sources() {
        for (idx, code) in file.production_lines() {
            if code.contains("thread::sleep") || code.contains("use std::thread") {
                violations.push(file.violation(idx, "Blocking thread sleep"));
            }
        }
    }

    assert_no_violations(
        "Thread sleeps found in production code",
        &violations,
        &[
            "✅ REQUIRED: tokio::time::sleep(..).await or tokio::time::interval",
            "❌ FORBIDDEN: std::thread::sleep anywhere outside tests",
        ],
    );
}

/// Test that timers are only created through tokio
#[test]
fn test_no_std_timer_loops_in_core() {
    let mut violations: Vec<Violation> = Vec::new();

    for file in production_sources() {
        for (idx, code) in file.production_lines() {
            if code.contains("std::time::Instant") || code.contains("SystemTime::now") {
                violations.push(file.violation(idx, "Wall-clock timing bypasses the tokio clock"));
            }
        }
    }

    assert_no_violations(
        "Wall-clock timers found in production code",
        &violations,
        &["✅ REQUIRED: tokio::time::Instant so paused test clocks apply"],
    );
}
