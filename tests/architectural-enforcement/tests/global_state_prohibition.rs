//! Integration Test: Global State Prohibition
//!
//! **Policy**: The core keeps no process-wide mutable state.
//! Screens, engines and interpreters are explicit instances that own
//! shared handles, so several terminals can run side by side in one
//! process (and in parallel tests) without interfering.

use architectural_enforcement::{assert_no_violations, rust_sources, Violation};

const GLOBAL_STATE: &[(&str, &str)] = &[
    ("static mut ", "Mutable static"),
    ("lazy_static!", "Lazily initialized global"),
    ("OnceLock", "Lazily initialized global"),
    ("OnceCell", "Lazily initialized global"),
    ("thread_local!", "Thread-local global"),
    ("thread_rng()", "Ambient random source; inject a RandomSource"),
];

/// Test that the core library declares no global mutable state
#[test]
fn test_no_global_state_in_core() {
    let mut violations: Vec<Violation> = Vec::new();

    for file in rust_sources("glitchterm/core/src") {
        for (idx, code) in file.production_lines() {
            for (pattern, message) in GLOBAL_STATE {
                if code.contains(pattern) {
                    violations.push(file.violation(idx, message));
                }
            }
        }
    }

    assert_no_violations(
        "Process-wide mutable state found in the core",
        &violations,
        &[
            "✅ REQUIRED: state lives in AnimationEngine / CommandInterpreter / Screen instances",
            "✅ REQUIRED: randomness comes from an injected SharedRandom",
        ],
    );
}
