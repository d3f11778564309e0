//! Architectural Enforcement Integration Tests
//!
//! Source-scanning checks that enforce the workspace's architectural rules:
//! - No thread sleeps: every wait goes through `tokio::time`
//! - No blocking I/O inside async functions
//! - No process-wide mutable singletons in the core
//!
//! The scanner is line based. It skips comments and everything from a file's
//! `#[cfg(test)]` module onward, and it attributes each line to the closest
//! preceding function signature.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Production source trees scanned by every check, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["glitchterm/core/src", "glitchterm/host/src"];

/// Kind of the function a line belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FnKind {
    /// Plain `fn`
    Sync,
    /// `async fn`
    Async,
}

/// A rule violation at one source line
#[derive(Clone, Debug)]
pub struct Violation {
    /// File containing the violation
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// What rule was broken
    pub message: String,
    /// The offending line, trimmed
    pub code: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} - {}: {}",
            self.path.display(),
            self.line,
            self.message,
            self.code
        )
    }
}

/// A Rust source file split into lines
#[derive(Clone, Debug)]
pub struct SourceFile {
    path: PathBuf,
    lines: Vec<String>,
    test_start: Option<usize>,
}

impl SourceFile {
    /// Build from in-memory source text
    pub fn from_source(path: impl Into<PathBuf>, source: &str) -> Self {
        let lines: Vec<String> = source.lines().map(str::to_string).collect();
        let test_start = lines.iter().position(|l| l.trim() == "#[cfg(test)]");
        Self {
            path: path.into(),
            lines,
            test_start,
        }
    }

    /// Read a file from disk
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let source = fs::read_to_string(path)?;
        Ok(Self::from_source(path, &source))
    }

    /// Path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Non-test lines with comments stripped, as `(index, code)`
    pub fn production_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        let end = self.test_start.unwrap_or(self.lines.len());
        self.lines[..end]
            .iter()
            .enumerate()
            .map(|(idx, line)| (idx, code_part(line)))
            .filter(|(_, code)| !code.trim().is_empty())
    }

    /// Kind of the closest function signature at or above `idx`
    pub fn enclosing_fn(&self, idx: usize) -> Option<FnKind> {
        self.lines[..=idx.min(self.lines.len().saturating_sub(1))]
            .iter()
            .rev()
            .find_map(|line| fn_signature(line))
    }

    /// Record a violation at `idx`
    pub fn violation(&self, idx: usize, message: &str) -> Violation {
        Violation {
            path: self.path.clone(),
            line: idx + 1,
            message: message.to_string(),
            code: self.lines[idx].trim().to_string(),
        }
    }
}

/// The line with any `//` comment removed
///
/// `//` inside a string or char literal is code, so URLs survive. Literals
/// spanning several lines are not tracked.
pub fn code_part(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_string => i += 1,
            b'"' => in_string = !in_string,
            b'\'' if !in_string => {
                // '"' and '\'' must not open a string
                if bytes.get(i + 2) == Some(&b'\'') {
                    i += 2;
                } else if bytes.get(i + 1) == Some(&b'\\') && bytes.get(i + 3) == Some(&b'\'') {
                    i += 3;
                }
            }
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => return &line[..i],
            _ => {}
        }
        i += 1;
    }
    line
}

/// Whether a line opens a function, and which kind
pub fn fn_signature(line: &str) -> Option<FnKind> {
    let mut rest = line.trim_start();
    for prefix in ["pub(crate) ", "pub(super) ", "pub ", "const ", "unsafe "] {
        rest = rest.strip_prefix(prefix).unwrap_or(rest);
    }
    if rest.starts_with("async fn ") {
        Some(FnKind::Async)
    } else if rest.starts_with("fn ") {
        Some(FnKind::Sync)
    } else {
        None
    }
}

/// Workspace root, independent of the test's working directory
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

/// Every `.rs` file under a workspace-relative directory
pub fn rust_sources(dir: &str) -> Vec<SourceFile> {
    let root = workspace_root().join(dir);
    if !root.exists() {
        return Vec::new();
    }
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .filter_map(|e| SourceFile::read(e.path()).ok())
        .collect()
}

/// All production sources
pub fn production_sources() -> Vec<SourceFile> {
    PRODUCTION_DIRS
        .iter()
        .flat_map(|dir| rust_sources(dir))
        .collect()
}

/// Panic with a readable report if there are violations
pub fn assert_no_violations(title: &str, violations: &[Violation], guidance: &[&str]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n❌ CRITICAL: {title}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    eprintln!();
    for line in guidance {
        eprintln!("  {line}");
    }

    panic!(
        "\nFound {} violation(s): {title}.\nFix these before merging!",
        violations.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
use std::fs;

pub fn load() {
    let _ = std::fs::read_to_string(PATH); // fine, sync
}

pub async fn run() {
    let x = 1; // std::fs::read in a comment
}

#[cfg(test)]
mod tests {
    async fn helper() {}
}
";

    #[test]
    fn test_code_part_keeps_urls_in_literals() {
        assert_eq!(code_part("let x = 1; // note"), "let x = 1; ");
        assert_eq!(
            code_part(r#"item("A", "https://example.com"); std::fs::read(p); // done"#),
            r#"item("A", "https://example.com"); std::fs::read(p); "#
        );
        assert_eq!(code_part(r#"let s = "a \" // b"; // c"#), r#"let s = "a \" // b"; "#);
        assert_eq!(code_part(r#"if ch == '"' { x } // q"#), r#"if ch == '"' { x } "#);
        assert_eq!(code_part("let q = '\\''; // q"), "let q = '\\''; ");
        assert_eq!(code_part("fn f<'a>(s: &'a str) // l"), "fn f<'a>(s: &'a str) ");
    }

    #[test]
    fn test_url_line_is_still_scanned() {
        let source = "pub async fn run() {\n    let _ = (\"https://x.io\", std::fs::read(P));\n}\n";
        let file = SourceFile::from_source("url.rs", source);
        assert!(file
            .production_lines()
            .any(|(_, code)| code.contains("std::fs::read(")));
    }

    #[test]
    fn test_fn_signature() {
        assert_eq!(fn_signature("    pub async fn run(&self) {"), Some(FnKind::Async));
        assert_eq!(fn_signature("pub(crate) fn owned() {"), Some(FnKind::Sync));
        assert_eq!(fn_signature("    pub const fn plain(ch: char) -> Self {"), Some(FnKind::Sync));
        assert_eq!(fn_signature("let f = async move {"), None);
        assert_eq!(fn_signature("// fn commented"), None);
    }

    #[test]
    fn test_production_lines_skip_tests_and_comments() {
        let file = SourceFile::from_source("sample.rs", SAMPLE);
        let lines: Vec<(usize, &str)> = file.production_lines().collect();

        assert!(lines.iter().all(|(_, code)| !code.contains("helper")));
        assert!(lines
            .iter()
            .all(|(_, code)| !code.contains("std::fs::read(")));
    }

    #[test]
    fn test_enclosing_fn() {
        let file = SourceFile::from_source("sample.rs", SAMPLE);
        let (load_body, _) = file
            .production_lines()
            .find(|(_, code)| code.contains("read_to_string"))
            .unwrap();
        assert_eq!(file.enclosing_fn(load_body), Some(FnKind::Sync));

        let (run_body, _) = file
            .production_lines()
            .find(|(_, code)| code.contains("let x"))
            .unwrap();
        assert_eq!(file.enclosing_fn(run_body), Some(FnKind::Async));
        assert_eq!(file.enclosing_fn(0), None);
    }

    #[test]
    fn test_workspace_root_contains_core() {
        assert!(workspace_root().join("glitchterm/core/src/lib.rs").exists());
        assert!(!production_sources().is_empty());
    }
}
