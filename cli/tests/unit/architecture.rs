//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layer boundaries hold:
//! `domain` is pure, `application` talks to the outside only through ports,
//! and `infra` never reaches up into presentation code.

use std::path::Path;

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.contains("#[cfg(test)]") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

/// Collect `forbidden` hits in non-comment lines of every file under `dir`.
fn scan_for(dir: &Path, forbidden: &[&str], skip_tests: bool) -> Vec<String> {
    let mut violations = Vec::new();
    for file in collect_rs_files(dir) {
        let rel = file
            .strip_prefix(env!("CARGO_MANIFEST_DIR"))
            .unwrap_or(&file)
            .display()
            .to_string();
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        let mut tracker = CfgTestTracker::new();
        for (i, line) in content.lines().enumerate() {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            if (skip_tests && in_test) || trimmed.starts_with("//") {
                continue;
            }
            for pattern in forbidden {
                if line.contains(pattern) {
                    violations.push(format!("{rel}:{}: `{pattern}`: {line}", i + 1));
                }
            }
        }
    }
    violations
}

fn src_dir(layer: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(layer)
}

// ── Domain purity ─────────────────────────────────────────────────────────────

#[test]
fn domain_has_no_io_or_outer_layer_imports() {
    let violations = scan_for(
        &src_dir("domain"),
        &[
            "tokio",
            "std::fs",
            "std::process",
            "std::net",
            "crate::application",
            "crate::infra",
            "crate::commands",
            "crate::output",
        ],
        false,
    );
    assert!(
        violations.is_empty(),
        "domain/ must stay free of I/O and outer layers:\n{}",
        violations.join("\n")
    );
}

// ── Application layer boundary ────────────────────────────────────────────────

/// application/ must not import from infra/, commands/, or output/ layers.
#[test]
fn application_has_no_infra_or_output_imports() {
    let violations = scan_for(
        &src_dir("application"),
        &["crate::infra", "crate::output", "crate::commands"],
        false,
    );
    assert!(
        violations.is_empty(),
        "application/ must not import from infra/, commands/, or output/:\n{}",
        violations.join("\n")
    );
}

/// Services reach processes only through the `Executor` port.
#[test]
fn application_spawns_no_processes() {
    let violations = scan_for(
        &src_dir("application"),
        &["tokio::process", "std::process::Command"],
        true,
    );
    assert!(
        violations.is_empty(),
        "application/ must run commands through the Executor port:\n{}",
        violations.join("\n")
    );
}

// ── Infra layer boundary ──────────────────────────────────────────────────────

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let violations = scan_for(&src_dir("infra"), &["crate::commands", "crate::output"], false);
    assert!(
        violations.is_empty(),
        "infra/ must not import from commands/ or output/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_print_macros_outside_tests() {
    let violations = scan_for(&src_dir("infra"), &["println!", "eprintln!"], true);
    assert!(
        violations.is_empty(),
        "infra/ must not use println!/eprintln! outside #[cfg(test)]:\n{}",
        violations.join("\n")
    );
}

// ── Panics ────────────────────────────────────────────────────────────────────

#[test]
fn no_unwrap_or_expect_outside_tests() {
    let violations = scan_for(
        &Path::new(env!("CARGO_MANIFEST_DIR")).join("src"),
        &[".unwrap()", ".expect("],
        true,
    );
    assert!(
        violations.is_empty(),
        "errors must be propagated, not unwrapped:\n{}",
        violations.join("\n")
    );
}

#[test]
fn no_module_level_dead_code_allows_in_layers() {
    let mut violations = Vec::new();
    for layer in ["domain", "application", "infra"] {
        violations.extend(scan_for(&src_dir(layer), &["#![allow(dead_code)]"], false));
    }
    assert!(
        violations.is_empty(),
        "module-level dead_code allows hide unused code:\n{}",
        violations.join("\n")
    );
}
