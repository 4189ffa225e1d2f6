//! Shared test helpers for workspace crates.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Resolve the workspace root path.
pub fn workspace_root() -> PathBuf {
	let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
	manifest_dir.join("..").join("..").canonicalize().unwrap_or_else(|_| manifest_dir.join("..").join(".."))
}

/// Resolve a fixture path under `<workspace>/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
	workspace_root().join("fixtures").join(name)
}

/// Run `binary` with `args` and parse its stdout as JSON, asserting success.
pub fn run_json(binary: &str, args: &[String]) -> serde_json::Value {
	let output = Command::new(binary).args(args).output().expect("command executes");
	assert!(output.status.success(), "command should succeed: {}", String::from_utf8_lossy(&output.stderr));
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

/// Run `binary` with `args` expecting failure; returns stderr.
pub fn run_failure(binary: &str, args: &[String]) -> String {
	let output = Command::new(binary).args(args).output().expect("command executes");
	assert!(!output.status.success(), "command should fail");
	String::from_utf8_lossy(&output.stderr).into_owned()
}
