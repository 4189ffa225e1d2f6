use std::path::Path;

use serde::Serialize;

use crate::cmd::error::{CliError, Result};

/// Read and parse a JSON document from `path`.
pub fn read_json(path: &Path) -> Result<serde_json::Value> {
	let bytes = std::fs::read(path).map_err(|source| CliError::Io {
		path: path.to_path_buf(),
		source,
	})?;
	serde_json::from_slice(&bytes).map_err(|source| CliError::Json {
		path: path.to_path_buf(),
		source,
	})
}

/// Split a `PATH=VALUE` argument at the first `=`.
pub fn split_assignment(argument: &str) -> Result<(&str, &str)> {
	argument.split_once('=').ok_or_else(|| CliError::Assignment {
		argument: argument.to_owned(),
	})
}

/// Print `payload` as pretty JSON on stdout.
pub fn emit_json<T: Serialize>(payload: &T) {
	match serde_json::to_string_pretty(payload) {
		Ok(text) => println!("{text}"),
		Err(err) => eprintln!("error: failed to encode json: {err}"),
	}
}
