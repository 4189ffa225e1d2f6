use std::path::PathBuf;

use pvbridge::data::ValueError;
use thiserror::Error;

/// Failures surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
	/// An input file could not be read.
	#[error("failed to read {path}: {source}")]
	Io {
		/// File that failed.
		path: PathBuf,
		/// Underlying IO error.
		#[source]
		source: std::io::Error,
	},
	/// An input file is not valid JSON.
	#[error("invalid JSON in {path}: {source}")]
	Json {
		/// File that failed.
		path: PathBuf,
		/// Parser error.
		#[source]
		source: serde_json::Error,
	},
	/// A type descriptor is malformed.
	#[error("invalid type descriptor: {reason}")]
	Descriptor {
		/// Why the descriptor was rejected.
		reason: String,
	},
	/// A `PATH=...` argument has no `=`.
	#[error("expected PATH=VALUE, got {argument}")]
	Assignment {
		/// Raw argument.
		argument: String,
	},
	/// The right-hand side of a `--set` argument is not valid JSON.
	#[error("invalid JSON in --set {argument}: {source}")]
	AssignmentJson {
		/// Raw argument.
		argument: String,
		/// Parser error.
		#[source]
		source: serde_json::Error,
	},
	/// No field type can represent the input.
	#[error("no field type for {got}")]
	Untyped {
		/// Dynamic type name of the input.
		got: &'static str,
	},
	/// The value container rejected an operation.
	#[error(transparent)]
	Value(#[from] ValueError),
}

impl CliError {
	pub(crate) fn descriptor(reason: impl Into<String>) -> Self {
		Self::Descriptor { reason: reason.into() }
	}
}

/// Result alias for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;
