use std::path::PathBuf;

use pvbridge::data::{Dynamic, Value, ValueOptions};
use tracing::debug;

use crate::cmd::error::{CliError, Result};
use crate::cmd::json::{from_dynamic, parse_struct, to_dynamic};
use crate::cmd::util::{emit_json, read_json, split_assignment};

#[derive(clap::Args)]
pub struct Args {
	/// Type descriptor file.
	pub type_path: PathBuf,
	/// Initial value file, assigned to the whole structure.
	#[arg(long)]
	pub value: Option<PathBuf>,
	/// Select a union member before assignments run; an empty member clears.
	#[arg(long = "select", value_name = "PATH=MEMBER")]
	pub selects: Vec<String>,
	/// Assign a JSON value to a dotted field path.
	#[arg(long = "set", value_name = "PATH=JSON")]
	pub sets: Vec<String>,
	/// Storage without union clearing.
	#[arg(long = "legacy-storage")]
	pub legacy_storage: bool,
	/// Override the nesting limit.
	#[arg(long = "max-depth")]
	pub max_depth: Option<u32>,
	/// Reject mappings stored into variant unions instead of inferring structures.
	#[arg(long = "flat-maps")]
	pub flat_maps: bool,
}

/// Build a value, apply selections and assignments, print contents and changed fields.
pub fn run(args: Args) -> Result<()> {
	let Args {
		type_path,
		value,
		selects,
		sets,
		legacy_storage,
		max_depth,
		flat_maps,
	} = args;

	let ty = parse_struct(&read_json(&type_path)?)?;
	let mut options = if legacy_storage { ValueOptions::legacy_storage() } else { ValueOptions::default() };
	if let Some(max_depth) = max_depth {
		options.max_depth = max_depth;
	}
	options.guess_nested_maps = !flat_maps;

	let initial = match value {
		Some(path) => to_dynamic(&read_json(&path)?),
		None => Dynamic::None,
	};
	let mut built = Value::with_options(ty, initial, options)?;

	for argument in &selects {
		let (path, member) = split_assignment(argument)?;
		debug!(path, member, "selecting union member");
		built.select(path, (!member.is_empty()).then_some(member))?;
	}

	for argument in &sets {
		let (path, text) = split_assignment(argument)?;
		let json: serde_json::Value = serde_json::from_str(text).map_err(|source| CliError::AssignmentJson {
			argument: argument.clone(),
			source,
		})?;
		debug!(path, "assigning field");
		built.set_path(path, to_dynamic(&json))?;
	}

	let payload = BuildJson {
		id: built.id().to_owned(),
		changed: built.changed_set()?.into_iter().collect(),
		value: from_dynamic(&Dynamic::Value(built))?,
	};
	emit_json(&payload);
	Ok(())
}

#[derive(serde::Serialize)]
struct BuildJson {
	id: String,
	value: serde_json::Value,
	changed: Vec<String>,
}
