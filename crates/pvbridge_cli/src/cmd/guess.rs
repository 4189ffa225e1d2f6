use std::path::PathBuf;

use pvbridge::data::FieldType;

use crate::cmd::error::{CliError, Result};
use crate::cmd::json::{render_type, to_dynamic};
use crate::cmd::util::{emit_json, read_json};

#[derive(clap::Args)]
pub struct Args {
	/// JSON value file.
	pub value_path: PathBuf,
}

/// Print the descriptor a variant union would infer for the value.
pub fn run(args: Args) -> Result<()> {
	let value = to_dynamic(&read_json(&args.value_path)?);
	let ty = FieldType::guess(&value).ok_or(CliError::Untyped { got: value.type_name() })?;

	emit_json(&GuessJson {
		kind: ty.kind_name(),
		type_: render_type(&ty),
	});
	Ok(())
}

#[derive(serde::Serialize)]
struct GuessJson {
	kind: &'static str,
	#[serde(rename = "type")]
	type_: serde_json::Value,
}
