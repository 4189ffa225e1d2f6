use std::path::PathBuf;

use pvbridge::data::{FieldType, Layout};

use crate::cmd::error::Result;
use crate::cmd::json::parse_type;
use crate::cmd::util::{emit_json, read_json};

#[derive(clap::Args)]
pub struct Args {
	/// Type descriptor file.
	pub type_path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Print every numbered field with its offset range.
pub fn run(args: Args) -> Result<()> {
	let Args { type_path, json } = args;

	let ty = parse_type(&read_json(&type_path)?)?;
	let layout = Layout::build(&ty);
	let rows: Vec<FieldRow> = layout
		.nodes()
		.iter()
		.enumerate()
		.map(|(offset, node)| FieldRow {
			offset,
			next: node.next,
			path: node.path.to_string(),
			kind: node.field.to_string(),
		})
		.collect();

	if json {
		emit_json(&FieldsJson {
			id: root_id(&ty).to_owned(),
			count: layout.len(),
			fields: rows,
		});
		return Ok(());
	}

	println!("type: {} ({} fields)", root_id(&ty), layout.len());
	for row in rows {
		let path = if row.path.is_empty() { "<root>" } else { row.path.as_str() };
		println!("{:>4} {:>4}  {:<24} {}", row.offset, row.next, row.kind, path);
	}
	Ok(())
}

fn root_id(ty: &FieldType) -> &str {
	match ty {
		FieldType::Structure(item) | FieldType::StructureArray(item) => item.id(),
		FieldType::Union(item) | FieldType::UnionArray(item) => item.id(),
		FieldType::Scalar(kind) | FieldType::ScalarArray(kind) => kind.as_str(),
	}
}

#[derive(serde::Serialize)]
struct FieldRow {
	offset: usize,
	next: usize,
	path: String,
	kind: String,
}

#[derive(serde::Serialize)]
struct FieldsJson {
	id: String,
	count: usize,
	fields: Vec<FieldRow>,
}
