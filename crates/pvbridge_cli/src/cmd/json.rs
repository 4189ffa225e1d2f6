//! JSON encodings for dynamic values and field descriptors.
//!
//! Values: objects become mappings, arrays become lists, and the single-key
//! object `{"$select": [member, value]}` becomes an explicit union selector.
//!
//! Descriptors: a scalar kind name (`"int32"`), its array form (`"int32[]"`),
//! `"any"`/`"any[]"` for variant unions, or one of the objects
//! `{"struct": id, "fields": [[name, T], ...]}`,
//! `{"union": id, "members": [[name, T], ...]}` and their `"struct[]"` /
//! `"union[]"` array forms.

use std::sync::Arc;

use pvbridge::data::{ArrayData, Dynamic, FieldType, ScalarKind, StructType, UnionType};
use serde_json::{Map, Number, Value as JsonValue, json};

use crate::cmd::error::{CliError, Result};

const SELECT_KEY: &str = "$select";

/// Convert parsed JSON into a dynamic value.
pub fn to_dynamic(json: &JsonValue) -> Dynamic {
	match json {
		JsonValue::Null => Dynamic::None,
		JsonValue::Bool(value) => Dynamic::Bool(*value),
		JsonValue::Number(number) => number_to_dynamic(number),
		JsonValue::String(text) => Dynamic::Text(text.clone()),
		JsonValue::Array(items) => Dynamic::List(items.iter().map(to_dynamic).collect()),
		JsonValue::Object(map) => match selector_pair(map) {
			Some((member, inner)) => Dynamic::selector(member, to_dynamic(inner)),
			None => Dynamic::Map(map.iter().map(|(key, value)| (key.clone(), to_dynamic(value))).collect()),
		},
	}
}

fn number_to_dynamic(number: &Number) -> Dynamic {
	if let Some(value) = number.as_i64() {
		Dynamic::Int(value)
	} else if let Some(value) = number.as_u64() {
		Dynamic::UInt(value)
	} else {
		number.as_f64().map_or(Dynamic::None, Dynamic::Float)
	}
}

fn selector_pair(map: &Map<String, JsonValue>) -> Option<(&str, &JsonValue)> {
	if map.len() != 1 {
		return None;
	}
	match map.get(SELECT_KEY)?.as_array()?.as_slice() {
		[JsonValue::String(member), inner] => Some((member.as_str(), inner)),
		_ => None,
	}
}

/// Render a fetched value as JSON. Structure views are unpacked recursively.
pub fn from_dynamic(value: &Dynamic) -> Result<JsonValue> {
	Ok(match value {
		Dynamic::None | Dynamic::Iter(_) => JsonValue::Null,
		Dynamic::Bool(value) => JsonValue::Bool(*value),
		Dynamic::Int(value) => json!(value),
		Dynamic::UInt(value) => json!(value),
		Dynamic::Float(value) => Number::from_f64(*value).map_or(JsonValue::Null, JsonValue::Number),
		Dynamic::Text(text) => JsonValue::String(text.clone()),
		Dynamic::Bytes(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
		Dynamic::List(items) | Dynamic::Tuple(items) => JsonValue::Array(items.iter().map(from_dynamic).collect::<Result<_>>()?),
		Dynamic::Map(entries) => {
			let mut object = Map::new();
			for (key, item) in entries {
				object.insert(key.clone(), from_dynamic(item)?);
			}
			JsonValue::Object(object)
		}
		Dynamic::Array(array) => array_to_json(array.data())?,
		Dynamic::Value(view) => from_dynamic(&view.to_list(None)?)?,
	})
}

fn array_to_json(data: &ArrayData) -> Result<JsonValue> {
	let items = (0..data.len())
		.filter_map(|index| data.item(index))
		.map(|item| from_dynamic(&item))
		.collect::<Result<_>>()?;
	Ok(JsonValue::Array(items))
}

/// Parse a descriptor whose root must be a structure.
pub fn parse_struct(json: &JsonValue) -> Result<Arc<StructType>> {
	match parse_type(json)? {
		FieldType::Structure(item) => Ok(item),
		other => Err(CliError::descriptor(format!("top-level type must be a structure, got {other}"))),
	}
}

/// Parse any field descriptor.
pub fn parse_type(json: &JsonValue) -> Result<FieldType> {
	match json {
		JsonValue::String(name) => parse_named(name),
		JsonValue::Object(map) => parse_compound(map),
		other => Err(CliError::descriptor(format!("expected a type name or object, got {other}"))),
	}
}

fn parse_named(name: &str) -> Result<FieldType> {
	let (base, array) = match name.strip_suffix("[]") {
		Some(base) => (base, true),
		None => (name, false),
	};
	if base == "any" {
		let variant = UnionType::variant();
		return Ok(if array { FieldType::UnionArray(variant) } else { FieldType::Union(variant) });
	}
	let kind = ScalarKind::parse(base).ok_or_else(|| CliError::descriptor(format!("unknown type name {name:?}")))?;
	Ok(if array { FieldType::array(kind) } else { FieldType::scalar(kind) })
}

fn parse_compound(map: &Map<String, JsonValue>) -> Result<FieldType> {
	if let Some(id) = map.get("struct") {
		return Ok(FieldType::Structure(parse_struct_body(id, map.get("fields"))?));
	}
	if let Some(id) = map.get("struct[]") {
		return Ok(FieldType::StructureArray(parse_struct_body(id, map.get("fields"))?));
	}
	if let Some(id) = map.get("union") {
		return Ok(FieldType::Union(parse_union_body(id, map.get("members"))?));
	}
	if let Some(id) = map.get("union[]") {
		return Ok(FieldType::UnionArray(parse_union_body(id, map.get("members"))?));
	}
	Err(CliError::descriptor("object needs one of struct, struct[], union, union[]"))
}

fn parse_struct_body(id: &JsonValue, fields: Option<&JsonValue>) -> Result<Arc<StructType>> {
	let mut builder = StructType::builder(descriptor_id(id)?);
	for (name, ty) in named_entries(fields, "fields")? {
		builder = builder.field(name, ty);
	}
	Ok(builder.build())
}

fn parse_union_body(id: &JsonValue, members: Option<&JsonValue>) -> Result<Arc<UnionType>> {
	let mut builder = UnionType::builder(descriptor_id(id)?);
	for (name, ty) in named_entries(members, "members")? {
		builder = builder.member(name, ty);
	}
	Ok(builder.build())
}

fn descriptor_id(id: &JsonValue) -> Result<&str> {
	id.as_str().ok_or_else(|| CliError::descriptor(format!("type id must be a string, got {id}")))
}

fn named_entries<'a>(list: Option<&'a JsonValue>, label: &str) -> Result<Vec<(&'a str, FieldType)>> {
	let Some(list) = list else {
		return Ok(Vec::new());
	};
	let items = list.as_array().ok_or_else(|| CliError::descriptor(format!("{label} must be a list")))?;
	items
		.iter()
		.map(|item| match item.as_array().map(Vec::as_slice) {
			Some([JsonValue::String(name), ty]) => Ok((name.as_str(), parse_type(ty)?)),
			_ => Err(CliError::descriptor(format!("{label} entries must be [name, type] pairs, got {item}"))),
		})
		.collect()
}

/// Render a field descriptor in the form accepted by [`parse_type`].
pub fn render_type(ty: &FieldType) -> JsonValue {
	match ty {
		FieldType::Scalar(kind) => json!(kind.as_str()),
		FieldType::ScalarArray(kind) => json!(format!("{}[]", kind.as_str())),
		FieldType::Structure(item) => json!({ "struct": item.id(), "fields": render_entries(item.fields()) }),
		FieldType::StructureArray(item) => json!({ "struct[]": item.id(), "fields": render_entries(item.fields()) }),
		FieldType::Union(item) if item.is_variant() => json!("any"),
		FieldType::Union(item) => json!({ "union": item.id(), "members": render_entries(item.members()) }),
		FieldType::UnionArray(item) if item.is_variant() => json!("any[]"),
		FieldType::UnionArray(item) => json!({ "union[]": item.id(), "members": render_entries(item.members()) }),
	}
}

fn render_entries(entries: &[(Box<str>, FieldType)]) -> JsonValue {
	JsonValue::Array(entries.iter().map(|(name, ty)| json!([name.as_ref(), render_type(ty)])).collect())
}
