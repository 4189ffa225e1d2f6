use crate::data::{Dynamic, FieldType, ScalarKind, StructType};

impl FieldType {
	/// Best-effort field type for a host value, as used by variant unions.
	///
	/// Returns `None` when the value has no typed counterpart (none, lazy
	/// sequences, mixed sequences).
	pub fn guess(value: &Dynamic) -> Option<FieldType> {
		Self::guess_with(value, true)
	}

	pub(crate) fn guess_with(value: &Dynamic, nested_maps: bool) -> Option<FieldType> {
		Some(match value {
			Dynamic::None | Dynamic::Iter(_) => return None,
			Dynamic::Bool(_) => Self::Scalar(ScalarKind::Bool),
			Dynamic::Int(_) => Self::Scalar(ScalarKind::I64),
			Dynamic::UInt(_) => Self::Scalar(ScalarKind::U64),
			Dynamic::Float(_) => Self::Scalar(ScalarKind::F64),
			Dynamic::Text(_) | Dynamic::Bytes(_) => Self::Scalar(ScalarKind::String),
			Dynamic::Array(array) => Self::ScalarArray(array.data().kind()),
			Dynamic::List(items) | Dynamic::Tuple(items) => Self::ScalarArray(sequence_kind(items)?),
			Dynamic::Map(entries) if nested_maps => {
				let mut builder = StructType::builder("");
				for (key, item) in entries {
					builder = builder.field(key, Self::guess_with(item, nested_maps)?);
				}
				Self::Structure(builder.build())
			}
			Dynamic::Map(_) => return None,
			Dynamic::Value(value) => Self::Structure(value.struct_type().clone()),
		})
	}
}

/// Element kind shared by every item of a flat sequence.
fn sequence_kind(items: &[Dynamic]) -> Option<ScalarKind> {
	let mut kind = None;
	for item in items {
		let next = match item {
			Dynamic::Text(_) | Dynamic::Bytes(_) => ScalarKind::String,
			Dynamic::Bool(_) => ScalarKind::Bool,
			Dynamic::Int(_) | Dynamic::UInt(_) => ScalarKind::I64,
			Dynamic::Float(_) => ScalarKind::F64,
			_ => return None,
		};
		kind = Some(match (kind, next) {
			(None, next) => next,
			(Some(current), next) if current == next => current,
			(Some(ScalarKind::I64), ScalarKind::F64) | (Some(ScalarKind::F64), ScalarKind::I64) => ScalarKind::F64,
			_ => return None,
		});
	}
	Some(kind.unwrap_or(ScalarKind::F64))
}
