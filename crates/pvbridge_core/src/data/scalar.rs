use crate::data::{Dynamic, ScalarKind};

/// Live value of one scalar field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Scalar {
	Bool(bool),
	I8(i8),
	I16(i16),
	I32(i32),
	I64(i64),
	U8(u8),
	U16(u16),
	U32(u32),
	U64(u64),
	F32(f32),
	F64(f64),
	String(String),
}

enum Num {
	Int(i128),
	Float(f64),
}

macro_rules! from_num {
	($kind:expr, $value:expr) => {
		match $kind {
			ScalarKind::Bool => Scalar::Bool($value != Default::default()),
			ScalarKind::I8 => Scalar::I8($value as i8),
			ScalarKind::I16 => Scalar::I16($value as i16),
			ScalarKind::I32 => Scalar::I32($value as i32),
			ScalarKind::I64 => Scalar::I64($value as i64),
			ScalarKind::U8 => Scalar::U8($value as u8),
			ScalarKind::U16 => Scalar::U16($value as u16),
			ScalarKind::U32 => Scalar::U32($value as u32),
			ScalarKind::U64 => Scalar::U64($value as u64),
			ScalarKind::F32 => Scalar::F32($value as f32),
			ScalarKind::F64 => Scalar::F64($value as f64),
			ScalarKind::String => Scalar::String($value.to_string()),
		}
	};
}

impl Scalar {
	/// Zero value of `kind`.
	pub(crate) fn default_for(kind: ScalarKind) -> Self {
		match kind {
			ScalarKind::String => Self::String(String::new()),
			_ => from_num!(kind, 0_i128),
		}
	}

	pub(crate) fn kind(&self) -> ScalarKind {
		match self {
			Self::Bool(_) => ScalarKind::Bool,
			Self::I8(_) => ScalarKind::I8,
			Self::I16(_) => ScalarKind::I16,
			Self::I32(_) => ScalarKind::I32,
			Self::I64(_) => ScalarKind::I64,
			Self::U8(_) => ScalarKind::U8,
			Self::U16(_) => ScalarKind::U16,
			Self::U32(_) => ScalarKind::U32,
			Self::U64(_) => ScalarKind::U64,
			Self::F32(_) => ScalarKind::F32,
			Self::F64(_) => ScalarKind::F64,
			Self::String(_) => ScalarKind::String,
		}
	}

	/// Host scalar in its natural kind; `None` for non-scalar host values.
	pub(crate) fn from_dynamic(value: &Dynamic) -> Option<Self> {
		match value {
			Dynamic::Bool(value) => Some(Self::Bool(*value)),
			Dynamic::Int(value) => Some(Self::I64(*value)),
			Dynamic::UInt(value) => Some(Self::U64(*value)),
			Dynamic::Float(value) => Some(Self::F64(*value)),
			Dynamic::Text(value) => Some(Self::String(value.clone())),
			Dynamic::Bytes(value) => Some(Self::String(String::from_utf8_lossy(value).into_owned())),
			_ => None,
		}
	}

	/// Coerce a host value to a cell of `kind`.
	pub(crate) fn coerce(kind: ScalarKind, value: &Dynamic) -> Option<Self> {
		Self::from_dynamic(value)?.convert(kind)
	}

	/// Convert between kinds.
	///
	/// Numeric conversions follow `as` casts (integers wrap, floats saturate).
	/// Text parses strictly and yields `None` when it does not fit `kind`.
	pub(crate) fn convert(&self, kind: ScalarKind) -> Option<Self> {
		if self.kind() == kind {
			return Some(self.clone());
		}
		match (self, kind) {
			(Self::String(text), _) => parse_text(text.trim(), kind),
			(_, ScalarKind::String) => Some(Self::String(self.render())),
			_ => Some(match self.num()? {
				Num::Int(value) => from_num!(kind, value),
				Num::Float(value) => from_num!(kind, value),
			}),
		}
	}

	/// Widen to the host representation.
	pub(crate) fn to_dynamic(&self) -> Dynamic {
		match self {
			Self::Bool(value) => Dynamic::Bool(*value),
			Self::I8(value) => Dynamic::Int(i64::from(*value)),
			Self::I16(value) => Dynamic::Int(i64::from(*value)),
			Self::I32(value) => Dynamic::Int(i64::from(*value)),
			Self::I64(value) => Dynamic::Int(*value),
			Self::U8(value) => Dynamic::Int(i64::from(*value)),
			Self::U16(value) => Dynamic::Int(i64::from(*value)),
			Self::U32(value) => Dynamic::Int(i64::from(*value)),
			Self::U64(value) => Dynamic::UInt(*value),
			Self::F32(value) => Dynamic::Float(f64::from(*value)),
			Self::F64(value) => Dynamic::Float(*value),
			Self::String(value) => Dynamic::Text(value.clone()),
		}
	}

	fn num(&self) -> Option<Num> {
		match self {
			Self::Bool(value) => Some(Num::Int(i128::from(*value))),
			Self::I8(value) => Some(Num::Int(i128::from(*value))),
			Self::I16(value) => Some(Num::Int(i128::from(*value))),
			Self::I32(value) => Some(Num::Int(i128::from(*value))),
			Self::I64(value) => Some(Num::Int(i128::from(*value))),
			Self::U8(value) => Some(Num::Int(i128::from(*value))),
			Self::U16(value) => Some(Num::Int(i128::from(*value))),
			Self::U32(value) => Some(Num::Int(i128::from(*value))),
			Self::U64(value) => Some(Num::Int(i128::from(*value))),
			Self::F32(value) => Some(Num::Float(f64::from(*value))),
			Self::F64(value) => Some(Num::Float(*value)),
			Self::String(_) => None,
		}
	}

	fn render(&self) -> String {
		match self {
			Self::Bool(value) => value.to_string(),
			Self::I8(value) => value.to_string(),
			Self::I16(value) => value.to_string(),
			Self::I32(value) => value.to_string(),
			Self::I64(value) => value.to_string(),
			Self::U8(value) => value.to_string(),
			Self::U16(value) => value.to_string(),
			Self::U32(value) => value.to_string(),
			Self::U64(value) => value.to_string(),
			Self::F32(value) => value.to_string(),
			Self::F64(value) => value.to_string(),
			Self::String(value) => value.clone(),
		}
	}
}

fn parse_text(text: &str, kind: ScalarKind) -> Option<Scalar> {
	match kind {
		ScalarKind::Bool => {
			if text.eq_ignore_ascii_case("true") || text == "1" {
				Some(Scalar::Bool(true))
			} else if text.eq_ignore_ascii_case("false") || text == "0" {
				Some(Scalar::Bool(false))
			} else {
				None
			}
		}
		ScalarKind::I8 => text.parse().ok().map(Scalar::I8),
		ScalarKind::I16 => text.parse().ok().map(Scalar::I16),
		ScalarKind::I32 => text.parse().ok().map(Scalar::I32),
		ScalarKind::I64 => text.parse().ok().map(Scalar::I64),
		ScalarKind::U8 => text.parse().ok().map(Scalar::U8),
		ScalarKind::U16 => text.parse().ok().map(Scalar::U16),
		ScalarKind::U32 => text.parse().ok().map(Scalar::U32),
		ScalarKind::U64 => text.parse().ok().map(Scalar::U64),
		ScalarKind::F32 => text.parse().ok().map(Scalar::F32),
		ScalarKind::F64 => text.parse().ok().map(Scalar::F64),
		ScalarKind::String => Some(Scalar::String(text.to_owned())),
	}
}
