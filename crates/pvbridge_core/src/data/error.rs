use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, ValueError>;

/// Errors produced while storing, fetching, and inspecting typed values.
#[derive(Debug, Error)]
pub enum ValueError {
	/// Field name or path does not exist.
	#[error("no field {path}")]
	Lookup {
		/// Requested path, or union member name.
		path: String,
	},
	/// Path expression syntax is invalid.
	#[error("invalid field path: {path}")]
	InvalidFieldPath {
		/// Original user-provided path string.
		path: String,
	},
	/// Dynamic value kind cannot be coerced to the field kind.
	#[error("can't assign field {path} with {got}")]
	TypeMismatch {
		/// Full name of the target field.
		path: String,
		/// Type name of the offending dynamic value.
		got: String,
	},
	/// Numeric array input was not one-dimensional.
	#[error("only 1-d arrays can be assigned to {path} (got ndim={ndim})")]
	Shape {
		/// Full name of the target field.
		path: String,
		/// Rank of the rejected input.
		ndim: usize,
	},
	/// Operation is not implemented for this field or storage.
	#[error("{what} not supported for {path}")]
	Unsupported {
		/// Full name of the target field.
		path: String,
		/// Rejected operation.
		what: &'static str,
	},
	/// No union member accepted the value during automatic selection.
	#[error("unable to automatically select union member for {path}")]
	AutoSelect {
		/// Full name of the union field.
		path: String,
		/// Failure of the last candidate member.
		#[source]
		source: Box<ValueError>,
	},
	/// Requested type of a field that is not a structure.
	#[error("can't extract type of non-struct field {path}")]
	NotStructure {
		/// Requested path.
		path: String,
	},
	/// Union operation applied to a non-union field.
	#[error("field {path} is not a union")]
	NotUnion {
		/// Requested path.
		path: String,
	},
	/// Explicit member selection on a variant union.
	#[error("only select({path}, None) can be used on a variant union")]
	VariantSelect {
		/// Full name of the union field.
		path: String,
	},
	/// Shared storage is borrowed by an in-flight call.
	#[error("storage for {path} is in use by another operation")]
	Busy {
		/// Full name of the target field.
		path: String,
	},
	/// One-shot lazy sequence was read twice.
	#[error("sequence for {path} was already consumed")]
	Consumed {
		/// Full name of the target field.
		path: String,
	},
	/// Store/fetch recursion exceeded the configured limit.
	#[error("value depth exceeded (max={max_depth})")]
	DepthExceeded {
		/// Configured depth ceiling.
		max_depth: u32,
	},
}

impl ValueError {
	pub(crate) fn mismatch(path: impl Into<String>, got: &str) -> Self {
		Self::TypeMismatch {
			path: path.into(),
			got: got.to_owned(),
		}
	}

	/// Whether this error means the addressed field does not exist.
	pub fn is_lookup(&self) -> bool {
		matches!(self, Self::Lookup { .. } | Self::InvalidFieldPath { .. })
	}
}
