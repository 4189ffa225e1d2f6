use std::fmt;
use std::sync::Arc;

/// Element kind of scalar and scalar-array fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
	/// Boolean, stored as one byte.
	Bool,
	/// Signed 8-bit integer.
	I8,
	/// Signed 16-bit integer.
	I16,
	/// Signed 32-bit integer.
	I32,
	/// Signed 64-bit integer.
	I64,
	/// Unsigned 8-bit integer.
	U8,
	/// Unsigned 16-bit integer.
	U16,
	/// Unsigned 32-bit integer.
	U32,
	/// Unsigned 64-bit integer.
	U64,
	/// 32-bit float.
	F32,
	/// 64-bit float.
	F64,
	/// UTF-8 text.
	String,
}

impl ScalarKind {
	/// Every kind in declaration order.
	pub const ALL: [ScalarKind; 12] = [
		Self::Bool,
		Self::I8,
		Self::I16,
		Self::I32,
		Self::I64,
		Self::U8,
		Self::U16,
		Self::U32,
		Self::U64,
		Self::F32,
		Self::F64,
		Self::String,
	];

	/// Descriptor spelling of this kind.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Bool => "bool",
			Self::I8 => "int8",
			Self::I16 => "int16",
			Self::I32 => "int32",
			Self::I64 => "int64",
			Self::U8 => "uint8",
			Self::U16 => "uint16",
			Self::U32 => "uint32",
			Self::U64 => "uint64",
			Self::F32 => "float32",
			Self::F64 => "float64",
			Self::String => "string",
		}
	}

	/// Parse a descriptor spelling produced by [`ScalarKind::as_str`].
	pub fn parse(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.as_str() == name)
	}

	/// Whether elements have a fixed binary width.
	pub fn is_numeric(self) -> bool {
		self != Self::String
	}
}

/// Closed description of one field's shape.
///
/// Equality is structural; use [`FieldType::same`] for identity.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
	/// Single scalar cell.
	Scalar(ScalarKind),
	/// One-dimensional array of scalars.
	ScalarArray(ScalarKind),
	/// Nested structure.
	Structure(Arc<StructType>),
	/// Array of structures.
	StructureArray(Arc<StructType>),
	/// Discriminated union.
	Union(Arc<UnionType>),
	/// Array of independently selected unions.
	UnionArray(Arc<UnionType>),
}

impl FieldType {
	/// Scalar field of `kind`.
	pub fn scalar(kind: ScalarKind) -> Self {
		Self::Scalar(kind)
	}

	/// Scalar array field of `kind`.
	pub fn array(kind: ScalarKind) -> Self {
		Self::ScalarArray(kind)
	}

	/// Variant (untagged) union field.
	pub fn any() -> Self {
		Self::Union(UnionType::variant())
	}

	/// Short kind label used in listings.
	pub fn kind_name(&self) -> &'static str {
		match self {
			Self::Scalar(_) => "scalar",
			Self::ScalarArray(_) => "scalarArray",
			Self::Structure(_) => "structure",
			Self::StructureArray(_) => "structureArray",
			Self::Union(_) => "union",
			Self::UnionArray(_) => "unionArray",
		}
	}

	/// Pointer identity for composite descriptors, equality for scalars.
	pub fn same(&self, other: &FieldType) -> bool {
		match (self, other) {
			(Self::Structure(a), Self::Structure(b)) | (Self::StructureArray(a), Self::StructureArray(b)) => Arc::ptr_eq(a, b),
			(Self::Union(a), Self::Union(b)) | (Self::UnionArray(a), Self::UnionArray(b)) => Arc::ptr_eq(a, b),
			(Self::Scalar(a), Self::Scalar(b)) | (Self::ScalarArray(a), Self::ScalarArray(b)) => a == b,
			_ => false,
		}
	}

	/// Structure descriptor, when this is a structure field.
	pub fn as_struct(&self) -> Option<&Arc<StructType>> {
		match self {
			Self::Structure(item) => Some(item),
			_ => None,
		}
	}
}

impl fmt::Display for FieldType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Scalar(kind) => f.write_str(kind.as_str()),
			Self::ScalarArray(kind) => write!(f, "{}[]", kind.as_str()),
			Self::Structure(item) => write!(f, "struct {}", item.id),
			Self::StructureArray(item) => write!(f, "struct {}[]", item.id),
			Self::Union(item) if item.variant => f.write_str("any"),
			Self::Union(item) => write!(f, "union {}", item.id),
			Self::UnionArray(item) if item.variant => f.write_str("any[]"),
			Self::UnionArray(item) => write!(f, "union {}[]", item.id),
		}
	}
}

/// Structure descriptor with fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
	id: Box<str>,
	fields: Vec<(Box<str>, FieldType)>,
}

impl StructType {
	/// Start a structure with type identifier `id` (empty for anonymous).
	pub fn builder(id: &str) -> StructBuilder {
		StructBuilder {
			item: StructType {
				id: id.into(),
				fields: Vec::new(),
			},
		}
	}

	/// Structure type identifier.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Fields in declaration order.
	pub fn fields(&self) -> &[(Box<str>, FieldType)] {
		&self.fields
	}

	/// Look up a direct field by name.
	pub fn field(&self, name: &str) -> Option<&FieldType> {
		self.fields.iter().find(|(key, _)| key.as_ref() == name).map(|(_, ty)| ty)
	}
}

/// Incremental [`StructType`] construction.
#[derive(Debug)]
pub struct StructBuilder {
	item: StructType,
}

impl StructBuilder {
	/// Append a field. A repeated name replaces the earlier declaration in place.
	pub fn field(mut self, name: &str, ty: FieldType) -> Self {
		if let Some(slot) = self.item.fields.iter_mut().find(|(key, _)| key.as_ref() == name) {
			slot.1 = ty;
		} else {
			self.item.fields.push((name.into(), ty));
		}
		self
	}

	/// Finish into a shared descriptor.
	pub fn build(self) -> Arc<StructType> {
		Arc::new(self.item)
	}
}

/// Union descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
	id: Box<str>,
	members: Vec<(Box<str>, FieldType)>,
	variant: bool,
}

impl UnionType {
	/// Start a non-variant union with type identifier `id`.
	pub fn builder(id: &str) -> UnionBuilder {
		UnionBuilder {
			item: UnionType {
				id: id.into(),
				members: Vec::new(),
				variant: false,
			},
		}
	}

	/// Variant union: no declared members, the member type follows the value.
	pub fn variant() -> Arc<UnionType> {
		Arc::new(UnionType {
			id: "any".into(),
			members: Vec::new(),
			variant: true,
		})
	}

	/// Union type identifier.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Whether this union is untagged.
	pub fn is_variant(&self) -> bool {
		self.variant
	}

	/// Declared members in order.
	pub fn members(&self) -> &[(Box<str>, FieldType)] {
		&self.members
	}

	/// Index of the member called `name`.
	pub fn member_index(&self, name: &str) -> Option<usize> {
		self.members.iter().position(|(key, _)| key.as_ref() == name)
	}
}

/// Incremental [`UnionType`] construction.
#[derive(Debug)]
pub struct UnionBuilder {
	item: UnionType,
}

impl UnionBuilder {
	/// Append a member.
	pub fn member(mut self, name: &str, ty: FieldType) -> Self {
		self.item.members.push((name.into(), ty));
		self
	}

	/// Finish into a shared descriptor.
	pub fn build(self) -> Arc<UnionType> {
		Arc::new(self.item)
	}
}
