/// Runtime limits and storage capabilities for store/fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueOptions {
	/// Maximum nesting of structures and unions visited by one call.
	pub max_depth: u32,
	/// Whether the typed storage can clear a union by assigning none.
	pub union_clear: bool,
	/// Map name/value mappings to anonymous structures when inferring variant member types.
	pub guess_nested_maps: bool,
}

impl Default for ValueOptions {
	fn default() -> Self {
		Self {
			max_depth: 32,
			union_clear: true,
			guess_nested_maps: true,
		}
	}
}

impl ValueOptions {
	/// Preset for storage that predates union clearing.
	pub fn legacy_storage() -> Self {
		Self {
			union_clear: false,
			..Self::default()
		}
	}
}
