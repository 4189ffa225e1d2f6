use std::cell::RefCell;
use std::rc::Rc;

use crate::data::array::NdArray;
use crate::data::instance::{Instance, Shared, Slot, UnionCell};
use crate::data::store::join_name;
use crate::data::{ChangeSet, Dynamic, FieldType, Result, Value, ValueError, ValueOptions};

/// How structures come back from a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FetchMode {
	/// Return structures as ordered name/value entries instead of containers.
	pub unpack: bool,
	/// When unpacking, unpack nested structures too.
	pub recurse: bool,
}

impl FetchMode {
	/// Structures come back as aliasing containers.
	pub(crate) const WRAPPED: Self = Self { unpack: false, recurse: false };
	/// One level of entries; nested structures stay wrapped.
	pub(crate) const ITEMS: Self = Self { unpack: true, recurse: false };
	/// Entries all the way down.
	pub(crate) const LIST: Self = Self { unpack: true, recurse: true };

	fn nested(self) -> Self {
		Self {
			unpack: self.recurse,
			recurse: true,
		}
	}
}

/// Storage the fetched field lives in, and the change set its views share.
pub(crate) struct FetchCx<'a> {
	pub storage: &'a Shared,
	pub changes: Option<&'a Rc<RefCell<ChangeSet>>>,
	pub options: &'a ValueOptions,
	pub scope: &'a str,
	pub depth: u32,
}

impl FetchCx<'_> {
	fn descend(&self) -> Result<u32> {
		if self.depth >= self.options.max_depth {
			return Err(ValueError::DepthExceeded {
				max_depth: self.options.max_depth,
			});
		}
		Ok(self.depth + 1)
	}
}

/// Read the field at `offset` of `inst` as a host value.
///
/// `inst` must be the borrowed contents of `cx.storage`.
pub(crate) fn fetch_field(inst: &Instance, offset: usize, mode: FetchMode, cx: &FetchCx<'_>) -> Result<Dynamic> {
	let layout = inst.layout();
	let node = layout.node(offset);

	match (&node.field, inst.slot(offset)) {
		(FieldType::Structure(item), _) if !mode.unpack => Ok(Dynamic::Value(Value::view(
			cx.storage.clone(),
			offset,
			item.clone(),
			layout.clone(),
			cx.changes.cloned(),
			cx.options.clone(),
		))),
		(FieldType::Structure(_), _) => {
			let depth = cx.descend()?;
			let nested = FetchCx { depth, ..*cx };
			let mut entries = Vec::with_capacity(node.children.len());
			for child in &node.children {
				let value = fetch_field(inst, *child, mode.nested(), &nested)?;
				entries.push((layout.node(*child).key.to_string(), value));
			}
			Ok(Dynamic::Map(entries))
		}
		(FieldType::StructureArray(_), _) => Err(ValueError::Unsupported {
			path: join_name(cx.scope, &node.path),
			what: "structure array fetch",
		}),
		(_, Slot::Scalar(cell)) => Ok(cell.to_dynamic()),
		(_, Slot::Array(data)) => Ok(Dynamic::Array(NdArray::vector(data.clone()))),
		(_, Slot::Strings(items)) => Ok(Dynamic::List(items.iter().cloned().map(Dynamic::Text).collect())),
		(_, Slot::Union(cell)) => fetch_member(cell, mode, cx, &join_name(cx.scope, &node.path)),
		(_, Slot::UnionArray(cells)) => {
			let name = join_name(cx.scope, &node.path);
			cells
				.iter()
				.enumerate()
				.map(|(index, cell)| fetch_member(cell, mode, cx, &format!("{name}[{index}]")))
				.collect::<Result<Vec<_>>>()
				.map(Dynamic::List)
		}
		(_, Slot::Structure | Slot::StructureArray) => Err(ValueError::Unsupported {
			path: join_name(cx.scope, &node.path),
			what: "fetch of mismatched storage",
		}),
	}
}

/// Selected member of a union cell, or none when undefined.
///
/// Member views carry no change set: member fields have no offsets in the
/// enclosing tree.
fn fetch_member(cell: &UnionCell, mode: FetchMode, cx: &FetchCx<'_>, name: &str) -> Result<Dynamic> {
	let Some(storage) = &cell.value else {
		return Ok(Dynamic::None);
	};
	let depth = cx.descend()?;
	let member = storage.try_borrow().map_err(|_| ValueError::Busy { path: name.to_owned() })?;
	let member_cx = FetchCx {
		storage,
		changes: None,
		options: cx.options,
		scope: name,
		depth,
	};
	fetch_field(&member, 0, mode, &member_cx)
}
