use crate::data::array::{numeric_buffer, text_items};
use crate::data::dynamic::Sequence;
use crate::data::instance::{Instance, Slot, UnionCell};
use crate::data::scalar::Scalar;
use crate::data::union::store_union;
use crate::data::{ChangeSet, Dynamic, FieldType, Layout, Result, ScalarKind, Value, ValueError, ValueOptions};

/// Per-call state threaded through a store.
pub(crate) struct StoreCx<'a> {
	changes: Option<&'a mut ChangeSet>,
	pub(crate) options: &'a ValueOptions,
	scope: String,
	depth: u32,
}

impl<'a> StoreCx<'a> {
	pub(crate) fn new(changes: Option<&'a mut ChangeSet>, options: &'a ValueOptions) -> Self {
		Self {
			changes,
			options,
			scope: String::new(),
			depth: 0,
		}
	}

	/// Context for a union member tree: untracked, named under `scope`.
	pub(crate) fn member(&self, scope: &str) -> Result<StoreCx<'a>> {
		if self.depth >= self.options.max_depth {
			return Err(ValueError::DepthExceeded {
				max_depth: self.options.max_depth,
			});
		}
		Ok(StoreCx {
			changes: None,
			options: self.options,
			scope: scope.to_owned(),
			depth: self.depth + 1,
		})
	}

	/// Full name of `offset` for error messages.
	pub(crate) fn name(&self, layout: &Layout, offset: usize) -> String {
		join_name(&self.scope, &layout.node(offset).path)
	}

	fn mark(&mut self, offset: usize) {
		if let Some(changes) = self.changes.as_deref_mut() {
			changes.set(offset, true);
		}
	}
}

pub(crate) fn join_name(scope: &str, path: &str) -> String {
	match (scope.is_empty(), path.is_empty()) {
		(true, _) => path.to_owned(),
		(false, true) => scope.to_owned(),
		(false, false) => format!("{scope}.{path}"),
	}
}

/// Store `value` into the field at `offset`.
///
/// Non-structure fields are replaced whole and their own offset is marked.
/// Structures store entry by entry; entries written before a failure stay
/// written.
pub(crate) fn store_field(inst: &mut Instance, offset: usize, value: &Dynamic, cx: &mut StoreCx<'_>) -> Result<()> {
	let layout = inst.layout().clone();
	let name = cx.name(&layout, offset);

	let slot = match &layout.node(offset).field {
		FieldType::Scalar(kind) => {
			let cell = Scalar::coerce(*kind, value).ok_or_else(|| ValueError::mismatch(&name, value.type_name()))?;
			Slot::Scalar(cell)
		}
		FieldType::ScalarArray(ScalarKind::String) => Slot::Strings(text_items(value, &name)?),
		FieldType::ScalarArray(kind) => Slot::Array(numeric_buffer(*kind, value, &name)?),
		FieldType::Structure(_) => {
			return match value {
				Dynamic::Value(source) => store_copy(inst, &layout, offset, source, cx),
				_ => store_struct(inst, &layout, offset, value, cx),
			};
		}
		FieldType::StructureArray(_) => {
			return Err(ValueError::Unsupported {
				path: name,
				what: "structure array storage",
			});
		}
		FieldType::Union(ty) => {
			let mut cell = match inst.slot(offset) {
				Slot::Union(cell) => cell.clone(),
				_ => UnionCell::default(),
			};
			store_union(&mut cell, ty, value, cx, &name)?;
			Slot::Union(cell)
		}
		FieldType::UnionArray(ty) => {
			let items = match value.sequence() {
				Sequence::Items(items) => items,
				Sequence::Consumed => return Err(ValueError::Consumed { path: name }),
				Sequence::NotSequence => return Err(ValueError::mismatch(&name, value.type_name())),
			};
			let mut cells = Vec::with_capacity(items.len());
			for (index, item) in items.iter().enumerate() {
				let mut cell = UnionCell::default();
				store_union(&mut cell, ty, item, cx, &format!("{name}[{index}]"))?;
				cells.push(cell);
			}
			Slot::UnionArray(cells.into())
		}
	};

	*inst.slot_mut(offset) = slot;
	cx.mark(offset);
	Ok(())
}

fn store_struct(inst: &mut Instance, layout: &Layout, offset: usize, value: &Dynamic, cx: &mut StoreCx<'_>) -> Result<()> {
	let Dynamic::Map(entries) = value else {
		return Err(ValueError::mismatch(cx.name(layout, offset), value.type_name()));
	};
	if cx.depth >= cx.options.max_depth {
		return Err(ValueError::DepthExceeded {
			max_depth: cx.options.max_depth,
		});
	}

	cx.depth += 1;
	let result = store_entries(inst, layout, offset, entries, cx);
	cx.depth -= 1;
	result
}

/// Copy a container of an equal structure type; every copied leaf is marked.
fn store_copy(inst: &mut Instance, layout: &Layout, offset: usize, source: &Value, cx: &mut StoreCx<'_>) -> Result<()> {
	if layout.node(offset).field != FieldType::Structure(source.struct_type().clone()) {
		return Err(ValueError::mismatch(cx.name(layout, offset), "Value"));
	}
	source.copy_into(inst, offset)?;
	for child in layout.descendants(offset) {
		if !matches!(layout.node(child).field, FieldType::Structure(_)) {
			cx.mark(child);
		}
	}
	Ok(())
}

fn store_entries(inst: &mut Instance, layout: &Layout, offset: usize, entries: &[(String, Dynamic)], cx: &mut StoreCx<'_>) -> Result<()> {
	let node = layout.node(offset);
	for (key, item) in entries {
		let child = node
			.children
			.iter()
			.copied()
			.find(|child| layout.node(*child).key.as_ref() == key)
			.ok_or_else(|| ValueError::Lookup {
				path: join_name(&cx.name(layout, offset), key),
			})?;
		store_field(inst, child, item, cx)?;
	}
	Ok(())
}

#[cfg(test)]
mod tests;
