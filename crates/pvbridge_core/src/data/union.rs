//! Union member resolution for stores.
//!
//! Rules apply in order: none clears; variant unions take a container by
//! identity or infer a member type from the value; a `(name, value)` pair
//! selects the named member; an existing selection is stored into a copy
//! that replaces it on success; anything else is matched against the declared
//! members in order.

use std::sync::Arc;

use tracing::trace;

use crate::data::instance::{Instance, Shared, UnionCell};
use crate::data::store::{StoreCx, join_name, store_field};
use crate::data::{Dynamic, FieldType, Result, UnionType, ValueError};

/// Store `value` into one union cell.
///
/// `name` is the full name of the union field. The cell is left untouched
/// when no rule accepts the value.
pub(crate) fn store_union(cell: &mut UnionCell, ty: &Arc<UnionType>, value: &Dynamic, cx: &mut StoreCx<'_>, name: &str) -> Result<()> {
	if value.is_none() {
		if !cx.options.union_clear {
			return Err(ValueError::Unsupported {
				path: name.to_owned(),
				what: "clearing a union",
			});
		}
		cell.clear();
		return Ok(());
	}

	if ty.is_variant() {
		return store_variant(cell, value, cx, name);
	}

	if let Some((member, inner)) = selector_pair(value) {
		let index = ty.member_index(member).ok_or_else(|| ValueError::Lookup {
			path: join_name(name, member),
		})?;
		let storage = member_storage(&ty.members()[index].1, inner, cx, name)?;
		cell.set_selected(index, storage);
		return Ok(());
	}

	if let (Some(index), Some(storage)) = (cell.selector, &cell.value) {
		let mut staged = storage.try_borrow().map_err(|_| ValueError::Busy { path: name.to_owned() })?.extract(0)?;
		store_field(&mut staged, 0, value, &mut cx.member(name)?)?;
		cell.set_selected(index, staged.into_shared());
		return Ok(());
	}

	auto_select(cell, ty, value, cx, name)
}

fn store_variant(cell: &mut UnionCell, value: &Dynamic, cx: &mut StoreCx<'_>, name: &str) -> Result<()> {
	if let Dynamic::Value(source) = value {
		cell.set_variant(source.identity_storage()?);
		return Ok(());
	}

	let field = FieldType::guess_with(value, cx.options.guess_nested_maps).ok_or_else(|| ValueError::mismatch(name, value.type_name()))?;
	trace!(path = name, field = %field, "inferred variant member type");

	let mut inst = Instance::new(&field);
	store_field(&mut inst, 0, value, &mut cx.member(name)?)?;
	cell.set_variant(inst.into_shared());
	Ok(())
}

/// Try each declared member in order; the first that accepts `value` is selected.
fn auto_select(cell: &mut UnionCell, ty: &UnionType, value: &Dynamic, cx: &mut StoreCx<'_>, name: &str) -> Result<()> {
	let mut last = None;
	for (index, (member, field)) in ty.members().iter().enumerate() {
		match member_storage(field, value, cx, name) {
			Ok(storage) => {
				cell.set_selected(index, storage);
				return Ok(());
			}
			Err(err) => {
				trace!(path = name, member = %member, error = %err, "union member rejected value");
				last = Some(err);
			}
		}
	}

	let source = last.unwrap_or_else(|| ValueError::mismatch(name, value.type_name()));
	Err(ValueError::AutoSelect {
		path: name.to_owned(),
		source: Box::new(source),
	})
}

/// Fresh member storage holding `value`.
///
/// A container of the member's exact structure type is shared; one of an
/// equal type is copied.
fn member_storage(field: &FieldType, value: &Dynamic, cx: &StoreCx<'_>, name: &str) -> Result<Shared> {
	if let (FieldType::Structure(expected), Dynamic::Value(source)) = (field, value) {
		if Arc::ptr_eq(expected, source.struct_type()) {
			return source.identity_storage();
		}
		if **expected == **source.struct_type() {
			let mut inst = Instance::new(field);
			source.copy_into(&mut inst, 0)?;
			return Ok(inst.into_shared());
		}
	}

	let mut inst = Instance::new(field);
	store_field(&mut inst, 0, value, &mut cx.member(name)?)?;
	Ok(inst.into_shared())
}

fn selector_pair(value: &Dynamic) -> Option<(&str, &Dynamic)> {
	match value {
		Dynamic::Tuple(items) => match items.as_slice() {
			[Dynamic::Text(member), inner] => Some((member.as_str(), inner)),
			_ => None,
		},
		_ => None,
	}
}
