use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use crate::data::array::ArrayData;
use crate::data::scalar::Scalar;
use crate::data::{FieldType, Layout, Result, ValueError};

/// Reference-counted field tree, shared by containers, views, and union cells.
pub(crate) type Shared = Rc<RefCell<Instance>>;

/// Live storage for one field tree, one slot per layout offset.
#[derive(Debug)]
pub(crate) struct Instance {
	layout: Arc<Layout>,
	slots: Vec<Slot>,
}

#[derive(Debug, Clone)]
pub(crate) enum Slot {
	Scalar(Scalar),
	Array(ArrayData),
	Strings(Arc<[String]>),
	Structure,
	StructureArray,
	Union(UnionCell),
	UnionArray(Arc<[UnionCell]>),
}

/// Selection state of one union field.
///
/// `selector` is `None` for undefined and for variant unions; a variant
/// union with a value is defined by `value` alone.
#[derive(Debug, Clone, Default)]
pub(crate) struct UnionCell {
	pub selector: Option<usize>,
	pub value: Option<Shared>,
}

impl Instance {
	/// Fresh zero-valued storage for `field`.
	pub(crate) fn new(field: &FieldType) -> Self {
		let layout = Arc::new(Layout::build(field));
		let slots = layout.nodes().iter().map(|node| default_slot(&node.field)).collect();
		Self { layout, slots }
	}

	pub(crate) fn shared(field: &FieldType) -> Shared {
		Rc::new(RefCell::new(Self::new(field)))
	}

	pub(crate) fn into_shared(self) -> Shared {
		Rc::new(RefCell::new(self))
	}

	pub(crate) fn layout(&self) -> &Arc<Layout> {
		&self.layout
	}

	pub(crate) fn slot(&self, offset: usize) -> &Slot {
		&self.slots[offset]
	}

	pub(crate) fn slot_mut(&mut self, offset: usize) -> &mut Slot {
		&mut self.slots[offset]
	}

	/// Independent copy of the subtree rooted at `base`.
	///
	/// Union members are copied too, so nothing stays shared with `self`.
	pub(crate) fn extract(&self, base: usize) -> Result<Instance> {
		let layout = if base == 0 {
			self.layout.clone()
		} else {
			Arc::new(Layout::build(&self.layout.node(base).field))
		};
		let range = base..self.layout.node(base).next;
		let slots = self.slots[range].iter().map(Slot::deep_clone).collect::<Result<Vec<_>>>()?;
		Ok(Self { layout, slots })
	}

	/// Overwrite the subtree at `base` with a copy of `source`'s subtree at `source_base`.
	///
	/// Both subtrees must have the same shape.
	pub(crate) fn copy_from(&mut self, base: usize, source: &Instance, source_base: usize) -> Result<()> {
		let target = &self.layout.node(base).field;
		let origin = &source.layout.node(source_base).field;
		if target != origin {
			return Err(ValueError::mismatch(self.layout.node(base).path.as_ref(), "Value"));
		}

		let count = self.layout.node(base).next - base;
		for index in 0..count {
			self.slots[base + index] = source.slots[source_base + index].deep_clone()?;
		}
		Ok(())
	}
}

impl Slot {
	fn deep_clone(&self) -> Result<Slot> {
		Ok(match self {
			Self::Union(cell) => Self::Union(cell.deep_clone()?),
			Self::UnionArray(cells) => Self::UnionArray(cells.iter().map(UnionCell::deep_clone).collect::<Result<Vec<_>>>()?.into()),
			other => other.clone(),
		})
	}
}

impl UnionCell {
	pub(crate) fn clear(&mut self) {
		self.selector = None;
		self.value = None;
	}

	pub(crate) fn set_selected(&mut self, index: usize, value: Shared) {
		self.selector = Some(index);
		self.value = Some(value);
	}

	pub(crate) fn set_variant(&mut self, value: Shared) {
		self.selector = None;
		self.value = Some(value);
	}

	pub(crate) fn is_defined(&self) -> bool {
		self.value.is_some()
	}

	fn deep_clone(&self) -> Result<UnionCell> {
		let value = match &self.value {
			Some(member) => {
				let member = member.try_borrow().map_err(|_| ValueError::Busy { path: String::new() })?;
				Some(member.extract(0)?.into_shared())
			}
			None => None,
		};
		Ok(UnionCell {
			selector: self.selector,
			value,
		})
	}
}

/// Whether `target` is `from` itself or is held by a union member anywhere below it.
///
/// Storage that is borrowed elsewhere counts as reaching.
pub(crate) fn reaches(from: &Shared, target: &Shared) -> bool {
	let mut pending = vec![from.clone()];
	let mut seen = HashSet::new();
	while let Some(current) = pending.pop() {
		if Rc::ptr_eq(&current, target) {
			return true;
		}
		if !seen.insert(Rc::as_ptr(&current)) {
			continue;
		}
		let Ok(inst) = current.try_borrow() else {
			return true;
		};
		for slot in &inst.slots {
			match slot {
				Slot::Union(cell) => pending.extend(cell.value.iter().cloned()),
				Slot::UnionArray(cells) => pending.extend(cells.iter().filter_map(|cell| cell.value.clone())),
				_ => {}
			}
		}
	}
	false
}

fn default_slot(field: &FieldType) -> Slot {
	match field {
		FieldType::Scalar(kind) => Slot::Scalar(Scalar::default_for(*kind)),
		FieldType::ScalarArray(kind) => match ArrayData::empty(*kind) {
			Some(data) => Slot::Array(data),
			None => Slot::Strings(Arc::from(Vec::<String>::new())),
		},
		FieldType::Structure(_) => Slot::Structure,
		FieldType::StructureArray(_) => Slot::StructureArray,
		FieldType::Union(_) => Slot::Union(UnionCell::default()),
		FieldType::UnionArray(_) => Slot::UnionArray(Arc::from(Vec::<UnionCell>::new())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::{ScalarKind, StructType};

	fn point() -> FieldType {
		FieldType::Structure(
			StructType::builder("point")
				.field("x", FieldType::scalar(ScalarKind::F64))
				.field("y", FieldType::scalar(ScalarKind::F64))
				.build(),
		)
	}

	#[test]
	fn fresh_instance_has_zero_slots() {
		let inst = Instance::new(&point());
		assert!(matches!(inst.slot(0), Slot::Structure));
		assert!(matches!(inst.slot(1), Slot::Scalar(Scalar::F64(value)) if *value == 0.0));
	}

	#[test]
	fn extract_copies_subtree_shape() {
		let outer = FieldType::Structure(StructType::builder("outer").field("p", point()).build());
		let mut inst = Instance::new(&outer);
		*inst.slot_mut(3) = Slot::Scalar(Scalar::F64(2.0));

		let copy = inst.extract(1).expect("subtree copies");
		assert_eq!(copy.layout().len(), 3);
		assert!(matches!(copy.slot(2), Slot::Scalar(Scalar::F64(value)) if *value == 2.0));
	}

	#[test]
	fn copy_from_rejects_different_shape() {
		let mut inst = Instance::new(&point());
		let other = Instance::new(&FieldType::Structure(StructType::builder("point").build()));
		assert!(matches!(inst.copy_from(0, &other, 0), Err(ValueError::TypeMismatch { .. })));
	}

	#[test]
	fn reaches_follows_union_members_one_way() {
		let holder = Instance::shared(&FieldType::Structure(StructType::builder("holder").field("u", FieldType::any()).build()));
		let member = Instance::shared(&point());
		if let Slot::Union(cell) = holder.borrow_mut().slot_mut(1) {
			cell.set_variant(member.clone());
		}

		assert!(reaches(&holder, &holder));
		assert!(reaches(&holder, &member));
		assert!(!reaches(&member, &holder));
	}

	#[test]
	fn union_copy_does_not_share_member() {
		let mut cell = UnionCell::default();
		cell.set_selected(0, Instance::shared(&FieldType::scalar(ScalarKind::I32)));
		let copy = cell.deep_clone().expect("cell copies");

		let (Some(a), Some(b)) = (&cell.value, &copy.value) else {
			panic!("both cells should be defined");
		};
		assert!(!Rc::ptr_eq(a, b));
		assert_eq!(copy.selector, Some(0));
	}
}
