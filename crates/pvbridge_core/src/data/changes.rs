use roaring::RoaringBitmap;

use crate::data::Layout;

/// Bit vector over field offsets marking explicitly written fields.
///
/// Composite bits are not expanded: marking a structure sets exactly one bit.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
	bits: RoaringBitmap,
	len: usize,
}

impl ChangeSet {
	/// Zeroed set covering offsets `0..len`.
	pub fn new(len: usize) -> Self {
		Self {
			bits: RoaringBitmap::new(),
			len,
		}
	}

	/// Number of addressable offsets.
	pub fn len(&self) -> usize {
		self.len
	}

	/// Whether no offsets are addressable.
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Number of set bits.
	pub fn count(&self) -> u64 {
		self.bits.len()
	}

	/// Bit at `offset`; out-of-range offsets read as clear.
	pub fn get(&self, offset: usize) -> bool {
		self.index(offset).is_some_and(|bit| self.bits.contains(bit))
	}

	/// Set or clear the bit at `offset`; out-of-range offsets are ignored.
	pub fn set(&mut self, offset: usize, on: bool) {
		let Some(bit) = self.index(offset) else {
			return;
		};
		if on {
			self.bits.insert(bit);
		} else {
			self.bits.remove(bit);
		}
	}

	/// Whether any enclosing structure of `offset` is marked.
	pub fn any_ancestor_set(&self, layout: &Layout, offset: usize) -> bool {
		layout.ancestors(offset).any(|parent| self.get(parent))
	}

	/// Set offsets in ascending order.
	pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
		self.bits.iter().map(|bit| bit as usize)
	}

	/// Clear every bit.
	pub fn clear(&mut self) {
		self.bits.clear();
	}

	fn index(&self, offset: usize) -> Option<u32> {
		if offset >= self.len {
			return None;
		}
		u32::try_from(offset).ok()
	}
}

/// Whether `offset` counts as changed under `set`.
///
/// An absent set means every field is changed.
pub fn is_changed(set: Option<&ChangeSet>, layout: &Layout, offset: usize) -> bool {
	match set {
		None => true,
		Some(set) => set.get(offset) || set.any_ancestor_set(layout, offset),
	}
}
