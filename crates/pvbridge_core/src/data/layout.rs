use std::ops::Range;

use crate::data::{FieldPath, FieldType};

/// Depth-first preorder numbering of a field tree.
///
/// Node `0` is the root. For every node at offset `o`, its descendants occupy
/// `o + 1 .. next`, so subtree membership is a range check and the parent
/// chain of any node is at most as long as the tree is deep.
#[derive(Debug)]
pub struct Layout {
	nodes: Vec<LayoutNode>,
}

/// One numbered field.
#[derive(Debug)]
pub struct LayoutNode {
	/// Name within the parent structure; empty for the root.
	pub key: Box<str>,
	/// Dotted name from the root; empty for the root.
	pub path: Box<str>,
	/// Field descriptor.
	pub field: FieldType,
	/// Offset of the enclosing structure.
	pub parent: Option<usize>,
	/// One past the last descendant.
	pub next: usize,
	/// Offsets of direct sub-fields, in declaration order.
	pub children: Vec<usize>,
}

impl Layout {
	/// Number every field reachable through nested structures of `root`.
	pub fn build(root: &FieldType) -> Self {
		let mut nodes = Vec::new();
		push_node(&mut nodes, "", "", root, None);
		Self { nodes }
	}

	/// Total number of numbered fields (the root's next offset).
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Always false; a layout holds at least its root.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Node at `offset`.
	pub fn node(&self, offset: usize) -> &LayoutNode {
		&self.nodes[offset]
	}

	/// All nodes in offset order.
	pub fn nodes(&self) -> &[LayoutNode] {
		&self.nodes
	}

	/// Offsets strictly inside the subtree rooted at `base`.
	pub fn descendants(&self, base: usize) -> Range<usize> {
		base + 1..self.nodes[base].next
	}

	/// Resolve `path` relative to the structure at `base`.
	pub fn lookup(&self, base: usize, path: &FieldPath) -> Option<usize> {
		let mut offset = base;
		for segment in &path.segments {
			let node = &self.nodes[offset];
			offset = node.children.iter().copied().find(|child| self.nodes[*child].key.as_ref() == segment)?;
		}
		Some(offset)
	}

	/// Enclosing structure offsets of `offset`, innermost first, ending at the root.
	pub fn ancestors(&self, offset: usize) -> impl Iterator<Item = usize> + '_ {
		std::iter::successors(self.nodes[offset].parent, |current| self.nodes[*current].parent)
	}

	/// Dotted name of `offset` relative to the structure at `base`.
	pub fn relative_name(&self, base: usize, offset: usize) -> &str {
		let path = self.nodes[offset].path.as_ref();
		let prefix = self.nodes[base].path.as_ref();
		if prefix.is_empty() {
			return path;
		}
		path.strip_prefix(prefix).and_then(|rest| rest.strip_prefix('.')).unwrap_or(path)
	}
}

fn push_node(nodes: &mut Vec<LayoutNode>, key: &str, path: &str, field: &FieldType, parent: Option<usize>) -> usize {
	let offset = nodes.len();
	nodes.push(LayoutNode {
		key: key.into(),
		path: path.into(),
		field: field.clone(),
		parent,
		next: offset + 1,
		children: Vec::new(),
	});

	if let FieldType::Structure(item) = field {
		for (name, child_type) in item.fields() {
			let child_path = if path.is_empty() { name.to_string() } else { format!("{path}.{name}") };
			let child = push_node(nodes, name, &child_path, child_type, Some(offset));
			nodes[offset].children.push(child);
		}
		nodes[offset].next = nodes.len();
	}

	offset
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::{ScalarKind, StructType};

	fn nested() -> FieldType {
		let alarm = StructType::builder("alarm_t")
			.field("severity", FieldType::scalar(ScalarKind::I32))
			.field("message", FieldType::scalar(ScalarKind::String))
			.build();
		let root = StructType::builder("root")
			.field("value", FieldType::scalar(ScalarKind::F64))
			.field("alarm", FieldType::Structure(alarm))
			.field("tags", FieldType::array(ScalarKind::String))
			.build();
		FieldType::Structure(root)
	}

	#[test]
	fn offsets_are_preorder_and_contiguous() {
		let layout = Layout::build(&nested());
		let paths: Vec<&str> = layout.nodes().iter().map(|node| node.path.as_ref()).collect();
		assert_eq!(paths, ["", "value", "alarm", "alarm.severity", "alarm.message", "tags"]);

		assert_eq!(layout.len(), 6);
		assert_eq!(layout.node(0).next, 6);
		assert_eq!(layout.descendants(2), 3..5);
		assert_eq!(layout.node(5).next, 6);
	}

	#[test]
	fn lookup_walks_children() {
		let layout = Layout::build(&nested());
		let path = FieldPath::parse("alarm.message").expect("path parses");
		assert_eq!(layout.lookup(0, &path), Some(4));
		let relative = FieldPath::parse("severity").expect("path parses");
		assert_eq!(layout.lookup(2, &relative), Some(3));
		let missing = FieldPath::parse("alarm.status").expect("path parses");
		assert_eq!(layout.lookup(0, &missing), None);
	}

	#[test]
	fn ancestors_end_at_root() {
		let layout = Layout::build(&nested());
		assert_eq!(layout.ancestors(3).collect::<Vec<_>>(), [2, 0]);
		assert_eq!(layout.ancestors(0).count(), 0);
	}

	#[test]
	fn relative_names_strip_view_prefix() {
		let layout = Layout::build(&nested());
		assert_eq!(layout.relative_name(2, 4), "message");
		assert_eq!(layout.relative_name(0, 4), "alarm.message");
	}

	#[test]
	fn non_structure_root_is_a_single_node() {
		let layout = Layout::build(&FieldType::scalar(ScalarKind::I8));
		assert_eq!(layout.len(), 1);
		assert!(layout.descendants(0).is_empty());
	}
}
