use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::data::changes::is_changed;
use crate::data::fetch::{FetchCx, FetchMode, fetch_field};
use crate::data::instance::{Instance, Shared, Slot, reaches};
use crate::data::store::{StoreCx, join_name, store_field};
use crate::data::{ChangeSet, Dynamic, FieldPath, FieldType, Layout, Result, StructType, ValueError, ValueOptions};

/// Typed structure container with optional change tracking.
///
/// A `Value` is a view: shared storage, the offset of the structure it
/// addresses, and the change set it reports against. Sub-structures fetched
/// with [`Value::get_path`] are views into the same storage and change set.
///
/// `Clone` copies the handle (same storage, same change set).
/// [`Value::share`] aliases the storage with an independent change set, and
/// [`Value::detach`] makes an independent deep copy. Aliased storage is
/// shared mutable state; callers serialize access to it.
#[derive(Clone)]
pub struct Value {
	storage: Shared,
	base: usize,
	ty: Arc<StructType>,
	layout: Arc<Layout>,
	changes: Option<Rc<RefCell<ChangeSet>>>,
	options: ValueOptions,
}

impl Value {
	/// Build a tracked container of `ty`, storing `initial` unless it is none.
	///
	/// Initial assignments are marked in the fresh change set.
	pub fn new(ty: Arc<StructType>, initial: impl Into<Dynamic>) -> Result<Self> {
		Self::build(ty, initial.into(), ValueOptions::default(), true)
	}

	/// [`Value::new`] with explicit options.
	pub fn with_options(ty: Arc<StructType>, initial: impl Into<Dynamic>, options: ValueOptions) -> Result<Self> {
		Self::build(ty, initial.into(), options, true)
	}

	/// Build a container without a change set; every field reports changed.
	pub fn untracked(ty: Arc<StructType>, initial: impl Into<Dynamic>) -> Result<Self> {
		Self::build(ty, initial.into(), ValueOptions::default(), false)
	}

	fn build(ty: Arc<StructType>, initial: Dynamic, options: ValueOptions, tracked: bool) -> Result<Self> {
		let storage = Instance::shared(&FieldType::Structure(ty.clone()));
		let layout = storage.borrow().layout().clone();
		let changes = tracked.then(|| Rc::new(RefCell::new(ChangeSet::new(layout.len()))));
		let mut value = Self {
			storage,
			base: 0,
			ty,
			layout,
			changes,
			options,
		};
		if !initial.is_none() {
			value.assign(initial)?;
		}
		Ok(value)
	}

	pub(crate) fn view(
		storage: Shared,
		base: usize,
		ty: Arc<StructType>,
		layout: Arc<Layout>,
		changes: Option<Rc<RefCell<ChangeSet>>>,
		options: ValueOptions,
	) -> Self {
		Self {
			storage,
			base,
			ty,
			layout,
			changes,
			options,
		}
	}

	/// Container over the same storage with its own zeroed change set.
	pub fn share(&self) -> Value {
		Self {
			changes: Some(Rc::new(RefCell::new(ChangeSet::new(self.layout.len())))),
			..self.clone()
		}
	}

	/// Independent deep copy of this view with a zeroed change set.
	pub fn detach(&self) -> Result<Value> {
		let copy = self.storage.try_borrow().map_err(|_| self.busy(self.base))?.extract(self.base)?;
		let layout = copy.layout().clone();
		Ok(Self {
			changes: Some(Rc::new(RefCell::new(ChangeSet::new(layout.len())))),
			storage: copy.into_shared(),
			base: 0,
			ty: self.ty.clone(),
			layout,
			options: self.options.clone(),
		})
	}

	/// Structure type identifier; empty when anonymous.
	pub fn id(&self) -> &str {
		self.ty.id()
	}

	/// Structure descriptor of this view.
	pub fn struct_type(&self) -> &Arc<StructType> {
		&self.ty
	}

	/// Options captured at construction.
	pub fn options(&self) -> &ValueOptions {
		&self.options
	}

	/// Fetch the field at dotted `name`; sub-structures come back as views.
	pub fn get_path(&self, name: &str) -> Result<Dynamic> {
		self.fetch(self.resolve(name)?, FetchMode::WRAPPED)
	}

	/// Store `value` into the field at dotted `name`.
	pub fn set_path(&mut self, name: &str, value: impl Into<Dynamic>) -> Result<()> {
		let offset = self.resolve(name)?;
		self.store(offset, value.into())
	}

	/// Store a name/value mapping into this structure.
	pub fn assign(&mut self, value: impl Into<Dynamic>) -> Result<()> {
		self.store(self.base, value.into())
	}

	/// Descriptor of this structure, or of the sub-structure at `path`.
	pub fn type_of(&self, path: Option<&str>) -> Result<Arc<StructType>> {
		let offset = self.target(path)?;
		self.layout.node(offset).field.as_struct().cloned().ok_or_else(|| ValueError::NotStructure {
			path: path.unwrap_or_default().to_owned(),
		})
	}

	/// Fully unpacked rendering of this structure or of the field at `path`.
	pub fn to_list(&self, path: Option<&str>) -> Result<Dynamic> {
		self.fetch(self.target(path)?, FetchMode::LIST)
	}

	/// One level of name/value entries; nested structures stay views.
	pub fn items(&self, path: Option<&str>) -> Result<Dynamic> {
		self.fetch(self.target(path)?, FetchMode::ITEMS)
	}

	/// Pre-select union member `member` at `path`, or clear it with `None`.
	///
	/// Re-selecting the current member keeps its value. Variant unions only
	/// accept `None`.
	pub fn select(&mut self, path: &str, member: Option<&str>) -> Result<()> {
		let offset = self.resolve(path)?;
		let FieldType::Union(ty) = &self.layout.node(offset).field else {
			return Err(ValueError::NotUnion { path: path.to_owned() });
		};

		let mut inst = self.storage.try_borrow_mut().map_err(|_| self.busy(offset))?;
		let Slot::Union(cell) = inst.slot_mut(offset) else {
			return Err(ValueError::NotUnion { path: path.to_owned() });
		};

		match member {
			None => cell.clear(),
			Some(_) if ty.is_variant() => return Err(ValueError::VariantSelect { path: path.to_owned() }),
			Some(name) => {
				let index = ty.member_index(name).ok_or_else(|| ValueError::Lookup {
					path: join_name(path, name),
				})?;
				if cell.selector != Some(index) || !cell.is_defined() {
					cell.set_selected(index, Instance::shared(&ty.members()[index].1));
				}
			}
		}
		Ok(())
	}

	/// Fetch `name`, or `default` when it cannot be fetched.
	pub fn get(&self, name: &str, default: impl Into<Dynamic>) -> Dynamic {
		match self.get_path(name) {
			Ok(value) => value,
			Err(err) => {
				if !err.is_lookup() {
					debug!(path = name, error = %err, "get fell back to default");
				}
				default.into()
			}
		}
	}

	/// Whether this structure, or the field at `path`, changed.
	///
	/// A field is changed when it or any enclosing structure is marked, or
	/// when there is no change set.
	pub fn changed(&self, path: Option<&str>) -> Result<bool> {
		let offset = self.target(path)?;
		match &self.changes {
			None => Ok(true),
			Some(changes) => {
				let changes = changes.try_borrow().map_err(|_| self.busy(offset))?;
				Ok(is_changed(Some(&*changes), &self.layout, offset))
			}
		}
	}

	/// Set or clear the changed bit of this structure or of the field at `path`.
	///
	/// Returns `false` without doing anything when there is no change set.
	/// Marking a structure does not mark its fields individually.
	pub fn mark(&mut self, path: Option<&str>, on: bool) -> Result<bool> {
		let offset = self.target(path)?;
		let Some(changes) = &self.changes else {
			warn!(id = self.id(), path = path.unwrap_or_default(), "mark ignored: value has no change set");
			return Ok(false);
		};
		changes.try_borrow_mut().map_err(|_| self.busy(offset))?.set(offset, on);
		Ok(true)
	}

	/// Names of changed fields inside this view, relative to it.
	///
	/// Without a change set this is every non-structure field. With one it is
	/// exactly the marked fields; a marked structure is listed by its own name.
	pub fn changed_set(&self) -> Result<BTreeSet<String>> {
		let range = self.layout.descendants(self.base);
		let name = |offset: usize| self.layout.relative_name(self.base, offset).to_owned();
		match &self.changes {
			None => Ok(range
				.filter(|offset| !matches!(self.layout.node(*offset).field, FieldType::Structure(_)))
				.map(name)
				.collect()),
			Some(changes) => {
				let changes = changes.try_borrow().map_err(|_| self.busy(self.base))?;
				Ok(changes.iter().filter(|offset| range.contains(offset)).map(name).collect())
			}
		}
	}

	/// Number of fields in this structure, counting the structure itself.
	pub fn len(&self) -> usize {
		self.layout.node(self.base).next - self.base
	}

	/// Always false; a structure counts itself.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Whether this container has a change set.
	pub fn is_tracked(&self) -> bool {
		self.changes.is_some()
	}

	/// Copy of the change set, indexed by offsets of the whole storage tree.
	pub fn change_set(&self) -> Option<ChangeSet> {
		self.changes.as_ref().and_then(|changes| changes.try_borrow().ok().map(|changes| changes.clone()))
	}

	/// Clear every changed bit, starting a new baseline.
	pub fn reset_changes(&mut self) -> Result<()> {
		if let Some(changes) = &self.changes {
			changes.try_borrow_mut().map_err(|_| self.busy(self.base))?.clear();
		}
		Ok(())
	}

	/// Whether both containers read and write the same storage.
	pub fn shares_storage(&self, other: &Value) -> bool {
		Rc::ptr_eq(&self.storage, &other.storage)
	}

	/// Whether both containers address the same structure of the same storage.
	pub fn same_view(&self, other: &Value) -> bool {
		self.shares_storage(other) && self.base == other.base
	}

	/// Storage a union member takes when this value is stored by identity.
	///
	/// Root views are shared; sub-structure views are copied out.
	pub(crate) fn identity_storage(&self) -> Result<Shared> {
		if self.base == 0 {
			return Ok(self.storage.clone());
		}
		debug!(id = self.id(), offset = self.base, "sub-structure view stored by copy");
		let inst = self.storage.try_borrow().map_err(|_| self.busy(self.base))?;
		Ok(inst.extract(self.base)?.into_shared())
	}

	/// Overwrite the structure at `offset` of `target` with this view's contents.
	pub(crate) fn copy_into(&self, target: &mut Instance, offset: usize) -> Result<()> {
		let source = self.storage.try_borrow().map_err(|_| self.busy(self.base))?;
		target.copy_from(offset, &source, self.base)
	}

	fn target(&self, path: Option<&str>) -> Result<usize> {
		match path {
			Some(name) => self.resolve(name),
			None => Ok(self.base),
		}
	}

	fn resolve(&self, name: &str) -> Result<usize> {
		let path = FieldPath::parse(name)?;
		self.layout
			.lookup(self.base, &path)
			.ok_or_else(|| ValueError::Lookup { path: name.to_owned() })
	}

	fn busy(&self, offset: usize) -> ValueError {
		ValueError::Busy {
			path: self.layout.node(offset).path.to_string(),
		}
	}

	fn store(&self, offset: usize, value: Dynamic) -> Result<()> {
		let value = self.prepare(value)?;

		let mut changes = match &self.changes {
			Some(changes) => Some(changes.try_borrow_mut().map_err(|_| self.busy(offset))?),
			None => None,
		};
		let mut inst = self.storage.try_borrow_mut().map_err(|_| self.busy(offset))?;
		let mut cx = StoreCx::new(changes.as_deref_mut(), &self.options);
		store_field(&mut inst, offset, &value, &mut cx)
	}

	fn fetch(&self, offset: usize, mode: FetchMode) -> Result<Dynamic> {
		let inst = self.storage.try_borrow().map_err(|_| self.busy(offset))?;
		let cx = FetchCx {
			storage: &self.storage,
			changes: self.changes.as_ref(),
			options: &self.options,
			scope: "",
			depth: 0,
		};
		fetch_field(&inst, offset, mode, &cx)
	}

	/// Run lazy producers and cut references back to this storage before it is borrowed.
	fn prepare(&self, value: Dynamic) -> Result<Dynamic> {
		self.detach_aliases(value.materialized())
	}

	fn detach_aliases(&self, value: Dynamic) -> Result<Dynamic> {
		Ok(match value {
			Dynamic::Value(view) if reaches(&view.storage, &self.storage) => {
				debug!(id = view.id(), "stored value reaches its target, copying");
				Dynamic::Value(view.detach()?)
			}
			Dynamic::List(items) => Dynamic::List(self.detach_all(items)?),
			Dynamic::Tuple(items) => Dynamic::Tuple(self.detach_all(items)?),
			Dynamic::Map(entries) => Dynamic::Map(
				entries
					.into_iter()
					.map(|(key, item)| Ok((key, self.detach_aliases(item)?)))
					.collect::<Result<_>>()?,
			),
			other => other,
		})
	}

	fn detach_all(&self, items: Vec<Dynamic>) -> Result<Vec<Dynamic>> {
		items.into_iter().map(|item| self.detach_aliases(item)).collect()
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let id = if self.id().is_empty() { "None" } else { self.id() };
		let node = self.layout.node(self.base);
		let shown = node
			.children
			.iter()
			.copied()
			.find(|child| self.layout.node(*child).key.as_ref() == "value")
			.or_else(|| node.children.first().copied());

		let Some(offset) = shown else {
			return write!(f, "Value(id:{id}, None:None)");
		};
		let name = self.layout.relative_name(self.base, offset);
		match self.fetch(offset, FetchMode::LIST) {
			Ok(value) => write!(f, "Value(id:{id}, {name}:{value:?})"),
			Err(err) => write!(f, "Value(id:{id}, {name}:<{err}>)"),
		}
	}
}
