use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::data::{NdArray, Value};

/// Host-side value exchanged with a [`Value`] container.
///
/// Input to stores and output of fetches. Sequences come in three flavours:
/// `List` and `Tuple` are in memory, `Iter` is a one-shot lazy source whose
/// producer may run arbitrary caller code.
#[derive(Clone)]
pub enum Dynamic {
	/// The none sentinel.
	None,
	/// Boolean.
	Bool(bool),
	/// Native signed integer.
	Int(i64),
	/// Unsigned 64-bit integer.
	UInt(u64),
	/// Double-precision float.
	Float(f64),
	/// Unicode text.
	Text(String),
	/// Raw bytes, read as UTF-8 where text is expected.
	Bytes(Vec<u8>),
	/// Ordered, growable sequence.
	List(Vec<Dynamic>),
	/// Fixed sequence; a `(name, value)` pair selects a union member.
	Tuple(Vec<Dynamic>),
	/// Name/value mapping in insertion order.
	Map(Vec<(String, Dynamic)>),
	/// N-dimensional numeric array.
	Array(NdArray),
	/// Lazy one-shot sequence.
	Iter(DynIter),
	/// Wrapped structure container.
	Value(Value),
}

impl Dynamic {
	/// Build a `(selector, value)` pair for non-variant union assignment.
	pub fn selector(name: &str, value: impl Into<Dynamic>) -> Self {
		Self::Tuple(vec![Self::Text(name.to_owned()), value.into()])
	}

	/// Build a lazy sequence, consumed at most once.
	pub fn iter<I>(items: I) -> Self
	where
		I: IntoIterator<Item = Dynamic>,
		I::IntoIter: 'static,
	{
		Self::Iter(DynIter::new(items))
	}

	/// Build a name/value mapping.
	pub fn map<K, V, I>(entries: I) -> Self
	where
		K: Into<String>,
		V: Into<Dynamic>,
		I: IntoIterator<Item = (K, V)>,
	{
		Self::Map(entries.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
	}

	/// Host type name used in error messages.
	pub fn type_name(&self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Bool(_) => "bool",
			Self::Int(_) | Self::UInt(_) => "int",
			Self::Float(_) => "float",
			Self::Text(_) => "str",
			Self::Bytes(_) => "bytes",
			Self::List(_) => "list",
			Self::Tuple(_) => "tuple",
			Self::Map(_) => "dict",
			Self::Array(_) => "ndarray",
			Self::Iter(_) => "iterator",
			Self::Value(_) => "Value",
		}
	}

	/// Whether this is the none sentinel.
	pub fn is_none(&self) -> bool {
		matches!(self, Self::None)
	}

	/// Integer view, when the value is an integer representable as `i64`.
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Int(value) => Some(*value),
			Self::UInt(value) => i64::try_from(*value).ok(),
			_ => None,
		}
	}

	/// Float view of any numeric value.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Int(value) => Some(*value as f64),
			Self::UInt(value) => Some(*value as f64),
			Self::Float(value) => Some(*value),
			_ => None,
		}
	}

	/// Text view.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Text(value) => Some(value),
			_ => None,
		}
	}

	/// Element view of lists and tuples.
	pub fn as_list(&self) -> Option<&[Dynamic]> {
		match self {
			Self::List(items) | Self::Tuple(items) => Some(items),
			_ => None,
		}
	}

	/// Entry view of mappings.
	pub fn as_map(&self) -> Option<&[(String, Dynamic)]> {
		match self {
			Self::Map(entries) => Some(entries),
			_ => None,
		}
	}

	/// Array view.
	pub fn as_array(&self) -> Option<&NdArray> {
		match self {
			Self::Array(array) => Some(array),
			_ => None,
		}
	}

	/// Container view.
	pub fn as_value(&self) -> Option<&Value> {
		match self {
			Self::Value(value) => Some(value),
			_ => None,
		}
	}

	/// Look up `key` in a mapping.
	pub fn entry(&self, key: &str) -> Option<&Dynamic> {
		self.as_map()?.iter().find(|(name, _)| name == key).map(|(_, value)| value)
	}

	/// Treat this value as a finite sequence, draining a lazy source.
	pub(crate) fn sequence(&self) -> Sequence<'_> {
		match self {
			Self::List(items) | Self::Tuple(items) => Sequence::Items(Cow::Borrowed(items)),
			Self::Iter(iter) => match iter.take() {
				Some(items) => Sequence::Items(Cow::Owned(items.collect())),
				None => Sequence::Consumed,
			},
			_ => Sequence::NotSequence,
		}
	}

	/// Drain every lazy source reachable from this value into lists.
	///
	/// Producers run here, before any storage is borrowed. Already consumed
	/// sources are left in place and reported by the store that reaches them.
	pub(crate) fn materialized(self) -> Dynamic {
		match self {
			Self::Iter(iter) => match iter.take() {
				Some(items) => Self::List(items.map(Dynamic::materialized).collect()),
				None => Self::Iter(iter),
			},
			Self::List(items) => Self::List(items.into_iter().map(Dynamic::materialized).collect()),
			Self::Tuple(items) => Self::Tuple(items.into_iter().map(Dynamic::materialized).collect()),
			Self::Map(entries) => Self::Map(entries.into_iter().map(|(key, value)| (key, value.materialized())).collect()),
			other => other,
		}
	}
}

/// Result of reading a value as a sequence.
pub(crate) enum Sequence<'a> {
	/// Elements in order.
	Items(Cow<'a, [Dynamic]>),
	/// Lazy source already drained.
	Consumed,
	/// Value is not iterable.
	NotSequence,
}

/// Shared handle to a one-shot lazy sequence.
#[derive(Clone)]
pub struct DynIter {
	inner: Rc<RefCell<Option<Box<dyn Iterator<Item = Dynamic>>>>>,
}

impl DynIter {
	/// Wrap an iterator.
	pub fn new<I>(items: I) -> Self
	where
		I: IntoIterator<Item = Dynamic>,
		I::IntoIter: 'static,
	{
		Self {
			inner: Rc::new(RefCell::new(Some(Box::new(items.into_iter())))),
		}
	}

	/// Whether the source was already drained.
	pub fn is_consumed(&self) -> bool {
		self.inner.try_borrow().map(|slot| slot.is_none()).unwrap_or(true)
	}

	fn take(&self) -> Option<Box<dyn Iterator<Item = Dynamic>>> {
		self.inner.try_borrow_mut().ok().and_then(|mut slot| slot.take())
	}
}

impl fmt::Debug for DynIter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DynIter").field("consumed", &self.is_consumed()).finish()
	}
}

impl fmt::Debug for Dynamic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::None => f.write_str("None"),
			Self::Bool(value) => write!(f, "{value}"),
			Self::Int(value) => write!(f, "{value}"),
			Self::UInt(value) => write!(f, "{value}"),
			Self::Float(value) => write!(f, "{value:?}"),
			Self::Text(value) => write!(f, "{value:?}"),
			Self::Bytes(value) => write!(f, "b{:?}", String::from_utf8_lossy(value)),
			Self::List(items) => f.debug_list().entries(items).finish(),
			Self::Tuple(items) => {
				let mut out = f.debug_tuple("");
				for item in items {
					out.field(item);
				}
				out.finish()
			}
			Self::Map(entries) => f.debug_map().entries(entries.iter().map(|(key, value)| (key, value))).finish(),
			Self::Array(array) => write!(f, "{array:?}"),
			Self::Iter(iter) => write!(f, "{iter:?}"),
			Self::Value(value) => write!(f, "{value:?}"),
		}
	}
}

impl PartialEq for Dynamic {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::None, Self::None) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::UInt(a), Self::UInt(b)) => a == b,
			(Self::Int(a), Self::UInt(b)) | (Self::UInt(b), Self::Int(a)) => u64::try_from(*a).is_ok_and(|a| a == *b),
			(Self::Float(a), Self::Float(b)) => a == b,
			(Self::Text(a), Self::Text(b)) => a == b,
			(Self::Bytes(a), Self::Bytes(b)) => a == b,
			(Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a == b,
			(Self::Map(a), Self::Map(b)) => a == b,
			(Self::Array(a), Self::Array(b)) => a == b,
			(Self::Value(a), Self::Value(b)) => a.same_view(b),
			_ => false,
		}
	}
}

macro_rules! dynamic_from {
	($variant:ident as $target:ty: $($source:ty),+) => {
		$(
			impl From<$source> for Dynamic {
				fn from(value: $source) -> Self {
					Self::$variant(<$target>::from(value))
				}
			}
		)+
	};
}

dynamic_from!(Bool as bool: bool);
dynamic_from!(Int as i64: i8, i16, i32, i64, u8, u16, u32);
dynamic_from!(UInt as u64: u64);
dynamic_from!(Float as f64: f32, f64);
dynamic_from!(Text as String: &str, String);

impl From<NdArray> for Dynamic {
	fn from(value: NdArray) -> Self {
		Self::Array(value)
	}
}

impl From<Value> for Dynamic {
	fn from(value: Value) -> Self {
		Self::Value(value)
	}
}

impl<T: Into<Dynamic>> From<Vec<T>> for Dynamic {
	fn from(items: Vec<T>) -> Self {
		Self::List(items.into_iter().map(Into::into).collect())
	}
}

impl<T: Into<Dynamic>> From<Option<T>> for Dynamic {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::None, Into::into)
	}
}
