//! Bridge between host sequences and frozen numeric/text buffers.
//!
//! Stored numeric buffers are immutable `Arc<[T]>` slices. A store always
//! allocates a fresh buffer; a fetch hands out another reference to the same
//! allocation, so a returned [`NdArray`] keeps its backing memory alive for as
//! long as it exists, independent of later stores into the field.

use std::fmt;
use std::sync::Arc;

use crate::data::dynamic::Sequence;
use crate::data::scalar::Scalar;
use crate::data::{Dynamic, Result, ScalarKind, ValueError};

macro_rules! numeric_kinds {
	($callback:ident) => {
		$callback! {
			(Bool, bool, as_bool),
			(I8, i8, as_i8),
			(I16, i16, as_i16),
			(I32, i32, as_i32),
			(I64, i64, as_i64),
			(U8, u8, as_u8),
			(U16, u16, as_u16),
			(U32, u32, as_u32),
			(U64, u64, as_u64),
			(F32, f32, as_f32),
			(F64, f64, as_f64),
		}
	};
}

macro_rules! define_array_data {
	($(($kind:ident, $ty:ty, $accessor:ident)),+ $(,)?) => {
		/// Frozen one-dimensional numeric buffer, shared by reference count.
		#[derive(Clone, PartialEq)]
		pub enum ArrayData {
			$(
				#[doc = concat!("`", stringify!($ty), "` elements.")]
				$kind(Arc<[$ty]>),
			)+
		}

		impl ArrayData {
			/// Element kind.
			pub fn kind(&self) -> ScalarKind {
				match self {
					$(Self::$kind(_) => ScalarKind::$kind,)+
				}
			}

			/// Number of elements.
			pub fn len(&self) -> usize {
				match self {
					$(Self::$kind(items) => items.len(),)+
				}
			}

			/// Whether the buffer holds no elements.
			pub fn is_empty(&self) -> bool {
				self.len() == 0
			}

			/// Whether both handles reference the same allocation.
			pub fn shares_buffer(&self, other: &ArrayData) -> bool {
				match (self, other) {
					$((Self::$kind(a), Self::$kind(b)) => Arc::ptr_eq(a, b),)+
					_ => false,
				}
			}

			/// Empty buffer of `kind`; `None` for text.
			pub(crate) fn empty(kind: ScalarKind) -> Option<Self> {
				match kind {
					$(ScalarKind::$kind => Some(Self::$kind(Arc::from(Vec::<$ty>::new()))),)+
					ScalarKind::String => None,
				}
			}

			pub(crate) fn scalar_at(&self, index: usize) -> Option<Scalar> {
				match self {
					$(Self::$kind(items) => items.get(index).map(|item| Scalar::$kind(*item)),)+
				}
			}

			/// Element at `index` widened to a dynamic number.
			pub fn item(&self, index: usize) -> Option<Dynamic> {
				self.scalar_at(index).map(|item| item.to_dynamic())
			}

			/// Collect scalars already converted to `kind`; `None` on a kind mismatch.
			pub(crate) fn collect(kind: ScalarKind, items: Vec<Scalar>) -> Option<Self> {
				match kind {
					$(
						ScalarKind::$kind => items
							.into_iter()
							.map(|item| match item {
								Scalar::$kind(value) => Some(value),
								_ => None,
							})
							.collect::<Option<Vec<$ty>>>()
							.map(|items| Self::$kind(Arc::from(items))),
					)+
					ScalarKind::String => None,
				}
			}

			$(
				#[doc = concat!("Element slice when the buffer holds `", stringify!($ty), "`.")]
				pub fn $accessor(&self) -> Option<&[$ty]> {
					match self {
						Self::$kind(items) => Some(items),
						_ => None,
					}
				}
			)+
		}

		$(
			impl From<Vec<$ty>> for ArrayData {
				fn from(items: Vec<$ty>) -> Self {
					Self::$kind(Arc::from(items))
				}
			}

			impl From<Vec<$ty>> for NdArray {
				fn from(items: Vec<$ty>) -> Self {
					NdArray::vector(ArrayData::from(items))
				}
			}
		)+

		impl fmt::Debug for ArrayData {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				match self {
					$(Self::$kind(items) => write!(f, "{}{:?}", ScalarKind::$kind.as_str(), items),)+
				}
			}
		}
	};
}

numeric_kinds!(define_array_data);

/// Shaped numeric array as seen by the host.
///
/// Values fetched from a field are one-dimensional views over the field's
/// buffer; no element is copied.
#[derive(Clone, PartialEq)]
pub struct NdArray {
	shape: Vec<usize>,
	data: ArrayData,
}

impl NdArray {
	/// One-dimensional array over `data`.
	pub fn vector(data: ArrayData) -> Self {
		Self {
			shape: vec![data.len()],
			data,
		}
	}

	/// Array with an explicit shape; `None` when the shape does not cover `data`.
	pub fn with_shape(shape: Vec<usize>, data: ArrayData) -> Option<Self> {
		let total = shape.iter().try_fold(1_usize, |acc, dim| acc.checked_mul(*dim))?;
		if total != data.len() {
			return None;
		}
		Some(Self { shape, data })
	}

	/// Dimensions, outermost first.
	pub fn shape(&self) -> &[usize] {
		&self.shape
	}

	/// Number of dimensions.
	pub fn ndim(&self) -> usize {
		self.shape.len()
	}

	/// Flat element buffer.
	pub fn data(&self) -> &ArrayData {
		&self.data
	}

	/// Total element count.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Whether the array holds no elements.
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}
}

impl fmt::Debug for NdArray {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "array({:?}, shape={:?})", self.data, self.shape)
	}
}

/// Coerce a host value into a fresh one-dimensional buffer of `kind`.
pub(crate) fn numeric_buffer(kind: ScalarKind, value: &Dynamic, path: &str) -> Result<ArrayData> {
	let items = match value {
		Dynamic::Array(array) => {
			if array.ndim() != 1 {
				return Err(ValueError::Shape {
					path: path.to_owned(),
					ndim: array.ndim(),
				});
			}
			(0..array.len()).filter_map(|index| array.data().scalar_at(index)).collect()
		}
		Dynamic::Bool(_) | Dynamic::Int(_) | Dynamic::UInt(_) | Dynamic::Float(_) => {
			return Err(ValueError::Shape {
				path: path.to_owned(),
				ndim: 0,
			});
		}
		other => match other.sequence() {
			Sequence::Items(items) => flat_elements(&items, path)?,
			Sequence::Consumed => return Err(ValueError::Consumed { path: path.to_owned() }),
			Sequence::NotSequence => return Err(ValueError::mismatch(path, other.type_name())),
		},
	};

	let mut out = Vec::with_capacity(items.len());
	for item in items {
		let converted = item.convert(kind).ok_or_else(|| ValueError::mismatch(path, item.kind().as_str()))?;
		out.push(converted);
	}
	ArrayData::collect(kind, out).ok_or_else(|| ValueError::mismatch(path, kind.as_str()))
}

/// Elements of a host sequence that must form a flat vector.
fn flat_elements(items: &[Dynamic], path: &str) -> Result<Vec<Scalar>> {
	let nested = items.iter().filter(|item| is_nested(item)).count();
	if nested > 0 {
		if nested == items.len() {
			return Err(ValueError::Shape {
				path: path.to_owned(),
				ndim: 1 + nested_rank(&items[0]),
			});
		}
		return Err(ValueError::mismatch(path, "ragged sequence"));
	}

	items
		.iter()
		.map(|item| match item {
			Dynamic::Text(_) | Dynamic::Bytes(_) | Dynamic::Bool(_) | Dynamic::Int(_) | Dynamic::UInt(_) | Dynamic::Float(_) => {
				Scalar::from_dynamic(item).ok_or_else(|| ValueError::mismatch(path, item.type_name()))
			}
			other => Err(ValueError::mismatch(path, other.type_name())),
		})
		.collect()
}

fn is_nested(item: &Dynamic) -> bool {
	matches!(item, Dynamic::List(_) | Dynamic::Tuple(_) | Dynamic::Array(_))
}

fn nested_rank(item: &Dynamic) -> usize {
	match item {
		Dynamic::Array(array) => array.ndim(),
		Dynamic::List(items) | Dynamic::Tuple(items) => 1 + items.first().map_or(0, nested_rank),
		_ => 0,
	}
}

/// Materialize a host sequence of text elements.
pub(crate) fn text_items(value: &Dynamic, path: &str) -> Result<Arc<[String]>> {
	let items = match value.sequence() {
		Sequence::Items(items) => items,
		Sequence::Consumed => return Err(ValueError::Consumed { path: path.to_owned() }),
		Sequence::NotSequence => return Err(ValueError::mismatch(path, value.type_name())),
	};

	let mut out = Vec::with_capacity(items.len());
	for item in items.iter() {
		match item {
			Dynamic::Text(text) => out.push(text.clone()),
			Dynamic::Bytes(bytes) => out.push(String::from_utf8_lossy(bytes).into_owned()),
			other => return Err(ValueError::mismatch(path, other.type_name())),
		}
	}
	Ok(Arc::from(out))
}
