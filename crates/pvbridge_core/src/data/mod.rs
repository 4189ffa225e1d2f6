mod array;
mod changes;
mod dynamic;
mod error;
mod fetch;
mod field;
mod guess;
mod instance;
mod layout;
mod options;
mod path;
mod scalar;
mod store;
mod union;
mod value;

/// Frozen numeric buffers and the shaped arrays handed to the host.
pub use array::{ArrayData, NdArray};
/// Change-tracking bit vector and the changed predicate.
pub use changes::{ChangeSet, is_changed};
/// Host-side dynamic values.
pub use dynamic::{DynIter, Dynamic};
/// Error and result aliases.
pub use error::{Result, ValueError};
/// Field type descriptors and their builders.
pub use field::{FieldType, ScalarKind, StructBuilder, StructType, UnionBuilder, UnionType};
/// Preorder offset numbering of a field tree.
pub use layout::{Layout, LayoutNode};
/// Store/fetch limits and storage capabilities.
pub use options::ValueOptions;
/// Dotted field path parser.
pub use path::FieldPath;
/// Typed structure container.
pub use value::Value;
