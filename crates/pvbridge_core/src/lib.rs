//! Typed structured values with change tracking, built from and read back as dynamic host values.

/// Field descriptors, the value container, and the store/fetch engines behind it.
pub mod data;
