/// Value construction command.
pub mod build;
/// CLI error type.
pub mod error;
/// Field layout listing command.
pub mod fields;
/// Variant type inference command.
pub mod guess;
/// JSON encodings for values and descriptors.
pub mod json;
/// Shared command helpers.
pub mod util;
