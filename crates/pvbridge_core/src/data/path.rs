use crate::data::{Result, ValueError};

/// Parsed dotted field path, relative to a structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
	/// Field names from outermost to innermost.
	pub segments: Vec<String>,
}

impl FieldPath {
	/// Parse `name(.name)*` where each name is `[A-Za-z0-9_]+`.
	pub fn parse(input: &str) -> Result<Self> {
		if input.is_empty() {
			return Err(ValueError::InvalidFieldPath { path: input.to_owned() });
		}

		let bytes = input.as_bytes();
		let mut idx = 0_usize;
		let mut segments = Vec::new();

		while idx < bytes.len() {
			let start = idx;
			while idx < bytes.len() && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_') {
				idx += 1;
			}

			if idx == start {
				return Err(ValueError::InvalidFieldPath { path: input.to_owned() });
			}
			segments.push(input[start..idx].to_owned());

			if idx < bytes.len() {
				if bytes[idx] != b'.' {
					return Err(ValueError::InvalidFieldPath { path: input.to_owned() });
				}
				idx += 1;
				if idx >= bytes.len() {
					return Err(ValueError::InvalidFieldPath { path: input.to_owned() });
				}
			}
		}

		Ok(Self { segments })
	}
}

#[cfg(test)]
mod tests {
	use super::FieldPath;

	#[test]
	fn dotted_path_splits_into_segments() {
		let path = FieldPath::parse("alarm.severity").expect("path parses");
		assert_eq!(path.segments, ["alarm", "severity"]);
	}

	#[test]
	fn malformed_paths_are_rejected() {
		for input in ["", ".a", "a.", "a..b", "a[0]", "a b"] {
			assert!(FieldPath::parse(input).is_err(), "{input:?} should be rejected");
		}
	}
}
