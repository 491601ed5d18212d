use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Platform version of a loaded config model, `major.minor.micro[.qualifier]`.
///
/// Ordering is numeric on the three components, then lexicographic on the
/// qualifier, so `1.2.3` sorts before `1.2.3.rc1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
	major: u32,
	minor: u32,
	micro: u32,
	qualifier: String,
}

/// Error returned when a version string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
	#[error("empty version string")]
	Empty,
	#[error("invalid numeric component '{component}' in version '{input}'")]
	InvalidComponent { input: String, component: String },
	#[error("too many components in version '{0}'")]
	TooManyComponents(String),
	#[error("empty qualifier in version '{0}'")]
	EmptyQualifier(String),
}

impl Version {
	pub const fn new(major: u32, minor: u32, micro: u32) -> Self {
		Self {
			major,
			minor,
			micro,
			qualifier: String::new(),
		}
	}

	pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
		self.qualifier = qualifier.into();
		self
	}

	pub fn major(&self) -> u32 {
		self.major
	}

	pub fn minor(&self) -> u32 {
		self.minor
	}

	pub fn micro(&self) -> u32 {
		self.micro
	}

	pub fn qualifier(&self) -> &str {
		&self.qualifier
	}
}

impl fmt::Display for Version {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
		if !self.qualifier.is_empty() {
			write!(f, ".{}", self.qualifier)?;
		}
		Ok(())
	}
}

impl FromStr for Version {
	type Err = VersionParseError;

	/// Missing trailing components default to zero: `"7"` parses as `7.0.0`.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		if trimmed.is_empty() {
			return Err(VersionParseError::Empty);
		}

		let mut parts = trimmed.splitn(4, '.');
		let mut numbers = [0u32; 3];
		for slot in numbers.iter_mut() {
			let Some(part) = parts.next() else { break };
			*slot = part
				.parse()
				.map_err(|_| VersionParseError::InvalidComponent {
					input: s.to_string(),
					component: part.to_string(),
				})?;
		}

		let qualifier = match parts.next() {
			None => "",
			Some("") => return Err(VersionParseError::EmptyQualifier(s.to_string())),
			Some(qualifier) if qualifier.contains('.') => {
				return Err(VersionParseError::TooManyComponents(s.to_string()));
			}
			Some(qualifier) => qualifier,
		};

		let [major, minor, micro] = numbers;
		Ok(Self::new(major, minor, micro).with_qualifier(qualifier))
	}
}

impl TryFrom<String> for Version {
	type Error = VersionParseError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<Version> for String {
	fn from(value: Version) -> Self {
		value.to_string()
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case("7.1.0", Version::new(7, 1, 0))]
	#[case("3.2.1", Version::new(3, 2, 1))]
	#[case("7", Version::new(7, 0, 0))]
	#[case("7.4", Version::new(7, 4, 0))]
	#[case(" 1.0.0 ", Version::new(1, 0, 0))]
	#[case("1.2.3.rc1", Version::new(1, 2, 3).with_qualifier("rc1"))]
	fn test_parse(#[case] input: &str, #[case] expected: Version) {
		assert_eq!(input.parse::<Version>().unwrap(), expected);
	}

	#[rstest]
	#[case("")]
	#[case("x.1.0")]
	#[case("1.-2.0")]
	#[case("1.2.3.rc1.extra")]
	#[case("1.2.3.")]
	#[case("7.")]
	fn test_parse_rejects(#[case] input: &str) {
		assert!(input.parse::<Version>().is_err());
	}

	#[test]
	fn test_trailing_dot_is_empty_qualifier() {
		assert_eq!(
			"1.2.3.".parse::<Version>(),
			Err(VersionParseError::EmptyQualifier("1.2.3.".to_string()))
		);
	}

	#[test]
	fn test_ordering() {
		let mut versions = vec![
			Version::new(3, 2, 1),
			Version::new(1, 0, 0),
			Version::new(1, 0, 0).with_qualifier("rc1"),
			Version::new(1, 10, 0),
		];
		versions.sort();
		assert_eq!(
			versions,
			vec![
				Version::new(1, 0, 0),
				Version::new(1, 0, 0).with_qualifier("rc1"),
				Version::new(1, 10, 0),
				Version::new(3, 2, 1),
			]
		);
	}

	#[test]
	fn test_serde_as_string() {
		let json = serde_json::to_string(&Version::new(7, 1, 0)).unwrap();
		assert_eq!(json, "\"7.1.0\"");
		let back: Version = serde_json::from_str(&json).unwrap();
		assert_eq!(back, Version::new(7, 1, 0));
		assert!(serde_json::from_str::<Version>("\"seven\"").is_err());
	}

	proptest! {
		#[test]
		fn prop_display_parses_back(major in 0u32..1000, minor in 0u32..1000, micro in 0u32..1000, qualifier in "[a-z0-9]{0,6}") {
			let version = Version::new(major, minor, micro).with_qualifier(qualifier);
			prop_assert_eq!(version.to_string().parse::<Version>().unwrap(), version);
		}
	}
}
