use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one config instance inside a loaded application model.
///
/// `config_id` is a `/`-delimited path such as `search/music/qrservers/default/qr.0`.
/// Ordering is by namespace, then name, then config id, which gives listings a
/// stable, readable order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigKey {
	pub namespace: String,
	pub name: String,
	pub config_id: String,
}

impl ConfigKey {
	pub fn new(
		name: impl Into<String>,
		config_id: impl Into<String>,
		namespace: impl Into<String>,
	) -> Self {
		Self {
			namespace: namespace.into(),
			name: name.into(),
			config_id: config_id.into(),
		}
	}

	/// Same definition, different config id.
	pub fn with_config_id(&self, config_id: impl Into<String>) -> Self {
		Self {
			namespace: self.namespace.clone(),
			name: self.name.clone(),
			config_id: config_id.into(),
		}
	}

	/// True if both keys name the same config definition.
	pub fn same_definition(&self, other: &Self) -> bool {
		self.name == other.name && self.namespace == other.namespace
	}
}

impl Ord for ConfigKey {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		(&self.namespace, &self.name, &self.config_id).cmp(&(
			&other.namespace,
			&other.name,
			&other.config_id,
		))
	}
}

impl PartialOrd for ConfigKey {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl fmt::Display for ConfigKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{},{}", self.namespace, self.name, self.config_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display() {
		let key = ConfigKey::new("sentinel", "hosts/myhost", "cloud.config");
		assert_eq!(key.to_string(), "cloud.config.sentinel,hosts/myhost");
	}

	#[test]
	fn test_same_definition_ignores_config_id() {
		let a = ConfigKey::new("documentmanager", "container", "document.config");
		let b = a.with_config_id("");
		assert!(a.same_definition(&b));
		assert_ne!(a, b);
		assert!(!a.same_definition(&ConfigKey::new("documentmanager", "container", "other")));
	}
}
