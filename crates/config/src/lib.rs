//! Configuration for the confer config server.
//!
//! Configuration is written in TOML. Every section is optional; missing
//! fields fall back to the defaults documented on each type.
//!
//! # Schema
//!
//! ```toml
//! # Per-application response cache
//! [cache]
//! enabled = true
//! capacity = 1024
//!
//! # Host self-identification
//! [routing]
//! unknown-host = "tenant-default"   # or "global-default"
//!
//! # Platform versions the session loader builds models for
//! [versions]
//! supported = ["7.1.0", "3.2.1"]
//! ```

pub mod error;

use std::path::Path;

use confer_primitives::Version;
pub use error::{ConfigError, Result};
use serde::{Deserialize, Serialize};

/// Parsed server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
	/// Response cache settings.
	pub cache: CacheConfig,
	/// Hostname resolution settings.
	pub routing: RoutingConfig,
	/// Platform version settings.
	pub versions: VersionsConfig,
}

/// Settings for the per-application config response cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
	/// Whether resolved responses are cached at all.
	pub enabled: bool,
	/// Maximum cached responses per loaded application.
	pub capacity: usize,
}

impl Default for CacheConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			capacity: 1024,
		}
	}
}

/// Settings for hostname to application resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct RoutingConfig {
	/// Where hosts without a published mapping are routed.
	pub unknown_host: UnknownHostPolicy,
}

/// Fallback identity for hosts missing from the host index.
///
/// Nodes bootstrap before their host mapping is published, so an unknown
/// host is routed rather than rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownHostPolicy {
	/// The `default` application of the resolving tenant.
	#[default]
	TenantDefault,
	/// The `default` application of the `default` tenant.
	GlobalDefault,
}

/// Platform versions served by this config server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VersionsConfig {
	/// Versions the session loader should build models for. Empty means
	/// "whatever the loader supports".
	pub supported: Vec<Version>,
}

impl ServerConfig {
	/// Parses and validates configuration from a TOML string.
	pub fn from_toml_str(input: &str) -> Result<Self> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads, parses and validates a configuration file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}

	/// Checks cross-field constraints serde cannot express.
	pub fn validate(&self) -> Result<()> {
		if self.cache.enabled && self.cache.capacity == 0 {
			return Err(ConfigError::InvalidValue {
				field: "cache.capacity",
				reason: "must be positive when the cache is enabled".into(),
			});
		}

		let mut versions = self.versions.supported.clone();
		versions.sort();
		if let Some(pair) = versions.windows(2).find(|pair| pair[0] == pair[1]) {
			return Err(ConfigError::InvalidValue {
				field: "versions.supported",
				reason: format!("version {} listed more than once", pair[0]),
			});
		}

		Ok(())
	}
}
