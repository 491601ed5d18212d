use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Hostnames are plain strings as reported by the nodes themselves.
pub type HostName = String;

/// Name reserved for the default application and instance.
const DEFAULT_NAME: &str = "default";

/// Name of a tenant, the isolation boundary owning a set of applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantName(String);

impl TenantName {
	/// Creates a tenant name.
	pub fn new(name: impl Into<String>) -> Self {
		Self(name.into())
	}

	/// The reserved `default` tenant.
	pub fn default_name() -> Self {
		Self::new(DEFAULT_NAME)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for TenantName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for TenantName {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for TenantName {
	fn from(value: String) -> Self {
		Self(value)
	}
}

/// Identity of one deployable unit: tenant, application name and instance name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId {
	tenant: TenantName,
	application: String,
	instance: String,
}

/// Error returned when parsing a serialized [`ApplicationId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid application id '{input}': expected 'tenant:application:instance'")]
pub struct ApplicationIdParseError {
	input: String,
}

impl ApplicationId {
	pub fn new(
		tenant: impl Into<TenantName>,
		application: impl Into<String>,
		instance: impl Into<String>,
	) -> Self {
		Self {
			tenant: tenant.into(),
			application: application.into(),
			instance: instance.into(),
		}
	}

	/// The `default` application and instance of `tenant`.
	pub fn default_for(tenant: &TenantName) -> Self {
		Self::new(tenant.clone(), DEFAULT_NAME, DEFAULT_NAME)
	}

	/// The `default` application of the `default` tenant.
	pub fn global_default() -> Self {
		Self::default_for(&TenantName::default_name())
	}

	pub fn tenant(&self) -> &TenantName {
		&self.tenant
	}

	pub fn application(&self) -> &str {
		&self.application
	}

	pub fn instance(&self) -> &str {
		&self.instance
	}

	/// Colon-separated form used as a stable storage key.
	pub fn serialized_form(&self) -> String {
		format!("{}:{}:{}", self.tenant, self.application, self.instance)
	}
}

impl fmt::Display for ApplicationId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}.{}", self.tenant, self.application, self.instance)
	}
}

impl FromStr for ApplicationId {
	type Err = ApplicationIdParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let err = || ApplicationIdParseError { input: s.to_string() };
		let mut parts = s.split(':');
		let (Some(tenant), Some(application), Some(instance), None) =
			(parts.next(), parts.next(), parts.next(), parts.next())
		else {
			return Err(err());
		};
		if tenant.is_empty() || application.is_empty() || instance.is_empty() {
			return Err(err());
		}
		Ok(Self::new(tenant, application, instance))
	}
}

/// Generation of one activated deployment. The session id doubles as the generation.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Generation(pub u64);

impl Generation {
	pub fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for Generation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<u64> for Generation {
	fn from(value: u64) -> Self {
		Self(value)
	}
}
