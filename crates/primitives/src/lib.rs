//! Core value types for the config server: tenant and application identity,
//! generations, platform versions and config keys.

/// Config instance keys.
pub mod config_key;
/// Identifier types for tenants, applications and generations.
pub mod ids;
/// Platform version numbers.
pub mod version;

pub use config_key::ConfigKey;
pub use ids::{ApplicationId, ApplicationIdParseError, Generation, HostName, TenantName};
pub use version::{Version, VersionParseError};
