//! Tenant-scoped config resolution and reload engine.
//!
//! One [`TenantRequestHandler`] per tenant holds the active
//! [`ApplicationSet`] of every deployed application of that tenant, swaps in
//! new generations atomically when a deployment is activated, resolves config
//! requests against the active generation by platform version, and keeps a
//! hostname index nodes use to find out which application they belong to.
//!
//! The surrounding collaborators are modelled as traits:
//!
//! - [`CoordinationStore`]: records which session is active per application
//!   and notifies on change. [`MemoryStore`] is the in-process implementation.
//! - [`SessionLoader`]: turns a session id into a loaded [`ApplicationSet`].
//! - [`ConfigModel`]: the loaded model an [`Application`] serves payloads from.
//! - [`ReloadListener`]: observers of activation, removal and host changes,
//!   with veto power over host changes.
//!
//! [`ApplicationWatcher`] glues the store and loader to a handler, and
//! [`TenantRepository`] owns one handler per tenant.

mod application;
mod application_set;
mod cache;
mod handler;
mod hosts;
mod listener;
pub mod metrics;
mod repository;
mod store;
#[cfg(test)]
mod test_support;
mod watcher;

use confer_primitives::{ApplicationId, ConfigKey, Generation, Version};

pub use application::{Application, ConfigModel, ConfigResponse, GetConfigRequest, MemoryModel};
pub use application_set::ApplicationSet;
pub use cache::ServerCache;
pub use handler::TenantRequestHandler;
pub use handler::listing::append_one_level_of_id;
pub use hosts::HostRegistry;
pub use listener::{HostVerdict, ReloadListener};
pub use repository::{TenantHostGuard, TenantRepository};
pub use store::{CoordinationStore, MemoryStore, StoreError, StoreEvent, Transaction, TransactionOp};
pub use watcher::{ApplicationWatcher, SessionLoader};

/// Boxed error returned by external collaborators (loaders, listeners).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// No application set is registered for the identity.
	#[error("no application registered for {0}")]
	ApplicationNotFound(ApplicationId),
	/// The registered generation has no model compatible with the requested version.
	#[error("no model for version {requested} in {application} (loaded: {})", join_versions(.available))]
	UnknownVespaVersion {
		application: ApplicationId,
		requested: Version,
		available: Vec<Version>,
	},
	/// A reload was vetoed because its hosts are owned elsewhere.
	#[error("hosts of {application} are not available: {reason}")]
	HostConflict { application: ApplicationId, reason: String },
	/// The resolved model does not produce the requested config.
	#[error("{application} does not produce config {key}")]
	UnknownConfig { application: ApplicationId, key: ConfigKey },
	/// Applications handed to [`ApplicationSet::from_list`] do not belong together.
	#[error("inconsistent application set: {0}")]
	InconsistentApplicationSet(String),
	/// The session loader failed to produce an application set.
	#[error("failed to load session {session} of {application}: {source}")]
	SessionLoad {
		application: ApplicationId,
		session: Generation,
		#[source]
		source: BoxError,
	},
	/// A coordination store transaction failed.
	#[error(transparent)]
	Store(#[from] StoreError),
}

fn join_versions(versions: &[Version]) -> String {
	if versions.is_empty() {
		return "none".into();
	}
	versions
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join(", ")
}
