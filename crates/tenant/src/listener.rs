//! Reload listener contract.

use std::collections::BTreeSet;
use std::sync::Arc;

use confer_primitives::{ApplicationId, HostName, TenantName};
use tracing::warn;

use crate::application_set::ApplicationSet;
use crate::{BoxError, Error, Result};

/// Outcome of [`ReloadListener::verify_hosts_are_available`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostVerdict {
	Accepted,
	/// The pending reload must not take effect.
	Rejected(String),
}

/// Observer of activation, removal and host-set changes of one tenant.
///
/// Every method runs synchronously on the thread calling
/// [`crate::TenantRequestHandler::reload_config`] or
/// [`crate::TenantRequestHandler::remove_application`]. Only
/// [`Self::verify_hosts_are_available`] can stop a change; errors from the
/// other callbacks are logged and never undo committed state.
pub trait ReloadListener: Send + Sync {
	/// Called before a reload commits, with the hosts of the incoming set.
	fn verify_hosts_are_available(
		&self,
		_tenant: &TenantName,
		_hosts: &BTreeSet<HostName>,
	) -> HostVerdict {
		HostVerdict::Accepted
	}

	/// Called after a reload commits, with every host of the tenant.
	fn hosts_updated(&self, _tenant: &TenantName, _hosts: &BTreeSet<HostName>) -> Result<(), BoxError> {
		Ok(())
	}

	/// Called once per successful reload, even when the generation did not change.
	fn config_activated(&self, _set: &ApplicationSet) -> Result<(), BoxError> {
		Ok(())
	}

	/// Called once when a registered application is removed.
	fn application_removed(&self, _id: &ApplicationId) -> Result<(), BoxError> {
		Ok(())
	}
}

/// Listeners of one handler, invoked in registration order.
#[derive(Default, Clone)]
pub(crate) struct ListenerSet {
	listeners: Vec<Arc<dyn ReloadListener>>,
}

impl ListenerSet {
	pub(crate) fn new(listeners: Vec<Arc<dyn ReloadListener>>) -> Self {
		Self { listeners }
	}

	pub(crate) fn len(&self) -> usize {
		self.listeners.len()
	}

	/// Asks every listener in turn; the first rejection wins.
	pub(crate) fn verify_hosts(
		&self,
		tenant: &TenantName,
		application: &ApplicationId,
		hosts: &BTreeSet<HostName>,
	) -> Result<()> {
		for (index, listener) in self.listeners.iter().enumerate() {
			if let HostVerdict::Rejected(reason) = listener.verify_hosts_are_available(tenant, hosts) {
				warn!(%tenant, %application, listener = index, %reason, "Reload vetoed by listener");
				return Err(Error::HostConflict {
					application: application.clone(),
					reason,
				});
			}
		}
		Ok(())
	}

	pub(crate) fn hosts_updated(&self, tenant: &TenantName, hosts: &BTreeSet<HostName>) {
		self.notify("hosts_updated", |listener| listener.hosts_updated(tenant, hosts));
	}

	pub(crate) fn config_activated(&self, set: &ApplicationSet) {
		self.notify("config_activated", |listener| listener.config_activated(set));
	}

	pub(crate) fn application_removed(&self, id: &ApplicationId) {
		self.notify("application_removed", |listener| listener.application_removed(id));
	}

	fn notify(
		&self,
		event: &'static str,
		mut f: impl FnMut(&dyn ReloadListener) -> Result<(), BoxError>,
	) {
		for (index, listener) in self.listeners.iter().enumerate() {
			if let Err(error) = f(listener.as_ref()) {
				warn!(event, listener = index, %error, "Reload listener failed");
			}
		}
	}
}

impl std::fmt::Debug for ListenerSet {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ListenerSet")
			.field("len", &self.listeners.len())
			.finish()
	}
}
