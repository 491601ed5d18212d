//! Owner of every tenant's request handler.

use std::collections::BTreeSet;
use std::sync::{Arc, Weak};

use confer_config::ServerConfig;
use confer_primitives::{HostName, TenantName};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::handler::TenantRequestHandler;
use crate::listener::{HostVerdict, ReloadListener};

type TenantMap = FxHashMap<TenantName, Arc<TenantRequestHandler>>;

/// Explicit map of tenant name to handler.
///
/// Every handler created here gets a [`TenantHostGuard`] as its first
/// listener, so no two tenants can claim the same host. The handlers share
/// one writer lock, so the guard's check and the commit it approves are not
/// interleaved with a reload of another tenant.
#[derive(Debug)]
pub struct TenantRepository {
	tenants: Arc<RwLock<TenantMap>>,
	claims: Arc<Mutex<()>>,
	config: ServerConfig,
}

impl TenantRepository {
	pub fn new(config: ServerConfig) -> Self {
		Self {
			tenants: Arc::new(RwLock::new(TenantMap::default())),
			claims: Arc::default(),
			config,
		}
	}

	pub fn config(&self) -> &ServerConfig {
		&self.config
	}

	/// Creates the handler of `name`, or returns the existing one.
	///
	/// `listeners` run after the repository's host guard. They are ignored if
	/// the tenant already exists.
	pub fn add_tenant(
		&self,
		name: impl Into<TenantName>,
		listeners: Vec<Arc<dyn ReloadListener>>,
	) -> Arc<TenantRequestHandler> {
		let name = name.into();
		let mut tenants = self.tenants.write();
		if let Some(existing) = tenants.get(&name) {
			debug!(tenant = %name, "Tenant already exists");
			return Arc::clone(existing);
		}

		let guard: Arc<dyn ReloadListener> = Arc::new(TenantHostGuard {
			tenant: name.clone(),
			tenants: Arc::downgrade(&self.tenants),
		});
		let all = std::iter::once(guard).chain(listeners).collect();
		let handler = Arc::new(
			TenantRequestHandler::new(name.clone(), all, &self.config)
				.with_write_lock(Arc::clone(&self.claims)),
		);
		tenants.insert(name.clone(), Arc::clone(&handler));
		info!(tenant = %name, tenants = tenants.len(), "Added tenant");
		handler
	}

	pub fn get(&self, name: &TenantName) -> Option<Arc<TenantRequestHandler>> {
		self.tenants.read().get(name).cloned()
	}

	/// Drops the handler of `name`. Its hosts become free for other tenants.
	pub fn remove_tenant(&self, name: &TenantName) -> Option<Arc<TenantRequestHandler>> {
		let removed = self.tenants.write().remove(name);
		if removed.is_some() {
			info!(tenant = %name, "Removed tenant");
		}
		removed
	}

	/// Names of every tenant, sorted.
	pub fn tenant_names(&self) -> Vec<TenantName> {
		let mut names: Vec<_> = self.tenants.read().keys().cloned().collect();
		names.sort();
		names
	}

	/// Tenant owning `hostname`, if any.
	///
	/// Should a host ever be indexed by several tenants, the smallest tenant
	/// name wins.
	pub fn tenant_for_host(&self, hostname: &str) -> Option<TenantName> {
		self.tenants
			.read()
			.iter()
			.filter(|(_, handler)| handler.host_registry().key_for_host(hostname).is_some())
			.map(|(name, _)| name)
			.min()
			.cloned()
	}
}

/// Listener rejecting hosts already owned by another tenant of a [`TenantRepository`].
///
/// Checks the live host index of every other tenant, so hosts are released
/// as soon as their application or tenant is removed. The check is only
/// race free for handlers sharing the repository's writer lock.
pub struct TenantHostGuard {
	tenant: TenantName,
	tenants: Weak<RwLock<TenantMap>>,
}

impl ReloadListener for TenantHostGuard {
	fn verify_hosts_are_available(
		&self,
		tenant: &TenantName,
		hosts: &BTreeSet<HostName>,
	) -> HostVerdict {
		let Some(tenants) = self.tenants.upgrade() else {
			return HostVerdict::Accepted;
		};
		let tenants = tenants.read();
		for (name, handler) in tenants.iter() {
			if name == tenant || name == &self.tenant {
				continue;
			}
			if let Some((host, owner)) = handler.host_registry().owners(hosts).into_iter().next() {
				return HostVerdict::Rejected(format!(
					"{host} is owned by {owner} of tenant {name}"
				));
			}
		}
		HostVerdict::Accepted
	}
}

impl std::fmt::Debug for TenantHostGuard {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TenantHostGuard")
			.field("tenant", &self.tenant)
			.finish_non_exhaustive()
	}
}
