//! Per-tenant config resolution and reload.
//!
//! # Concurrency
//!
//! The registry of active application sets is an immutable map published
//! through [`ArcSwap`]. Resolvers load the current map without locking and
//! keep the [`ApplicationSet`] they found for the rest of the call, so a
//! reload never tears a resolution in half.
//!
//! Writers ([`TenantRequestHandler::reload_config`] and
//! [`TenantRequestHandler::remove_application`]) serialize on one tenant-wide
//! lock, held across listener callbacks. Listeners must not call back into
//! the write operations of the same handler. Handlers created by a
//! [`crate::TenantRepository`] share one writer lock, so reloads of different
//! tenants cannot claim the same host at once.

mod invariants;
pub mod listing;

use std::collections::BTreeSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use confer_config::{ServerConfig, UnknownHostPolicy};
use confer_primitives::{ApplicationId, ConfigKey, Generation, HostName, TenantName, Version};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::application::{Application, ConfigResponse, GetConfigRequest};
use crate::application_set::ApplicationSet;
use crate::hosts::HostRegistry;
use crate::listener::{ListenerSet, ReloadListener};
use crate::metrics::TenantMetrics;
use crate::{Error, Result};

type ApplicationMap = FxHashMap<ApplicationId, Arc<ApplicationSet>>;

/// Serves config for every deployed application of one tenant.
pub struct TenantRequestHandler {
	tenant: TenantName,
	applications: ArcSwap<ApplicationMap>,
	hosts: HostRegistry,
	listeners: ListenerSet,
	write_lock: Arc<Mutex<()>>,
	unknown_host: UnknownHostPolicy,
	metrics: TenantMetrics,
}

impl TenantRequestHandler {
	/// Creates an empty handler. `listeners` are invoked in the given order.
	pub fn new(
		tenant: impl Into<TenantName>,
		listeners: Vec<Arc<dyn ReloadListener>>,
		config: &ServerConfig,
	) -> Self {
		Self {
			tenant: tenant.into(),
			applications: ArcSwap::from_pointee(ApplicationMap::default()),
			hosts: HostRegistry::new(),
			listeners: ListenerSet::new(listeners),
			write_lock: Arc::default(),
			unknown_host: config.routing.unknown_host,
			metrics: TenantMetrics::default(),
		}
	}

	/// Serializes this handler's writers with every other handler holding `lock`.
	pub(crate) fn with_write_lock(mut self, lock: Arc<Mutex<()>>) -> Self {
		self.write_lock = lock;
		self
	}

	pub fn tenant(&self) -> &TenantName {
		&self.tenant
	}

	pub fn metrics(&self) -> &TenantMetrics {
		&self.metrics
	}

	pub fn host_registry(&self) -> &HostRegistry {
		&self.hosts
	}

	/// Makes `set` the active generation of its application.
	///
	/// The set is checked for host ownership against the other applications
	/// of this tenant, then offered to every listener for veto. A rejection
	/// leaves the previously active set in place. Once the set is published,
	/// listeners are told about the tenant's new host set and the activation,
	/// even when `set` has the same generation as the one it replaces.
	pub fn reload_config(&self, set: ApplicationSet) -> Result<()> {
		let id = set.id().clone();
		if id.tenant() != &self.tenant {
			return Err(Error::InconsistentApplicationSet(format!(
				"{id} does not belong to tenant {}",
				self.tenant
			)));
		}
		let hosts = set.hosts();

		let _write = self.write_lock.lock();

		let conflicts = self.hosts.conflicts(&id, &hosts);
		if !conflicts.is_empty() {
			let reason = describe_conflicts(&conflicts);
			warn!(tenant = %self.tenant, application = %id, %reason, "Reload rejected");
			return Err(Error::HostConflict { application: id, reason });
		}
		self.listeners.verify_hosts(&self.tenant, &id, &hosts)?;

		let set = Arc::new(set);
		let previous = {
			let current = self.applications.load();
			let mut next = ApplicationMap::clone(&current);
			let previous = next.insert(id.clone(), Arc::clone(&set));
			self.applications.store(Arc::new(next));
			previous
		};
		self.hosts.update(&id, hosts);
		self.refresh_metrics();

		info!(
			tenant = %self.tenant,
			application = %id,
			generation = %set.generation(),
			previous = ?previous.map(|old| old.generation()),
			versions = set.versions().count(),
			"Activated application"
		);

		self.listeners.hosts_updated(&self.tenant, &self.hosts.all_hosts());
		self.listeners.config_activated(&set);
		Ok(())
	}

	/// Drops the application and releases its hosts.
	///
	/// Returns `false`, without notifying listeners, if `id` is not registered.
	pub fn remove_application(&self, id: &ApplicationId) -> bool {
		let _write = self.write_lock.lock();

		let current = self.applications.load_full();
		if !current.contains_key(id) {
			debug!(tenant = %self.tenant, application = %id, "Remove of unknown application ignored");
			return false;
		}
		let mut next = ApplicationMap::clone(&current);
		next.remove(id);
		self.applications.store(Arc::new(next));
		let released = self.hosts.remove(id);
		self.refresh_metrics();

		info!(
			tenant = %self.tenant,
			application = %id,
			hosts = released.len(),
			"Removed application"
		);
		self.listeners.application_removed(id);
		true
	}

	/// Resolves `req` against the active generation of `id`.
	pub fn resolve_config(&self, id: &ApplicationId, req: &GetConfigRequest) -> Result<ConfigResponse> {
		let set = self.active_set(id)?;
		let application = set.for_version_or_latest(req.vespa_version.as_ref())?;
		debug!(
			application = %id,
			key = %req.key,
			version = %application.version(),
			generation = %application.generation(),
			"Resolving config"
		);
		application.resolve_config(req)
	}

	/// True if `id` is registered and, when `version` is given, has a model serving it.
	pub fn has_application(&self, id: &ApplicationId, version: Option<&Version>) -> bool {
		self.active_set(id)
			.is_ok_and(|set| set.for_version_or_latest(version).is_ok())
	}

	pub fn application_generation(
		&self,
		id: &ApplicationId,
		version: Option<&Version>,
	) -> Result<Generation> {
		let set = self.active_set(id)?;
		Ok(set.for_version_or_latest(version)?.generation())
	}

	/// Application owning `hostname`.
	///
	/// Hosts without a mapping resolve to a default identity chosen by the
	/// configured [`UnknownHostPolicy`].
	pub fn resolve_application_id(&self, hostname: &str) -> ApplicationId {
		if let Some(id) = self.hosts.key_for_host(hostname) {
			return id;
		}
		let fallback = match self.unknown_host {
			UnknownHostPolicy::TenantDefault => ApplicationId::default_for(&self.tenant),
			UnknownHostPolicy::GlobalDefault => ApplicationId::global_default(),
		};
		debug!(tenant = %self.tenant, hostname, application = %fallback, "Unknown host routed to default");
		fallback
	}

	/// Every config key produced by the selected model.
	///
	/// Non-recursive listings cut config ids to their first segment and
	/// collapse duplicates.
	pub fn list_configs(
		&self,
		id: &ApplicationId,
		version: Option<&Version>,
		recursive: bool,
	) -> Result<BTreeSet<ConfigKey>> {
		let application = self.select(id, version)?;
		Ok(listing::list_keys(application.all_configs_produced(), recursive))
	}

	/// Config keys of the same definition as `key_to_match` whose ids lie below its id.
	pub fn list_named_configs(
		&self,
		id: &ApplicationId,
		version: Option<&Version>,
		key_to_match: &ConfigKey,
		recursive: bool,
	) -> Result<BTreeSet<ConfigKey>> {
		let application = self.select(id, version)?;
		Ok(listing::list_named_keys(
			application.all_configs_produced(),
			key_to_match,
			recursive,
		))
	}

	pub fn all_config_ids(&self, id: &ApplicationId, version: Option<&Version>) -> Result<BTreeSet<String>> {
		Ok(self.select(id, version)?.all_config_ids())
	}

	/// Registered application ids, sorted.
	pub fn application_ids(&self) -> Vec<ApplicationId> {
		let mut ids: Vec<_> = self.applications.load().keys().cloned().collect();
		ids.sort();
		ids
	}

	pub fn application_count(&self) -> usize {
		self.applications.load().len()
	}

	/// Active set of `id`, if registered.
	pub fn application_set(&self, id: &ApplicationId) -> Option<Arc<ApplicationSet>> {
		self.applications.load().get(id).cloned()
	}

	pub fn hosts_for(&self, id: &ApplicationId) -> BTreeSet<HostName> {
		self.hosts.hosts_for(id)
	}

	pub fn all_hosts(&self) -> BTreeSet<HostName> {
		self.hosts.all_hosts()
	}

	/// See [`listing::append_one_level_of_id`].
	pub fn append_one_level_of_id(&self, prefix: &str, full_id: &str) -> String {
		listing::append_one_level_of_id(prefix, full_id)
	}

	fn active_set(&self, id: &ApplicationId) -> Result<Arc<ApplicationSet>> {
		self.application_set(id)
			.ok_or_else(|| Error::ApplicationNotFound(id.clone()))
	}

	fn select(&self, id: &ApplicationId, version: Option<&Version>) -> Result<Arc<Application>> {
		let set = self.active_set(id)?;
		set.for_version_or_latest(version).cloned()
	}

	fn refresh_metrics(&self) {
		self.metrics
			.set(self.applications.load().len(), self.hosts.host_count());
	}
}

fn describe_conflicts(conflicts: &[(HostName, ApplicationId)]) -> String {
	conflicts
		.iter()
		.map(|(host, owner)| format!("{host} is owned by {owner}"))
		.collect::<Vec<_>>()
		.join(", ")
}

impl std::fmt::Debug for TenantRequestHandler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TenantRequestHandler")
			.field("tenant", &self.tenant)
			.field("applications", &self.applications.load().len())
			.field("hosts", &self.hosts.host_count())
			.field("listeners", &self.listeners.len())
			.finish_non_exhaustive()
	}
}
