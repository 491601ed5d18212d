//! Drives a [`TenantRequestHandler`] from coordination store events.

use std::sync::Arc;

use confer_config::{CacheConfig, ServerConfig};
use confer_primitives::{ApplicationId, Generation, Version};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application_set::ApplicationSet;
use crate::handler::TenantRequestHandler;
use crate::store::{CoordinationStore, StoreEvent};
use crate::{BoxError, Error, Result};

/// Turns an activated session into a loaded [`ApplicationSet`].
///
/// Loading happens before the handler is touched, so a slow loader never
/// blocks config resolution.
pub trait SessionLoader: Send + Sync {
	/// Builds one model per entry of `versions` for session `session` of `id`.
	/// An empty `versions` leaves the choice to the loader.
	fn load(
		&self,
		id: &ApplicationId,
		session: Generation,
		versions: &[Version],
	) -> Result<ApplicationSet, BoxError>;
}

/// Applies store events of one tenant to its handler.
///
/// Every loaded application gets a response cache sized by the `[cache]`
/// section of the server config, whatever cache the loader built it with.
pub struct ApplicationWatcher {
	handler: Arc<TenantRequestHandler>,
	loader: Arc<dyn SessionLoader>,
	versions: Vec<Version>,
	cache: CacheConfig,
}

impl ApplicationWatcher {
	pub fn new(
		handler: Arc<TenantRequestHandler>,
		loader: Arc<dyn SessionLoader>,
		config: &ServerConfig,
	) -> Self {
		Self {
			handler,
			loader,
			versions: config.versions.supported.clone(),
			cache: config.cache.clone(),
		}
	}

	pub fn handler(&self) -> &Arc<TenantRequestHandler> {
		&self.handler
	}

	/// Applies one event. Events of other tenants are ignored.
	pub fn handle(&self, event: &StoreEvent) -> Result<()> {
		if event.id().tenant() != self.handler.tenant() {
			return Ok(());
		}
		match event {
			StoreEvent::SessionActivated { id, session } => self.activate(id, *session),
			StoreEvent::ApplicationDeleted { id } => {
				self.handler.remove_application(id);
				Ok(())
			}
		}
	}

	/// Loads and activates the current session of every application in `store`.
	///
	/// Returns how many applications were activated. Failures are logged and
	/// skipped so one broken session does not keep the rest offline.
	pub fn bootstrap(&self, store: &dyn CoordinationStore) -> usize {
		let mut activated = 0;
		for id in store.application_ids() {
			if id.tenant() != self.handler.tenant() {
				continue;
			}
			let Some(session) = store.active_session(&id) else {
				debug!(application = %id, "No active session to bootstrap");
				continue;
			};
			match self.activate(&id, session) {
				Ok(()) => activated += 1,
				Err(error) => warn!(application = %id, %session, %error, "Bootstrap activation failed"),
			}
		}
		info!(tenant = %self.handler.tenant(), activated, "Bootstrapped tenant");
		activated
	}

	/// Applies events until every sender of `events` is gone.
	pub async fn run(self, mut events: mpsc::UnboundedReceiver<StoreEvent>) {
		while let Some(event) = events.recv().await {
			if let Err(error) = self.handle(&event) {
				warn!(application = %event.id(), %error, "Failed to apply store event");
			}
		}
		debug!(tenant = %self.handler.tenant(), "Store event stream closed");
	}

	fn activate(&self, id: &ApplicationId, session: Generation) -> Result<()> {
		let mut set = self
			.loader
			.load(id, session, &self.versions)
			.map_err(|source| Error::SessionLoad {
				application: id.clone(),
				session,
				source,
			})?;
		if set.id() != id || set.generation() != session {
			return Err(Error::InconsistentApplicationSet(format!(
				"loader returned {} generation {} for {id} session {session}",
				set.id(),
				set.generation()
			)));
		}
		set.apply_cache_config(&self.cache);
		self.handler.reload_config(set)
	}
}

impl std::fmt::Debug for ApplicationWatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ApplicationWatcher")
			.field("tenant", self.handler.tenant())
			.field("versions", &self.versions)
			.field("cache", &self.cache)
			.finish_non_exhaustive()
	}
}
