//! One loaded config model for one application, generation and platform version.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use bytes::Bytes;
use confer_primitives::{ApplicationId, ConfigKey, Generation, HostName, Version};

use crate::cache::ServerCache;
use crate::metrics::ApplicationMetrics;
use crate::{Error, Result};

/// A loaded application model able to produce config payloads.
///
/// Built by the session loader; the handler only ever reads from it.
pub trait ConfigModel: Send + Sync + 'static {
	/// Payload for `key`, or `None` if the model does not produce that config.
	fn config_payload(&self, key: &ConfigKey) -> Option<Bytes>;

	/// Every config key the model produces.
	fn config_keys(&self) -> BTreeSet<ConfigKey>;

	/// Hosts the model allocates.
	fn hosts(&self) -> BTreeSet<HostName>;
}

/// A [`ConfigModel`] backed by precomputed payloads.
#[derive(Debug, Clone, Default)]
pub struct MemoryModel {
	configs: BTreeMap<ConfigKey, Bytes>,
	hosts: BTreeSet<HostName>,
}

impl MemoryModel {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces the payload for `key`.
	pub fn with_config(mut self, key: ConfigKey, payload: impl Into<Bytes>) -> Self {
		self.configs.insert(key, payload.into());
		self
	}

	pub fn with_host(mut self, host: impl Into<HostName>) -> Self {
		self.hosts.insert(host.into());
		self
	}
}

impl ConfigModel for MemoryModel {
	fn config_payload(&self, key: &ConfigKey) -> Option<Bytes> {
		self.configs.get(key).cloned()
	}

	fn config_keys(&self) -> BTreeSet<ConfigKey> {
		self.configs.keys().cloned().collect()
	}

	fn hosts(&self) -> BTreeSet<HostName> {
		self.hosts.clone()
	}
}

/// A config request as received from a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetConfigRequest {
	/// Config instance being asked for.
	pub key: ConfigKey,
	/// Platform version of the requesting node; `None` selects the latest loaded model.
	pub vespa_version: Option<Version>,
	/// Bypass the response cache for this request.
	pub no_cache: bool,
}

impl GetConfigRequest {
	pub fn new(key: ConfigKey) -> Self {
		Self {
			key,
			vespa_version: None,
			no_cache: false,
		}
	}

	pub fn version(mut self, version: Version) -> Self {
		self.vespa_version = Some(version);
		self
	}

	pub fn no_cache(mut self) -> Self {
		self.no_cache = true;
		self
	}
}

/// A resolved config payload and the generation it was resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigResponse {
	pub key: ConfigKey,
	pub payload: Bytes,
	pub generation: Generation,
	/// Whether the active deployment was an internal redeploy rather than a user deployment.
	pub internal_redeploy: bool,
}

/// One loaded model for one [`ApplicationId`], [`Generation`] and platform [`Version`].
pub struct Application {
	id: ApplicationId,
	generation: Generation,
	version: Version,
	internal_redeploy: bool,
	model: Arc<dyn ConfigModel>,
	cache: ServerCache,
	metrics: ApplicationMetrics,
}

impl Application {
	/// Wraps a loaded model. The application starts with a default-sized cache
	/// and is not marked as an internal redeploy.
	pub fn new(
		id: ApplicationId,
		generation: Generation,
		version: Version,
		model: Arc<dyn ConfigModel>,
	) -> Self {
		Self {
			id,
			generation,
			version,
			internal_redeploy: false,
			model,
			cache: ServerCache::default(),
			metrics: ApplicationMetrics::default(),
		}
	}

	pub fn internal_redeploy(mut self, internal_redeploy: bool) -> Self {
		self.internal_redeploy = internal_redeploy;
		self
	}

	pub fn cache(mut self, cache: ServerCache) -> Self {
		self.cache = cache;
		self
	}

	pub(crate) fn replace_cache(&mut self, cache: ServerCache) {
		self.cache = cache;
	}

	pub fn id(&self) -> &ApplicationId {
		&self.id
	}

	pub fn generation(&self) -> Generation {
		self.generation
	}

	pub fn version(&self) -> &Version {
		&self.version
	}

	pub fn is_internal_redeploy(&self) -> bool {
		self.internal_redeploy
	}

	pub fn metrics(&self) -> &ApplicationMetrics {
		&self.metrics
	}

	pub fn server_cache(&self) -> &ServerCache {
		&self.cache
	}

	pub fn hosts(&self) -> BTreeSet<HostName> {
		self.model.hosts()
	}

	pub fn all_configs_produced(&self) -> BTreeSet<ConfigKey> {
		self.model.config_keys()
	}

	pub fn all_config_ids(&self) -> BTreeSet<String> {
		self.model
			.config_keys()
			.into_iter()
			.map(|key| key.config_id)
			.collect()
	}

	/// Resolves `req` against this model, consulting the cache unless the
	/// request opts out.
	pub fn resolve_config(&self, req: &GetConfigRequest) -> Result<ConfigResponse> {
		self.metrics.record_request();

		if !req.no_cache {
			if let Some(cached) = self.cache.get(&req.key) {
				self.metrics.record_cache_hit();
				return Ok(cached);
			}
			self.metrics.record_cache_miss();
		}

		let Some(payload) = self.model.config_payload(&req.key) else {
			self.metrics.record_failure();
			return Err(Error::UnknownConfig {
				application: self.id.clone(),
				key: req.key.clone(),
			});
		};

		let response = ConfigResponse {
			key: req.key.clone(),
			payload,
			generation: self.generation,
			internal_redeploy: self.internal_redeploy,
		};
		if !req.no_cache {
			self.cache.put(response.clone());
		}
		Ok(response)
	}
}

impl std::fmt::Debug for Application {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Application")
			.field("id", &self.id)
			.field("generation", &self.generation)
			.field("version", &self.version)
			.field("internal_redeploy", &self.internal_redeploy)
			.finish_non_exhaustive()
	}
}
