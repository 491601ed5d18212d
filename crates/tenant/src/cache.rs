//! Per-application cache of resolved config responses.

use std::num::NonZeroUsize;

use confer_config::CacheConfig;
use confer_primitives::ConfigKey;
use lru::LruCache;
use parking_lot::Mutex;

use crate::application::ConfigResponse;

/// Bounded LRU of resolved responses for one loaded [`crate::Application`].
///
/// Every application starts with its own empty cache, so a new generation
/// never serves payloads resolved against the previous one.
pub struct ServerCache {
	entries: Option<Mutex<LruCache<ConfigKey, ConfigResponse>>>,
}

impl ServerCache {
	/// Creates a cache sized by `config`; a disabled or zero-capacity config
	/// yields a cache that stores nothing.
	pub fn new(config: &CacheConfig) -> Self {
		let entries = config
			.enabled
			.then(|| NonZeroUsize::new(config.capacity))
			.flatten()
			.map(|capacity| Mutex::new(LruCache::new(capacity)));
		Self { entries }
	}

	/// A cache that never stores anything.
	pub fn disabled() -> Self {
		Self { entries: None }
	}

	pub fn is_enabled(&self) -> bool {
		self.entries.is_some()
	}

	pub fn get(&self, key: &ConfigKey) -> Option<ConfigResponse> {
		self.entries.as_ref()?.lock().get(key).cloned()
	}

	pub fn put(&self, response: ConfigResponse) {
		if let Some(entries) = &self.entries {
			entries.lock().put(response.key.clone(), response);
		}
	}

	pub fn len(&self) -> usize {
		self.entries.as_ref().map_or(0, |entries| entries.lock().len())
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn clear(&self) {
		if let Some(entries) = &self.entries {
			entries.lock().clear();
		}
	}
}

impl Default for ServerCache {
	fn default() -> Self {
		Self::new(&CacheConfig::default())
	}
}

impl std::fmt::Debug for ServerCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ServerCache")
			.field("enabled", &self.is_enabled())
			.field("len", &self.len())
			.finish()
	}
}
