//! Generation-stamped bundle of platform-version variants of one application.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use confer_config::CacheConfig;
use confer_primitives::{ApplicationId, Generation, HostName, Version};
use tracing::debug;

use crate::application::Application;
use crate::cache::ServerCache;
use crate::{Error, Result};

/// Every loaded variant of one application for one generation, keyed by platform version.
///
/// Immutable once built. A reload replaces the whole set rather than mutating it.
#[derive(Debug)]
pub struct ApplicationSet {
	id: ApplicationId,
	generation: Generation,
	applications: BTreeMap<Version, Arc<Application>>,
}

impl ApplicationSet {
	pub fn from_single(application: Application) -> Self {
		Self {
			id: application.id().clone(),
			generation: application.generation(),
			applications: BTreeMap::from([(
				application.version().clone(),
				Arc::new(application),
			)]),
		}
	}

	/// Bundles `applications` into one set.
	///
	/// All applications must share identity and generation, and no two may
	/// have the same platform version.
	pub fn from_list(applications: impl IntoIterator<Item = Application>) -> Result<Self> {
		let mut iter = applications.into_iter();
		let first = iter.next().ok_or_else(|| {
			Error::InconsistentApplicationSet("no applications to bundle".into())
		})?;

		let mut set = Self::from_single(first);
		for application in iter {
			if application.id() != &set.id {
				return Err(Error::InconsistentApplicationSet(format!(
					"application {} does not belong to {}",
					application.id(),
					set.id
				)));
			}
			if application.generation() != set.generation {
				return Err(Error::InconsistentApplicationSet(format!(
					"generation {} of {} differs from {}",
					application.generation(),
					set.id,
					set.generation
				)));
			}
			let version = application.version().clone();
			if set.applications.contains_key(&version) {
				return Err(Error::InconsistentApplicationSet(format!(
					"version {version} of {} loaded twice",
					set.id
				)));
			}
			set.applications.insert(version, Arc::new(application));
		}
		Ok(set)
	}

	pub fn id(&self) -> &ApplicationId {
		&self.id
	}

	pub fn generation(&self) -> Generation {
		self.generation
	}

	/// Selects the model serving `requested`: the exact version if loaded,
	/// otherwise the highest loaded version below it.
	pub fn for_version(&self, requested: &Version) -> Result<&Arc<Application>> {
		self.applications
			.range(..=requested)
			.next_back()
			.map(|(_, application)| application)
			.ok_or_else(|| Error::UnknownVespaVersion {
				application: self.id.clone(),
				requested: requested.clone(),
				available: self.applications.keys().cloned().collect(),
			})
	}

	/// Like [`Self::for_version`], but a missing version selects the latest model.
	pub fn for_version_or_latest(&self, requested: Option<&Version>) -> Result<&Arc<Application>> {
		match requested {
			Some(version) => self.for_version(version),
			None => Ok(self.latest()),
		}
	}

	pub fn latest_version(&self) -> &Version {
		self.latest().version()
	}

	fn latest(&self) -> &Arc<Application> {
		// Construction guarantees at least one entry.
		match self.applications.last_key_value() {
			Some((_, application)) => application,
			None => unreachable!("application set {} is empty", self.id),
		}
	}

	pub fn versions(&self) -> impl Iterator<Item = &Version> {
		self.applications.keys()
	}

	pub fn applications(&self) -> impl Iterator<Item = &Arc<Application>> {
		self.applications.values()
	}

	/// Gives every application of this set a fresh cache sized by `config`.
	///
	/// Applications whose `Arc` is already shared outside the set keep the
	/// cache they were built with.
	pub(crate) fn apply_cache_config(&mut self, config: &CacheConfig) {
		for (version, application) in &mut self.applications {
			match Arc::get_mut(application) {
				Some(application) => application.replace_cache(ServerCache::new(config)),
				None => debug!(application = %self.id, %version, "Shared application keeps its cache"),
			}
		}
	}

	/// Union of hosts across all loaded versions.
	pub fn hosts(&self) -> BTreeSet<HostName> {
		self.applications
			.values()
			.flat_map(|application| application.hosts())
			.collect()
	}
}
