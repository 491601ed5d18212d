//! Shared fixtures for unit tests.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use confer_primitives::{ApplicationId, ConfigKey, Generation, HostName, TenantName, Version};
use parking_lot::Mutex;

use crate::application::{Application, MemoryModel};
use crate::application_set::ApplicationSet;
use crate::BoxError;
use crate::listener::{HostVerdict, ReloadListener};

pub(crate) const TENANT: &str = "mytenant";

pub(crate) fn tenant() -> TenantName {
	TenantName::new(TENANT)
}

pub(crate) fn app_id(application: &str) -> ApplicationId {
	ApplicationId::new(TENANT, application, "default")
}

pub(crate) fn simpletypes() -> ConfigKey {
	ConfigKey::new("simpletypes", "", "config")
}

pub(crate) fn model(intval: i64, hosts: &[&str]) -> MemoryModel {
	let mut model = MemoryModel::new()
		.with_config(simpletypes(), format!(r#"{{"intval":{intval}}}"#))
		.with_config(
			ConfigKey::new("qr", "search/music/qrservers/default/qr.0", "search"),
			"qr.0",
		)
		.with_config(
			ConfigKey::new("qr", "search/music/qrservers/default/qr.1", "search"),
			"qr.1",
		)
		.with_config(ConfigKey::new("log", "admin/logserver", "cloud"), "log");
	for host in hosts {
		model = model.with_host(*host);
	}
	model
}

/// Single-version set of `id` at `generation` serving `intval` on `hosts`.
pub(crate) fn single(id: &ApplicationId, generation: u64, intval: i64, hosts: &[&str]) -> ApplicationSet {
	ApplicationSet::from_single(Application::new(
		id.clone(),
		Generation(generation),
		Version::new(7, 1, 0),
		Arc::new(model(intval, hosts)),
	))
}

pub(crate) fn host_set(names: &[&str]) -> BTreeSet<HostName> {
	names.iter().map(|name| name.to_string()).collect()
}

/// Listener counting every callback, optionally rejecting or failing.
#[derive(Default)]
pub(crate) struct RecordingListener {
	pub(crate) reject: Mutex<Option<String>>,
	pub(crate) fail: bool,
	pub(crate) verified: AtomicUsize,
	pub(crate) activated: AtomicUsize,
	pub(crate) removed: AtomicUsize,
	pub(crate) last_hosts: Mutex<Option<BTreeSet<HostName>>>,
}

impl RecordingListener {
	pub(crate) fn rejecting(reason: &str) -> Self {
		Self {
			reject: Mutex::new(Some(reason.to_string())),
			..Self::default()
		}
	}

	pub(crate) fn failing() -> Self {
		Self {
			fail: true,
			..Self::default()
		}
	}

	pub(crate) fn set_reject(&self, reason: Option<&str>) {
		*self.reject.lock() = reason.map(str::to_string);
	}

	pub(crate) fn activations(&self) -> usize {
		self.activated.load(Ordering::SeqCst)
	}

	pub(crate) fn removals(&self) -> usize {
		self.removed.load(Ordering::SeqCst)
	}

	pub(crate) fn verifications(&self) -> usize {
		self.verified.load(Ordering::SeqCst)
	}

	fn outcome(&self) -> Result<(), BoxError> {
		if self.fail {
			return Err("listener failure".into());
		}
		Ok(())
	}
}

impl ReloadListener for RecordingListener {
	fn verify_hosts_are_available(&self, _tenant: &TenantName, _hosts: &BTreeSet<HostName>) -> HostVerdict {
		self.verified.fetch_add(1, Ordering::SeqCst);
		match self.reject.lock().clone() {
			Some(reason) => HostVerdict::Rejected(reason),
			None => HostVerdict::Accepted,
		}
	}

	fn hosts_updated(&self, _tenant: &TenantName, hosts: &BTreeSet<HostName>) -> Result<(), BoxError> {
		*self.last_hosts.lock() = Some(hosts.clone());
		self.outcome()
	}

	fn config_activated(&self, _set: &ApplicationSet) -> Result<(), BoxError> {
		self.activated.fetch_add(1, Ordering::SeqCst);
		self.outcome()
	}

	fn application_removed(&self, _id: &ApplicationId) -> Result<(), BoxError> {
		self.removed.fetch_add(1, Ordering::SeqCst);
		self.outcome()
	}
}
