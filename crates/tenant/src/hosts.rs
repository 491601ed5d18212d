//! Hostname to application index.
//!
//! # Concurrency
//!
//! Readers load the current [`HostSnapshot`] and never lock. Writers build a
//! replacement snapshot from the current one and publish it wholesale, so a
//! reader sees either all of an update or none of it.

use std::collections::BTreeSet;

use arc_swap::ArcSwap;
use confer_primitives::{ApplicationId, HostName};
use rustc_hash::FxHashMap;

/// Immutable published state of the host index.
#[derive(Debug, Clone, Default)]
struct HostSnapshot {
	by_host: FxHashMap<HostName, ApplicationId>,
	by_app: FxHashMap<ApplicationId, BTreeSet<HostName>>,
}

impl HostSnapshot {
	fn without(&self, id: &ApplicationId) -> Self {
		let mut next = self.clone();
		if let Some(hosts) = next.by_app.remove(id) {
			for host in hosts {
				next.by_host.remove(&host);
			}
		}
		next
	}
}

/// Derived index of which application owns each host.
///
/// Always reflects exactly the union of hosts of the registered application sets.
#[derive(Debug, Default)]
pub struct HostRegistry {
	snap: ArcSwap<HostSnapshot>,
}

impl HostRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Application owning `host`, if any.
	pub fn key_for_host(&self, host: &str) -> Option<ApplicationId> {
		self.snap.load().by_host.get(host).cloned()
	}

	pub fn hosts_for(&self, id: &ApplicationId) -> BTreeSet<HostName> {
		self.snap.load().by_app.get(id).cloned().unwrap_or_default()
	}

	pub fn all_hosts(&self) -> BTreeSet<HostName> {
		self.snap.load().by_host.keys().cloned().collect()
	}

	pub fn host_count(&self) -> usize {
		self.snap.load().by_host.len()
	}

	/// Current owner of every host in `hosts` that has one.
	pub fn owners(&self, hosts: &BTreeSet<HostName>) -> Vec<(HostName, ApplicationId)> {
		let snap = self.snap.load();
		hosts
			.iter()
			.filter_map(|host| snap.by_host.get(host).map(|owner| (host.clone(), owner.clone())))
			.collect()
	}

	/// Hosts in `hosts` that already belong to an application other than `id`.
	pub fn conflicts(
		&self,
		id: &ApplicationId,
		hosts: &BTreeSet<HostName>,
	) -> Vec<(HostName, ApplicationId)> {
		let mut owners = self.owners(hosts);
		owners.retain(|(_, owner)| owner != id);
		owners
	}

	/// Replaces the hosts owned by `id`. Hosts it no longer lists are released.
	///
	/// Callers check [`Self::conflicts`] first; a host listed here is taken over
	/// from any previous owner.
	pub(crate) fn update(&self, id: &ApplicationId, hosts: BTreeSet<HostName>) {
		self.snap.rcu(|current| {
			let mut next = current.without(id);
			for host in &hosts {
				if let Some(previous) = next.by_host.insert(host.clone(), id.clone())
					&& let Some(owned) = next.by_app.get_mut(&previous)
				{
					owned.remove(host);
					if owned.is_empty() {
						next.by_app.remove(&previous);
					}
				}
			}
			if !hosts.is_empty() {
				next.by_app.insert(id.clone(), hosts.clone());
			}
			next
		});
	}

	/// Drops every host owned by `id`, returning them.
	pub(crate) fn remove(&self, id: &ApplicationId) -> BTreeSet<HostName> {
		let previous = self.snap.rcu(|current| current.without(id));
		previous.by_app.get(id).cloned().unwrap_or_default()
	}
}
