//! Proofs for tenant request handler invariants.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use confer_config::ServerConfig;
use confer_primitives::{ApplicationId, Generation, HostName, TenantName};
use parking_lot::Mutex;

use crate::application::GetConfigRequest;
use crate::application_set::ApplicationSet;
use crate::handler::TenantRequestHandler;
use crate::listener::{HostVerdict, ReloadListener};
use crate::BoxError;
use crate::test_support::{RecordingListener, app_id, host_set, simpletypes, single, tenant};
use crate::Error;

fn handler(listeners: Vec<Arc<dyn ReloadListener>>) -> TenantRequestHandler {
	TenantRequestHandler::new(tenant(), listeners, &ServerConfig::default())
}

/// Verifies that a set loaded before a reload keeps serving its own generation.
#[cfg_attr(test, test)]
pub(crate) fn test_pinned_set_survives_reload() {
	let handler = handler(Vec::new());
	let id = app_id("myapp");
	handler.reload_config(single(&id, 1, 1337, &[])).unwrap();

	let pinned = handler.application_set(&id).unwrap();
	handler.reload_config(single(&id, 2, 1330, &[])).unwrap();

	let req = GetConfigRequest::new(simpletypes());
	let old = pinned.for_version_or_latest(None).unwrap().resolve_config(&req).unwrap();
	assert_eq!(old.generation, Generation(1));
	assert_eq!(&old.payload[..], br#"{"intval":1337}"#);

	let new = handler.resolve_config(&id, &req).unwrap();
	assert_eq!(new.generation, Generation(2));
	assert_eq!(&new.payload[..], br#"{"intval":1330}"#);
}

/// Verifies that a vetoed reload leaves registry, hosts and metrics untouched.
#[cfg_attr(test, test)]
pub(crate) fn test_veto_leaves_prior_state() {
	let id = app_id("myapp");
	let veto = Arc::new(RecordingListener::default());
	let after = Arc::new(RecordingListener::default());
	let handler = handler(vec![veto.clone(), after.clone()]);

	handler.reload_config(single(&id, 1, 1337, &["host-a"])).unwrap();
	assert_eq!(after.activations(), 1);

	veto.set_reject(Some("hosts taken"));
	let err = handler.reload_config(single(&id, 2, 1330, &["host-b"])).unwrap_err();
	assert!(matches!(err, Error::HostConflict { .. }), "{err}");
	assert_eq!(handler.application_generation(&id, None).unwrap(), Generation(1));
	assert_eq!(handler.all_hosts(), host_set(&["host-a"]));
	assert_eq!(handler.metrics().snapshot().hosts, 1);
	assert_eq!(after.verifications(), 1, "first rejection stops verification");
	assert_eq!(after.activations(), 1);
	assert_eq!(*after.last_hosts.lock(), Some(host_set(&["host-a"])));

	let req = GetConfigRequest::new(simpletypes());
	let response = handler.resolve_config(&id, &req).unwrap();
	assert_eq!(&response.payload[..], br#"{"intval":1337}"#);
}

/// Verifies that failing notifications neither undo the commit nor stop later listeners.
#[cfg_attr(test, test)]
pub(crate) fn test_notification_failure_keeps_commit() {
	let failing = Arc::new(RecordingListener::failing());
	let counting = Arc::new(RecordingListener::default());
	let handler = handler(vec![failing.clone(), counting.clone()]);
	let id = app_id("myapp");

	handler.reload_config(single(&id, 1, 1337, &["host-a"])).unwrap();
	assert!(handler.has_application(&id, None));
	assert_eq!(failing.activations(), 1);
	assert_eq!(counting.activations(), 1);
	assert_eq!(*counting.last_hosts.lock(), Some(host_set(&["host-a"])));

	assert!(handler.remove_application(&id));
	assert!(!handler.has_application(&id, None));
	assert_eq!(failing.removals(), 1);
	assert_eq!(counting.removals(), 1);
}

/// Verifies that the host index tracks the union of registered hosts.
#[cfg_attr(test, test)]
pub(crate) fn test_host_index_matches_registry() {
	let handler = handler(Vec::new());
	let a = app_id("a");
	let b = app_id("b");

	handler.reload_config(single(&a, 1, 1, &["h1", "h2"])).unwrap();
	handler.reload_config(single(&b, 1, 1, &["h3"])).unwrap();
	handler.reload_config(single(&a, 2, 1, &["h2", "h4"])).unwrap();

	let expected: BTreeSet<HostName> = handler
		.application_ids()
		.iter()
		.filter_map(|id| handler.application_set(id))
		.flat_map(|set| set.hosts())
		.collect();
	assert_eq!(handler.all_hosts(), expected);
	assert_eq!(handler.resolve_application_id("h4"), a);
	assert_eq!(handler.resolve_application_id("h3"), b);
	assert_ne!(handler.resolve_application_id("h1"), a);

	handler.remove_application(&a);
	assert_eq!(handler.all_hosts(), host_set(&["h3"]));
	assert_eq!(handler.metrics().snapshot().hosts, 1);
}

type CallLog = Arc<Mutex<Vec<(usize, &'static str)>>>;

/// Appends `(index, callback)` to a log shared by several listeners.
struct OrderedListener {
	index: usize,
	log: CallLog,
	handler: OnceLock<Weak<TenantRequestHandler>>,
	published_on_activation: AtomicUsize,
}

impl OrderedListener {
	fn new(index: usize, log: &CallLog) -> Self {
		Self {
			index,
			log: Arc::clone(log),
			handler: OnceLock::new(),
			published_on_activation: AtomicUsize::new(0),
		}
	}

	fn record(&self, callback: &'static str) {
		self.log.lock().push((self.index, callback));
	}
}

impl ReloadListener for OrderedListener {
	fn verify_hosts_are_available(&self, _tenant: &TenantName, _hosts: &BTreeSet<HostName>) -> HostVerdict {
		self.record("verify");
		HostVerdict::Accepted
	}

	fn hosts_updated(&self, _tenant: &TenantName, _hosts: &BTreeSet<HostName>) -> Result<(), BoxError> {
		self.record("hosts");
		Ok(())
	}

	fn config_activated(&self, set: &ApplicationSet) -> Result<(), BoxError> {
		self.record("activated");
		let active = self
			.handler
			.get()
			.and_then(Weak::upgrade)
			.and_then(|handler| handler.application_set(set.id()));
		if active.is_some_and(|active| std::ptr::eq(Arc::as_ptr(&active), set)) {
			self.published_on_activation.fetch_add(1, Ordering::SeqCst);
		}
		Ok(())
	}

	fn application_removed(&self, _id: &ApplicationId) -> Result<(), BoxError> {
		self.record("removed");
		Ok(())
	}
}

/// Verifies the verify, hosts, activated sequence across listeners and that
/// activation is only announced once the set is visible to resolvers.
#[cfg_attr(test, test)]
pub(crate) fn test_notification_order() {
	let log = CallLog::default();
	let first = Arc::new(OrderedListener::new(0, &log));
	let second = Arc::new(OrderedListener::new(1, &log));
	let handler = Arc::new(handler(vec![first.clone(), second.clone()]));
	for listener in [&first, &second] {
		listener.handler.set(Arc::downgrade(&handler)).unwrap();
	}
	let id = app_id("myapp");

	handler.reload_config(single(&id, 1, 1337, &["host-a"])).unwrap();
	handler.reload_config(single(&id, 2, 1330, &["host-a"])).unwrap();

	let reload = [
		(0, "verify"),
		(1, "verify"),
		(0, "hosts"),
		(1, "hosts"),
		(0, "activated"),
		(1, "activated"),
	];
	let expected: Vec<_> = reload.iter().chain(&reload).copied().collect();
	assert_eq!(*log.lock(), expected);
	assert_eq!(first.published_on_activation.load(Ordering::SeqCst), 2);
	assert_eq!(second.published_on_activation.load(Ordering::SeqCst), 2);

	log.lock().clear();
	assert!(handler.remove_application(&id));
	assert_eq!(*log.lock(), vec![(0, "removed"), (1, "removed")]);
}
