//! Invariant catalog and proof entrypoints for the tenant request handler.
#![allow(dead_code)]

pub(crate) mod catalog;

#[cfg(doc)]
pub(crate) fn test_pinned_set_survives_reload() {}

#[cfg(doc)]
pub(crate) fn test_veto_leaves_prior_state() {}

#[cfg(doc)]
pub(crate) fn test_notification_failure_keeps_commit() {}

#[cfg(doc)]
pub(crate) fn test_host_index_matches_registry() {}

#[cfg(doc)]
pub(crate) fn test_notification_order() {}

#[cfg(test)]
mod proofs;

#[cfg(test)]
#[allow(unused_imports)]
pub(crate) use proofs::{
	test_host_index_matches_registry, test_notification_failure_keeps_commit,
	test_notification_order, test_pinned_set_survives_reload, test_veto_leaves_prior_state,
};
