//! Catalog of invariants upheld by [`crate::TenantRequestHandler`].

#![allow(dead_code)]

/// - Whole-Set Replacement: a reload publishes the new [`crate::ApplicationSet`]
///   with one pointer swap. A resolver that loaded the previous set keeps
///   resolving against it until the call returns.
///   - Enforced in: [`crate::TenantRequestHandler::reload_config`]
///   - Tested by: [`crate::handler::invariants::test_pinned_set_survives_reload`]
///   - Failure symptom: A response mixing payloads or generations of two deployments.
pub(crate) const WHOLE_SET_REPLACEMENT: () = ();

/// - Veto Leaves Prior State: a rejected reload changes neither the registry,
///   the host index, nor the tenant metrics, and sends no notifications.
///   - Enforced in: [`crate::TenantRequestHandler::reload_config`]
///   - Tested by: [`crate::handler::invariants::test_veto_leaves_prior_state`]
///   - Failure symptom: Nodes routed to an application whose deployment was refused.
pub(crate) const VETO_LEAVES_PRIOR_STATE: () = ();

/// - Notifications Never Roll Back: a listener failing `hosts_updated`,
///   `config_activated` or `application_removed` is logged and skipped; the
///   committed change stays and later listeners still run.
///   - Enforced in: [`crate::listener::ListenerSet`]
///   - Tested by: [`crate::handler::invariants::test_notification_failure_keeps_commit`]
///   - Failure symptom: One broken observer blocks activation for every node.
pub(crate) const NOTIFICATIONS_NEVER_ROLL_BACK: () = ();

/// - Host Index Matches Registry: the host index holds exactly the union of
///   hosts of the registered sets, each mapped to its owning application.
///   - Enforced in: [`crate::hosts::HostRegistry::update`], [`crate::hosts::HostRegistry::remove`]
///   - Tested by: [`crate::handler::invariants::test_host_index_matches_registry`]
///   - Failure symptom: Nodes of a removed application keep resolving to it.
pub(crate) const HOST_INDEX_MATCHES_REGISTRY: () = ();

/// - Notification Order: a reload offers the set to every listener for
///   verification, then sends `hosts_updated` to every listener, then
///   `config_activated` to every listener, each pass in registration order.
///   `config_activated` observes the new set already published to resolvers.
///   - Enforced in: [`crate::TenantRequestHandler::reload_config`], [`crate::listener::ListenerSet`]
///   - Tested by: [`crate::handler::invariants::test_notification_order`]
///   - Failure symptom: Subscribers told about an activation that resolvers cannot see yet.
pub(crate) const NOTIFICATION_ORDER: () = ();
