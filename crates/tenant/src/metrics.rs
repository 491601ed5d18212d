//! Local request and registry counters.
//!
//! Counters are plain atomics updated on the request path; snapshots are
//! cheap copies meant for status endpoints and tests.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

/// Request counters for one loaded application.
#[derive(Debug, Default)]
pub struct ApplicationMetrics {
	requests: AtomicU64,
	cache_hits: AtomicU64,
	cache_misses: AtomicU64,
	failures: AtomicU64,
}

/// Point-in-time copy of [`ApplicationMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationMetricsSnapshot {
	pub requests: u64,
	pub cache_hits: u64,
	pub cache_misses: u64,
	pub failures: u64,
}

impl ApplicationMetrics {
	pub fn record_request(&self) {
		self.requests.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_cache_miss(&self) {
		self.cache_misses.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub fn snapshot(&self) -> ApplicationMetricsSnapshot {
		ApplicationMetricsSnapshot {
			requests: self.requests.load(Ordering::Relaxed),
			cache_hits: self.cache_hits.load(Ordering::Relaxed),
			cache_misses: self.cache_misses.load(Ordering::Relaxed),
			failures: self.failures.load(Ordering::Relaxed),
		}
	}
}

/// Registry gauges for one tenant.
#[derive(Debug, Default)]
pub struct TenantMetrics {
	applications: AtomicUsize,
	hosts: AtomicUsize,
}

/// Point-in-time copy of [`TenantMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TenantMetricsSnapshot {
	pub applications: usize,
	pub hosts: usize,
}

impl TenantMetrics {
	pub(crate) fn set(&self, applications: usize, hosts: usize) {
		self.applications.store(applications, Ordering::Relaxed);
		self.hosts.store(hosts, Ordering::Relaxed);
	}

	pub fn snapshot(&self) -> TenantMetricsSnapshot {
		TenantMetricsSnapshot {
			applications: self.applications.load(Ordering::Relaxed),
			hosts: self.hosts.load(Ordering::Relaxed),
		}
	}
}
