//! Coordination store recording the active session of every application.
//!
//! The store is the source of truth the watcher follows: a deployment commits
//! a transaction pointing an application at a new session, and every
//! subscriber receives one [`StoreEvent`] per committed op.

use std::collections::BTreeMap;

use confer_primitives::{ApplicationId, Generation};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// Errors from [`CoordinationStore::commit`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
	#[error("application {0} already exists")]
	AlreadyExists(ApplicationId),
	#[error("application {0} does not exist")]
	NotFound(ApplicationId),
}

/// One write inside a [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOp {
	/// Registers an application with no active session.
	Create(ApplicationId),
	/// Points an existing application at `session`.
	Put(ApplicationId, Generation),
	/// Drops an existing application.
	Delete(ApplicationId),
}

/// Ordered batch of ops applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
	ops: Vec<TransactionOp>,
}

impl Transaction {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn create(mut self, id: ApplicationId) -> Self {
		self.ops.push(TransactionOp::Create(id));
		self
	}

	pub fn put(mut self, id: ApplicationId, session: Generation) -> Self {
		self.ops.push(TransactionOp::Put(id, session));
		self
	}

	pub fn delete(mut self, id: ApplicationId) -> Self {
		self.ops.push(TransactionOp::Delete(id));
		self
	}

	pub fn ops(&self) -> &[TransactionOp] {
		&self.ops
	}

	pub fn is_empty(&self) -> bool {
		self.ops.is_empty()
	}
}

/// Change notification emitted after a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
	SessionActivated { id: ApplicationId, session: Generation },
	ApplicationDeleted { id: ApplicationId },
}

impl StoreEvent {
	pub fn id(&self) -> &ApplicationId {
		match self {
			Self::SessionActivated { id, .. } | Self::ApplicationDeleted { id } => id,
		}
	}
}

/// Shared record of which session is active for each application.
pub trait CoordinationStore: Send + Sync {
	/// Active session of `id`, or `None` if `id` is unknown or has none yet.
	fn active_session(&self, id: &ApplicationId) -> Option<Generation>;

	/// Every registered application, sorted.
	fn application_ids(&self) -> Vec<ApplicationId>;

	/// Applies `tx` atomically. On error nothing is applied and nothing is emitted.
	fn commit(&self, tx: Transaction) -> Result<(), StoreError>;

	/// Receiver for events of every later commit.
	fn subscribe(&self) -> mpsc::UnboundedReceiver<StoreEvent>;
}

#[derive(Debug, Default)]
struct StoreState {
	sessions: BTreeMap<ApplicationId, Option<Generation>>,
	subscribers: Vec<mpsc::UnboundedSender<StoreEvent>>,
}

/// In-process [`CoordinationStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
	state: Mutex<StoreState>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl CoordinationStore for MemoryStore {
	fn active_session(&self, id: &ApplicationId) -> Option<Generation> {
		self.state.lock().sessions.get(id).copied().flatten()
	}

	fn application_ids(&self) -> Vec<ApplicationId> {
		self.state.lock().sessions.keys().cloned().collect()
	}

	fn commit(&self, tx: Transaction) -> Result<(), StoreError> {
		let mut state = self.state.lock();

		let mut staged = state.sessions.clone();
		let mut events = Vec::with_capacity(tx.ops.len());
		for op in tx.ops {
			match op {
				TransactionOp::Create(id) => {
					if staged.contains_key(&id) {
						return Err(StoreError::AlreadyExists(id));
					}
					staged.insert(id, None);
				}
				TransactionOp::Put(id, session) => {
					let Some(slot) = staged.get_mut(&id) else {
						return Err(StoreError::NotFound(id));
					};
					*slot = Some(session);
					events.push(StoreEvent::SessionActivated { id, session });
				}
				TransactionOp::Delete(id) => {
					if staged.remove(&id).is_none() {
						return Err(StoreError::NotFound(id));
					}
					events.push(StoreEvent::ApplicationDeleted { id });
				}
			}
		}

		state.sessions = staged;
		state.subscribers.retain(|sender| !sender.is_closed());
		debug!(
			events = events.len(),
			subscribers = state.subscribers.len(),
			"Committed store transaction"
		);
		for event in events {
			for subscriber in &state.subscribers {
				let _ = subscriber.send(event.clone());
			}
		}
		Ok(())
	}

	fn subscribe(&self) -> mpsc::UnboundedReceiver<StoreEvent> {
		let (tx, rx) = mpsc::unbounded_channel();
		self.state.lock().subscribers.push(tx);
		rx
	}
}
