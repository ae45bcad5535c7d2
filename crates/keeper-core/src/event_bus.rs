//! Broadcast bus for engine lifecycle events.
//!
//! The engine publishes an event after each committed operation; the keeper
//! service (or anything else) can subscribe for logging or alerting without
//! coupling into the engine itself.

use tokio::sync::broadcast;

use keeper_types::EngineEvent;

/// Broadcast-channel event bus.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
	/// Creates a bus buffering up to `capacity` events per subscriber.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event to all current subscribers. Having no subscribers
	/// is not an error; events are informational only.
	pub fn publish(&self, event: EngineEvent) {
		let _ = self.sender.send(event);
	}
}
