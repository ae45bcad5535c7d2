//! Keeper poll loop.
//!
//! The scan-then-execute cycle of the upkeep protocol: on every tick, ask
//! the engine whether any order is executable and, if so, trigger execution
//! with the scan's perform data. Failed executions are logged and left for a
//! future cycle; the engine guarantees the order stays active.

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use keeper_core::{Engine, EngineError};
use keeper_types::{Address, EngineEvent};

pub struct KeeperService {
	/// The engine runs strictly serialized; the lock is the transaction
	/// boundary between upkeep cycles and any other engine access.
	engine: Mutex<Engine>,
	keeper: Address,
	poll_interval: Duration,
}

impl KeeperService {
	pub fn new(engine: Engine, keeper: Address, poll_interval: Duration) -> Self {
		Self {
			engine: Mutex::new(engine),
			keeper,
			poll_interval,
		}
	}

	/// Runs the poll loop until ctrl-c.
	pub async fn run(&self) {
		self.spawn_event_logger().await;

		let mut interval = tokio::time::interval(self.poll_interval);
		info!(poll_interval_ms = self.poll_interval.as_millis() as u64, "keeper loop started");
		loop {
			tokio::select! {
				_ = interval.tick() => {
					self.poll_once().await;
				}
				_ = tokio::signal::ctrl_c() => {
					info!("shutdown signal received");
					break;
				}
			}
		}
	}

	async fn poll_once(&self) {
		let mut engine = self.engine.lock().await;
		let upkeep = engine.check_upkeep(&[]).await;
		if !upkeep.needed {
			debug!(active_orders = engine.order_count(), "no upkeep needed");
			return;
		}

		match engine.perform_upkeep(self.keeper, &upkeep.perform_data).await {
			Ok(receipt) => {
				info!(
					order_id = receipt.order_id,
					amount_out = %receipt.amount_out,
					price = %receipt.price,
					"upkeep performed"
				);
			}
			// Both are expected races against price movement and other
			// transactions; the next scan starts clean.
			Err(EngineError::TargetNotReached { current, target }) => {
				debug!(%current, %target, "price moved back below target before execution");
			}
			Err(EngineError::OrderNotFound(order_id)) => {
				debug!(order_id, "order removed before execution");
			}
			Err(error) => {
				warn!(%error, "upkeep failed; order remains active");
			}
		}
	}

	async fn spawn_event_logger(&self) {
		let mut events = self.engine.lock().await.subscribe();
		tokio::spawn(async move {
			while let Ok(event) = events.recv().await {
				match event {
					EngineEvent::OrderCreated { order } => {
						info!(order_id = order.id, owner = %order.owner, "order created");
					}
					EngineEvent::OrderCancelled { order_id, owner } => {
						info!(order_id, %owner, "order cancelled");
					}
					EngineEvent::OrderFilled {
						order_id,
						owner,
						amount_out,
						..
					} => {
						info!(order_id, %owner, %amount_out, "order filled");
					}
				}
			}
		});
	}
}
