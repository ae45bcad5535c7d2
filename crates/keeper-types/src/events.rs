//! Events published by the engine over its event bus.

use crate::common::{Address, OrderId, U256};
use crate::order::Order;

/// Lifecycle notifications emitted after an engine operation has committed.
///
/// Events are informational only; no engine state depends on whether anyone
/// is subscribed.
#[derive(Debug, Clone)]
pub enum EngineEvent {
	/// A new order was escrowed and stored.
	OrderCreated { order: Order },
	/// An order was cancelled by its owner and the escrow refunded.
	OrderCancelled { order_id: OrderId, owner: Address },
	/// An order was executed by the keeper.
	OrderFilled {
		order_id: OrderId,
		owner: Address,
		/// Realized output amount paid to the owner.
		amount_out: U256,
		/// Fresh price that admitted the order for execution.
		price: U256,
	},
}
