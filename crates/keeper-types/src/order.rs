//! Order records held by the engine.

use serde::{Deserialize, Serialize};

use crate::common::{Address, FeeTier, OrderId, Timestamp, U256};

/// User-supplied parameters of a conditional order.
///
/// An order is directional: `amount_in` of `token_in` is escrowed at creation
/// and swapped for `token_out` once the market price reaches `target_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderParams {
	/// Asset escrowed by the order.
	pub token_in: Address,
	/// Asset the owner receives on execution.
	pub token_out: Address,
	/// AMM pool fee tier to quote and execute against, in parts per million.
	pub fee_tier: FeeTier,
	/// Quantity of `token_in` escrowed. Fixed at creation, never partially
	/// consumed.
	pub amount_in: U256,
	/// Exchange rate (token_out per 1e18 token_in) at or above which the
	/// order becomes executable.
	pub target_price: U256,
	/// Maximum tolerated shortfall between the admitting price and the
	/// realized swap price, in basis points (1..=10000).
	pub slippage_bps: u16,
}

/// An active order as stored by the engine.
///
/// There is no persisted cancelled/filled state: an order exists while it is
/// active and is deleted from the store on cancellation or fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier, assigned sequentially from 1.
	pub id: OrderId,
	/// Principal who created the order, may cancel it and receives proceeds.
	pub owner: Address,
	pub token_in: Address,
	pub token_out: Address,
	pub fee_tier: FeeTier,
	pub amount_in: U256,
	pub target_price: U256,
	pub slippage_bps: u16,
	/// Engine clock value at creation.
	pub created_at: Timestamp,
}

impl Order {
	/// Assembles an order record from its creation context. The final id is
	/// assigned by the order store on insertion.
	pub fn new(owner: Address, params: OrderParams, created_at: Timestamp) -> Self {
		Self {
			id: 0,
			owner,
			token_in: params.token_in,
			token_out: params.token_out,
			fee_tier: params.fee_tier,
			amount_in: params.amount_in,
			target_price: params.target_price,
			slippage_bps: params.slippage_bps,
			created_at,
		}
	}
}
