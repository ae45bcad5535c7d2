//! Target-condition evaluation against live AMM prices.
//!
//! The engine only supports the sell-high direction: an order becomes
//! executable once the output-per-input price has risen to or above its
//! target. The price fed into [`target_reached`] must come from a fresh
//! [`spot_price`] query; the executor re-evaluates at execution time because
//! prices can move between scan and execution.

use keeper_amm::{PriceOracle, QuoteRequest};
use keeper_types::{math, Order, U256};

use crate::errors::{EngineError, Result};

/// Quotes the order's full input amount and normalizes the result into the
/// 18-decimal output-per-input representation of `target_price`.
pub async fn spot_price(oracle: &dyn PriceOracle, order: &Order) -> Result<U256> {
	let amount_out = oracle
		.quote(&QuoteRequest {
			token_in: order.token_in,
			token_out: order.token_out,
			fee_tier: order.fee_tier,
			amount_in: order.amount_in,
		})
		.await?;
	math::normalize_price(amount_out, order.amount_in).ok_or(EngineError::Overflow)
}

/// Whether the order's condition currently holds: `current_price >= target`.
pub fn target_reached(order: &Order, current_price: U256) -> bool {
	current_price >= order.target_price
}
