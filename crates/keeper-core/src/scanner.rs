//! Upkeep scan and perform-data encoding.
//!
//! The scan is a deterministic linear walk over the active orders in
//! ascending id order; O(n) per invocation is the accepted cost of having no
//! auxiliary price index to keep sorted under continuously moving prices.
//! The winning id travels to the executor as the ABI encoding of a uint256
//! (32-byte big-endian), the wire format keeper networks use for perform
//! data.

use tracing::debug;

use keeper_amm::PriceOracle;
use keeper_types::{Bytes, OrderId, U256};

use crate::errors::{EngineError, Result};
use crate::evaluator;
use crate::store::OrderBook;

/// Finds the first (lowest-id) order whose condition holds against a fresh
/// quote. A failed quote for one order (for example a missing pool) skips
/// that order rather than aborting the scan, so scanning itself never fails.
pub async fn scan(book: &OrderBook, oracle: &dyn PriceOracle) -> Option<(OrderId, U256)> {
	for order in book.iter() {
		match evaluator::spot_price(oracle, order).await {
			Ok(price) if evaluator::target_reached(order, price) => {
				return Some((order.id, price));
			}
			Ok(_) => {}
			Err(error) => {
				debug!(order_id = order.id, %error, "skipping unquotable order");
			}
		}
	}
	None
}

/// Encodes an order id as an ABI uint256.
pub fn encode_perform_data(id: OrderId) -> Bytes {
	Bytes::from(U256::from(id).to_be_bytes::<32>().to_vec())
}

/// Decodes perform data produced by [`encode_perform_data`].
pub fn decode_perform_data(data: &[u8]) -> Result<OrderId> {
	if data.len() != 32 {
		return Err(EngineError::InvalidPerformData(format!(
			"expected 32 bytes, got {}",
			data.len()
		)));
	}
	let value = U256::from_be_slice(data);
	OrderId::try_from(value)
		.map_err(|_| EngineError::InvalidPerformData(format!("id {value} out of range")))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn perform_data_round_trips() {
		let data = encode_perform_data(58);
		assert_eq!(data.len(), 32);
		assert_eq!(decode_perform_data(&data).unwrap(), 58);
	}

	#[test]
	fn short_perform_data_is_rejected() {
		assert!(matches!(
			decode_perform_data(&[0u8; 31]),
			Err(EngineError::InvalidPerformData(_))
		));
	}

	#[test]
	fn oversized_id_is_rejected() {
		let data = encode_perform_data(u64::MAX);
		assert_eq!(decode_perform_data(&data).unwrap(), u64::MAX);

		let mut too_big = [0u8; 32];
		too_big[23] = 1; // 2^64
		assert!(matches!(
			decode_perform_data(&too_big),
			Err(EngineError::InvalidPerformData(_))
		));
	}
}
