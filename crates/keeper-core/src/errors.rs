//! Error taxonomy of the engine.

use thiserror::Error;

use keeper_amm::AdapterError;
use keeper_types::{Address, OrderId, U256};

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures of the public engine operations.
///
/// Every failure aborts the whole operation with no partial state change;
/// the order involved (if any) stays active and can be retried on a future
/// scan/execute cycle.
#[derive(Debug, Error)]
pub enum EngineError {
	/// The id was never assigned or the order has already been removed.
	#[error("order {0} not found")]
	OrderNotFound(OrderId),

	/// The caller is not the principal the operation requires.
	#[error("access denied for {caller}")]
	AccessDenied { caller: Address },

	/// The target condition did not hold against a fresh quote at execution
	/// time. Expected under price volatility; re-scan later.
	#[error("target not reached: current price {current}, target {target}")]
	TargetNotReached { current: U256, target: U256 },

	/// Order parameters failed validation at creation.
	#[error("invalid order: {0}")]
	InvalidOrder(String),

	/// The perform data was not a well-formed order id encoding.
	#[error("invalid perform data: {0}")]
	InvalidPerformData(String),

	/// Fixed-point arithmetic overflowed.
	#[error("price arithmetic overflow")]
	Overflow,

	/// A price query or swap execution failed; propagated verbatim.
	#[error("adapter failure: {0}")]
	Adapter(#[from] AdapterError),

	/// The engine was assembled with missing or inconsistent parts.
	#[error("engine configuration error: {0}")]
	Config(String),
}
