//! External-collaborator boundary of the limit-keeper engine.
//!
//! The engine treats the AMM and the token layer as opaque services behind
//! three traits: [`PriceOracle`] for read-only quoting, [`SwapExecutor`] for
//! bounded swap execution and [`TokenLedger`] for escrow custody. Adapter
//! failures are propagated verbatim to the engine and never retried here.

use async_trait::async_trait;
use thiserror::Error;

use keeper_types::{Address, FeeTier, Timestamp, U256};

/// Re-export implementations
pub mod implementations {
	pub mod mock;
	pub mod uniswap;
}

/// Errors raised by the AMM and token adapters.
#[derive(Debug, Error)]
pub enum AdapterError {
	/// No pool exists for the requested pair and fee tier.
	#[error("no pool for pair ({token_in}, {token_out}) at fee tier {fee_tier}")]
	PoolNotFound {
		token_in: Address,
		token_out: Address,
		fee_tier: FeeTier,
	},
	/// The swap would have produced less than the minimum output bound.
	#[error("slippage bound violated: would receive {amount_out}, minimum {min_amount_out}")]
	SlippageExceeded {
		amount_out: U256,
		min_amount_out: U256,
	},
	/// The swap deadline elapsed before execution.
	#[error("swap deadline {deadline} elapsed at {now}")]
	DeadlineElapsed { deadline: Timestamp, now: Timestamp },
	/// A token balance or allowance was insufficient for a transfer.
	#[error("insufficient funds: {0}")]
	InsufficientFunds(String),
	/// The underlying provider or contract call failed.
	#[error("provider error: {0}")]
	Provider(String),
}

/// Parameters of a price query against a single pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
	pub token_in: Address,
	pub token_out: Address,
	pub fee_tier: FeeTier,
	pub amount_in: U256,
}

/// Parameters of an exact-input swap with a slippage bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
	pub token_in: Address,
	pub token_out: Address,
	pub fee_tier: FeeTier,
	/// Input amount, drawn from engine custody.
	pub amount_in: U256,
	/// Minimum acceptable output; the adapter fails rather than fill below it.
	pub min_amount_out: U256,
	/// Account credited with the output.
	pub recipient: Address,
	/// Unix timestamp after which the adapter must refuse to execute.
	pub deadline: Timestamp,
}

/// Read-only quoting service over the external AMM.
///
/// `quote` answers "how much `token_out` would `amount_in` of `token_in`
/// currently produce" and mutates nothing.
#[async_trait]
pub trait PriceOracle: Send + Sync {
	async fn quote(&self, request: &QuoteRequest) -> Result<U256, AdapterError>;
}

/// Swap-execution service over the external AMM.
#[async_trait]
pub trait SwapExecutor: Send + Sync {
	/// Executes an exact-input swap and returns the realized output amount.
	///
	/// Fails without side effects if the output would be below
	/// `min_amount_out` or the deadline has elapsed.
	async fn swap_exact_input(&self, request: &SwapRequest) -> Result<U256, AdapterError>;
}

/// Token custody operations used by the engine for escrow and refunds.
///
/// The implementation acts on behalf of the engine's custody account; pulling
/// funds from a user requires a pre-authorized allowance toward that account.
#[async_trait]
pub trait TokenLedger: Send + Sync {
	async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, AdapterError>;

	/// Pulls `amount` of `token` from `owner` into engine custody.
	async fn escrow_from(
		&self,
		token: Address,
		owner: Address,
		amount: U256,
	) -> Result<(), AdapterError>;

	/// Pays `amount` of `token` out of engine custody to `recipient`.
	async fn release_to(
		&self,
		token: Address,
		recipient: Address,
		amount: U256,
	) -> Result<(), AdapterError>;
}
