//! The conditional-order engine.
//!
//! All five public operations run to completion against exclusively owned
//! state (`&mut self`); the caller serializes invocations, so the only
//! ordering concern is staleness *between* calls. That is why
//! [`Engine::perform_upkeep`] re-validates the condition against a fresh
//! quote instead of trusting the scan that produced its input. Every
//! operation performs its fallible external calls before touching the order
//! book, so a failure anywhere leaves no partial state.

use std::sync::Arc;

use tracing::{debug, info};

use keeper_amm::{PriceOracle, SwapExecutor, SwapRequest, TokenLedger};
use keeper_types::{
	math, Address, Bytes, Clock, EngineEvent, Order, OrderId, OrderParams, SystemClock, Timestamp,
	U256, BPS_DENOMINATOR,
};

use crate::access;
use crate::errors::{EngineError, Result};
use crate::evaluator;
use crate::event_bus::EventBus;
use crate::scanner;
use crate::store::OrderBook;

/// Default seconds added to the current time as the swap deadline.
const DEFAULT_DEADLINE_MARGIN: u64 = 60;

/// Result of an upkeep scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upkeep {
	/// Whether any order is currently executable.
	pub needed: bool,
	/// ABI-encoded id of the first executable order; empty when not needed.
	pub perform_data: Bytes,
}

/// Settlement summary of a successful execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillReceipt {
	pub order_id: OrderId,
	/// Realized output amount paid to the order owner.
	pub amount_out: U256,
	/// Fresh price that admitted the order for execution.
	pub price: U256,
}

/// Order store, condition evaluator, upkeep scanner/executor and access
/// control behind one aggregate. Keeper identity and adapter handles are
/// fixed at construction.
pub struct Engine {
	keeper: Address,
	deadline_margin: u64,
	book: OrderBook,
	oracle: Arc<dyn PriceOracle>,
	swapper: Arc<dyn SwapExecutor>,
	ledger: Arc<dyn TokenLedger>,
	clock: Arc<dyn Clock>,
	events: EventBus,
}

impl Engine {
	pub fn builder() -> EngineBuilder {
		EngineBuilder::default()
	}

	/// Escrows `amount_in` from `caller` and stores a new order.
	///
	/// The caller must have pre-authorized the engine's custody account to
	/// pull `amount_in` of `token_in`.
	pub async fn create_order(&mut self, caller: Address, params: OrderParams) -> Result<OrderId> {
		validate_params(&params)?;

		self.ledger
			.escrow_from(params.token_in, caller, params.amount_in)
			.await?;

		let order = Order::new(caller, params, self.clock.now());
		let id = self.book.insert(order.clone());
		info!(
			order_id = id,
			owner = %caller,
			amount_in = %order.amount_in,
			target_price = %order.target_price,
			"order created"
		);
		self.events.publish(EngineEvent::OrderCreated {
			order: self.book.get(id)?.clone(),
		});
		Ok(id)
	}

	/// Cancels an active order and refunds the escrow to its owner.
	pub async fn cancel_order(&mut self, caller: Address, id: OrderId) -> Result<()> {
		let order = self.book.get(id)?;
		access::ensure_owner(order, caller)?;
		let (token_in, amount_in) = (order.token_in, order.amount_in);

		// Refund before removal: the release can fail, removal cannot.
		self.ledger.release_to(token_in, caller, amount_in).await?;
		let order = self.book.remove(id)?;

		info!(order_id = id, owner = %caller, "order cancelled");
		self.events.publish(EngineEvent::OrderCancelled {
			order_id: id,
			owner: order.owner,
		});
		Ok(())
	}

	/// Returns the active order record for `id`.
	pub fn get_order(&self, id: OrderId) -> Result<&Order> {
		self.book.get(id)
	}

	/// Finds the first executable order, if any. Read-only and deterministic
	/// for a fixed snapshot of orders and prices; callable by anyone.
	pub async fn check_upkeep(&self, _check_data: &[u8]) -> Upkeep {
		match scanner::scan(&self.book, self.oracle.as_ref()).await {
			Some((id, price)) => {
				debug!(order_id = id, %price, "upkeep needed");
				Upkeep {
					needed: true,
					perform_data: scanner::encode_perform_data(id),
				}
			}
			None => Upkeep {
				needed: false,
				perform_data: Bytes::new(),
			},
		}
	}

	/// Executes the order named by `perform_data`.
	///
	/// Re-validates the condition against a fresh quote, swaps with the
	/// slippage-derived output bound and pays proceeds directly to the owner;
	/// the order is removed only after the swap has succeeded.
	pub async fn perform_upkeep(
		&mut self,
		caller: Address,
		perform_data: &[u8],
	) -> Result<FillReceipt> {
		access::ensure_keeper(self.keeper, caller)?;
		let id = scanner::decode_perform_data(perform_data)?;
		let order = self.book.get(id)?.clone();

		let price = evaluator::spot_price(self.oracle.as_ref(), &order).await?;
		if !evaluator::target_reached(&order, price) {
			return Err(EngineError::TargetNotReached {
				current: price,
				target: order.target_price,
			});
		}

		let min_amount_out =
			math::min_amount_out(order.amount_in, order.target_price, order.slippage_bps)
				.ok_or(EngineError::Overflow)?;
		let amount_out = self
			.swapper
			.swap_exact_input(&SwapRequest {
				token_in: order.token_in,
				token_out: order.token_out,
				fee_tier: order.fee_tier,
				amount_in: order.amount_in,
				min_amount_out,
				recipient: order.owner,
				deadline: self.clock.now() + self.deadline_margin,
			})
			.await?;

		let order = self.book.remove(id)?;
		info!(
			order_id = id,
			owner = %order.owner,
			%amount_out,
			%price,
			"order filled"
		);
		self.events.publish(EngineEvent::OrderFilled {
			order_id: id,
			owner: order.owner,
			amount_out,
			price,
		});
		Ok(FillReceipt {
			order_id: id,
			amount_out,
			price,
		})
	}

	/// Current engine clock value.
	pub fn get_time(&self) -> Timestamp {
		self.clock.now()
	}

	/// Number of active orders.
	pub fn order_count(&self) -> usize {
		self.book.len()
	}

	/// Subscribes to engine lifecycle events.
	pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
		self.events.subscribe()
	}
}

fn validate_params(params: &OrderParams) -> Result<()> {
	if params.amount_in.is_zero() {
		return Err(EngineError::InvalidOrder("amount_in must be positive".into()));
	}
	if params.target_price.is_zero() {
		return Err(EngineError::InvalidOrder(
			"target_price must be positive".into(),
		));
	}
	if params.slippage_bps == 0 || params.slippage_bps > BPS_DENOMINATOR {
		return Err(EngineError::InvalidOrder(
			"slippage_bps must be within 1..=10000".into(),
		));
	}
	if params.token_in == params.token_out {
		return Err(EngineError::InvalidOrder(
			"token_in and token_out must differ".into(),
		));
	}
	Ok(())
}

/// Builder for [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
	keeper: Option<Address>,
	deadline_margin: Option<u64>,
	oracle: Option<Arc<dyn PriceOracle>>,
	swapper: Option<Arc<dyn SwapExecutor>>,
	ledger: Option<Arc<dyn TokenLedger>>,
	clock: Option<Arc<dyn Clock>>,
	event_capacity: Option<usize>,
}

impl EngineBuilder {
	pub fn keeper(mut self, keeper: Address) -> Self {
		self.keeper = Some(keeper);
		self
	}

	pub fn deadline_margin(mut self, seconds: u64) -> Self {
		self.deadline_margin = Some(seconds);
		self
	}

	pub fn oracle(mut self, oracle: Arc<dyn PriceOracle>) -> Self {
		self.oracle = Some(oracle);
		self
	}

	pub fn swap_executor(mut self, swapper: Arc<dyn SwapExecutor>) -> Self {
		self.swapper = Some(swapper);
		self
	}

	pub fn ledger(mut self, ledger: Arc<dyn TokenLedger>) -> Self {
		self.ledger = Some(ledger);
		self
	}

	pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = Some(clock);
		self
	}

	pub fn event_capacity(mut self, capacity: usize) -> Self {
		self.event_capacity = Some(capacity);
		self
	}

	pub fn build(self) -> Result<Engine> {
		let missing = |part: &str| EngineError::Config(format!("{part} not configured"));
		Ok(Engine {
			keeper: self.keeper.ok_or_else(|| missing("keeper"))?,
			deadline_margin: self.deadline_margin.unwrap_or(DEFAULT_DEADLINE_MARGIN),
			book: OrderBook::new(),
			oracle: self.oracle.ok_or_else(|| missing("price oracle"))?,
			swapper: self.swapper.ok_or_else(|| missing("swap executor"))?,
			ledger: self.ledger.ok_or_else(|| missing("token ledger"))?,
			clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
			events: EventBus::new(self.event_capacity.unwrap_or(64)),
		})
	}
}
