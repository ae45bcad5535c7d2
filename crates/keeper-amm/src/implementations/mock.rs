//! In-memory AMM and token ledger backend.
//!
//! Backs the integration tests with a constant-product pool per (pair, fee
//! tier) and a bank of ERC-20-style balances and allowances. Third parties
//! can move the market through
//! [`MockAmm::market_swap`], which is how tests drive an order past its
//! target price.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy_primitives::keccak256;
use async_trait::async_trait;

use keeper_types::{Address, Clock, FeeTier, U256};

use crate::{
	AdapterError, PriceOracle, QuoteRequest, SwapExecutor, SwapRequest, TokenLedger,
};

/// Fee tiers are expressed in parts per million, as on Uniswap V3.
const FEE_DENOMINATOR: u64 = 1_000_000;

/// In-memory token balances and allowances shared by the mock adapters.
#[derive(Default)]
pub struct MockBank {
	inner: Mutex<BankState>,
}

#[derive(Default)]
struct BankState {
	/// (token, holder) -> balance
	balances: HashMap<(Address, Address), U256>,
	/// (token, owner, spender) -> remaining allowance
	allowances: HashMap<(Address, Address, Address), U256>,
}

impl MockBank {
	pub fn new() -> Self {
		Self::default()
	}

	/// Credits `amount` of `token` to `to` out of thin air. Test fixture.
	pub fn mint(&self, token: Address, to: Address, amount: U256) {
		let mut state = self.inner.lock().expect("mock bank lock poisoned");
		let balance = state.balances.entry((token, to)).or_default();
		*balance = balance.saturating_add(amount);
	}

	/// Authorizes `spender` to pull up to `amount` of `token` from `owner`.
	pub fn approve(&self, token: Address, owner: Address, spender: Address, amount: U256) {
		let mut state = self.inner.lock().expect("mock bank lock poisoned");
		state.allowances.insert((token, owner, spender), amount);
	}

	pub fn balance_of(&self, token: Address, holder: Address) -> U256 {
		let state = self.inner.lock().expect("mock bank lock poisoned");
		state
			.balances
			.get(&(token, holder))
			.copied()
			.unwrap_or(U256::ZERO)
	}

	fn transfer(
		&self,
		token: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<(), AdapterError> {
		let mut state = self.inner.lock().expect("mock bank lock poisoned");
		state.debit(token, from, amount)?;
		let balance = state.balances.entry((token, to)).or_default();
		*balance = balance.saturating_add(amount);
		Ok(())
	}

	fn transfer_from(
		&self,
		token: Address,
		owner: Address,
		spender: Address,
		to: Address,
		amount: U256,
	) -> Result<(), AdapterError> {
		let mut state = self.inner.lock().expect("mock bank lock poisoned");
		let allowance = state
			.allowances
			.get_mut(&(token, owner, spender))
			.filter(|remaining| **remaining >= amount)
			.ok_or_else(|| {
				AdapterError::InsufficientFunds(format!(
					"allowance of {owner} toward {spender} below {amount}"
				))
			})?;
		*allowance -= amount;
		state.debit(token, owner, amount)?;
		let balance = state.balances.entry((token, to)).or_default();
		*balance = balance.saturating_add(amount);
		Ok(())
	}
}

impl BankState {
	fn debit(&mut self, token: Address, from: Address, amount: U256) -> Result<(), AdapterError> {
		let balance = self.balances.entry((token, from)).or_default();
		if *balance < amount {
			return Err(AdapterError::InsufficientFunds(format!(
				"balance of {from} below {amount}"
			)));
		}
		*balance -= amount;
		Ok(())
	}
}

/// Token custody over a [`MockBank`], acting as the engine's custody account.
pub struct MockLedger {
	bank: Arc<MockBank>,
	custody: Address,
}

impl MockLedger {
	pub fn new(bank: Arc<MockBank>, custody: Address) -> Self {
		Self { bank, custody }
	}
}

#[async_trait]
impl TokenLedger for MockLedger {
	async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, AdapterError> {
		Ok(self.bank.balance_of(token, holder))
	}

	async fn escrow_from(
		&self,
		token: Address,
		owner: Address,
		amount: U256,
	) -> Result<(), AdapterError> {
		self.bank
			.transfer_from(token, owner, self.custody, self.custody, amount)
	}

	async fn release_to(
		&self,
		token: Address,
		recipient: Address,
		amount: U256,
	) -> Result<(), AdapterError> {
		self.bank.transfer(token, self.custody, recipient, amount)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PoolKey {
	token0: Address,
	token1: Address,
	fee_tier: FeeTier,
}

impl PoolKey {
	fn ordered(token_a: Address, token_b: Address, fee_tier: FeeTier) -> Self {
		let (token0, token1) = if token_a <= token_b {
			(token_a, token_b)
		} else {
			(token_b, token_a)
		};
		Self {
			token0,
			token1,
			fee_tier,
		}
	}

	/// Synthetic account holding the pool's funds in the bank.
	fn address(&self) -> Address {
		let mut buf = [0u8; 44];
		buf[..20].copy_from_slice(self.token0.as_slice());
		buf[20..40].copy_from_slice(self.token1.as_slice());
		buf[40..].copy_from_slice(&self.fee_tier.to_be_bytes());
		Address::from_word(keccak256(buf))
	}
}

#[derive(Debug, Clone, Copy)]
struct PoolState {
	reserve0: U256,
	reserve1: U256,
}

/// Constant-product AMM over a [`MockBank`].
///
/// Implements both the quoting and the swap-execution side of the boundary.
/// Swaps executed through [`SwapExecutor`] are funded from the engine's
/// custody account, mirroring a router pulling pre-approved funds.
pub struct MockAmm {
	bank: Arc<MockBank>,
	clock: Arc<dyn Clock>,
	custody: Address,
	pools: Mutex<HashMap<PoolKey, PoolState>>,
}

impl MockAmm {
	pub fn new(bank: Arc<MockBank>, clock: Arc<dyn Clock>, custody: Address) -> Self {
		Self {
			bank,
			clock,
			custody,
			pools: Mutex::new(HashMap::new()),
		}
	}

	/// Seeds a pool with the given reserves, minting the backing balances to
	/// the pool's synthetic account.
	pub fn create_pool(
		&self,
		token_a: Address,
		token_b: Address,
		fee_tier: FeeTier,
		reserve_a: U256,
		reserve_b: U256,
	) {
		let key = PoolKey::ordered(token_a, token_b, fee_tier);
		let (reserve0, reserve1) = if key.token0 == token_a {
			(reserve_a, reserve_b)
		} else {
			(reserve_b, reserve_a)
		};
		self.bank.mint(key.token0, key.address(), reserve0);
		self.bank.mint(key.token1, key.address(), reserve1);
		let mut pools = self.pools.lock().expect("mock pool lock poisoned");
		pools.insert(key, PoolState { reserve0, reserve1 });
	}

	fn quote_pool(
		&self,
		token_in: Address,
		token_out: Address,
		fee_tier: FeeTier,
		amount_in: U256,
	) -> Result<U256, AdapterError> {
		let key = PoolKey::ordered(token_in, token_out, fee_tier);
		let pools = self.pools.lock().expect("mock pool lock poisoned");
		let pool = pools.get(&key).ok_or(AdapterError::PoolNotFound {
			token_in,
			token_out,
			fee_tier,
		})?;
		let (reserve_in, reserve_out) = if key.token0 == token_in {
			(pool.reserve0, pool.reserve1)
		} else {
			(pool.reserve1, pool.reserve0)
		};
		swap_output(reserve_in, reserve_out, amount_in, fee_tier)
	}

	/// Swaps on behalf of an arbitrary trader, moving funds between the
	/// trader and the pool and updating reserves. Tests use this to move the
	/// market price the way third-party swaps do on a live chain.
	pub fn market_swap(
		&self,
		trader: Address,
		token_in: Address,
		token_out: Address,
		fee_tier: FeeTier,
		amount_in: U256,
	) -> Result<U256, AdapterError> {
		let key = PoolKey::ordered(token_in, token_out, fee_tier);
		let mut pools = self.pools.lock().expect("mock pool lock poisoned");
		let pool = pools.get_mut(&key).ok_or(AdapterError::PoolNotFound {
			token_in,
			token_out,
			fee_tier,
		})?;
		let (reserve_in, reserve_out) = if key.token0 == token_in {
			(pool.reserve0, pool.reserve1)
		} else {
			(pool.reserve1, pool.reserve0)
		};
		let amount_out = swap_output(reserve_in, reserve_out, amount_in, fee_tier)?;

		self.bank.transfer(token_in, trader, key.address(), amount_in)?;
		self.bank
			.transfer(token_out, key.address(), trader, amount_out)?;

		if key.token0 == token_in {
			pool.reserve0 = pool.reserve0.saturating_add(amount_in);
			pool.reserve1 = pool.reserve1.saturating_sub(amount_out);
		} else {
			pool.reserve1 = pool.reserve1.saturating_add(amount_in);
			pool.reserve0 = pool.reserve0.saturating_sub(amount_out);
		}
		Ok(amount_out)
	}
}

/// Constant-product output for an exact input, fee taken on the input side.
fn swap_output(
	reserve_in: U256,
	reserve_out: U256,
	amount_in: U256,
	fee_tier: FeeTier,
) -> Result<U256, AdapterError> {
	let overflow = || AdapterError::Provider("mock pool arithmetic overflow".to_string());
	if u64::from(fee_tier) >= FEE_DENOMINATOR {
		return Err(AdapterError::Provider(format!(
			"fee tier {fee_tier} out of range"
		)));
	}
	let amount_in_after_fee = amount_in
		.checked_mul(U256::from(FEE_DENOMINATOR - u64::from(fee_tier)))
		.ok_or_else(overflow)?
		/ U256::from(FEE_DENOMINATOR);
	let numerator = reserve_out
		.checked_mul(amount_in_after_fee)
		.ok_or_else(overflow)?;
	let denominator = reserve_in
		.checked_add(amount_in_after_fee)
		.ok_or_else(overflow)?;
	if denominator.is_zero() {
		return Err(overflow());
	}
	Ok(numerator / denominator)
}

#[async_trait]
impl PriceOracle for MockAmm {
	async fn quote(&self, request: &QuoteRequest) -> Result<U256, AdapterError> {
		self.quote_pool(
			request.token_in,
			request.token_out,
			request.fee_tier,
			request.amount_in,
		)
	}
}

#[async_trait]
impl SwapExecutor for MockAmm {
	async fn swap_exact_input(&self, request: &SwapRequest) -> Result<U256, AdapterError> {
		let now = self.clock.now();
		if now > request.deadline {
			return Err(AdapterError::DeadlineElapsed {
				deadline: request.deadline,
				now,
			});
		}

		let amount_out = self.quote_pool(
			request.token_in,
			request.token_out,
			request.fee_tier,
			request.amount_in,
		)?;
		if amount_out < request.min_amount_out {
			return Err(AdapterError::SlippageExceeded {
				amount_out,
				min_amount_out: request.min_amount_out,
			});
		}

		let realized = self.market_swap(
			self.custody,
			request.token_in,
			request.token_out,
			request.fee_tier,
			request.amount_in,
		)?;
		if request.recipient != self.custody {
			self.bank
				.transfer(request.token_out, self.custody, request.recipient, realized)?;
		}
		Ok(realized)
	}
}
