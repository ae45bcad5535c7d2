//! Uniswap-V3-style on-chain backend built on Alloy.
//!
//! Quotes through the periphery quoter, executes through the swap router and
//! moves escrow with plain ERC-20 transfers. All transactions are signed by
//! the engine's custody key; users grant that account an allowance before
//! creating an order, exactly as they would toward an on-chain escrow
//! contract.

use alloy::network::EthereumWallet;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use alloy_primitives::aliases::{U160, U24};
use async_trait::async_trait;
use tracing::debug;

use keeper_types::{Address, FeeTier, U256};

use crate::{AdapterError, PriceOracle, QuoteRequest, SwapExecutor, SwapRequest, TokenLedger};

sol! {
	#[sol(rpc)]
	interface IQuoter {
		function quoteExactInputSingle(
			address tokenIn,
			address tokenOut,
			uint24 fee,
			uint256 amountIn,
			uint160 sqrtPriceLimitX96
		) external returns (uint256 amountOut);
	}

	#[sol(rpc)]
	interface ISwapRouter {
		struct ExactInputSingleParams {
			address tokenIn;
			address tokenOut;
			uint24 fee;
			address recipient;
			uint256 deadline;
			uint256 amountIn;
			uint256 amountOutMinimum;
			uint160 sqrtPriceLimitX96;
		}

		function exactInputSingle(ExactInputSingleParams calldata params)
			external
			payable
			returns (uint256 amountOut);
	}

	#[sol(rpc)]
	interface IERC20 {
		function balanceOf(address account) external view returns (uint256);
		function transfer(address to, uint256 amount) external returns (bool);
		function transferFrom(address from, address to, uint256 amount) external returns (bool);
		function approve(address spender, uint256 amount) external returns (bool);
	}
}

/// Connection parameters for the on-chain backend.
#[derive(Debug, Clone)]
pub struct UniswapConfig {
	/// JSON-RPC endpoint URL.
	pub rpc_url: String,
	/// Private key of the engine's custody account.
	pub private_key: String,
	/// Periphery quoter contract.
	pub quoter: Address,
	/// Swap router contract.
	pub router: Address,
}

/// Alloy-backed implementation of all three adapter traits.
pub struct UniswapAmm {
	provider: DynProvider,
	quoter: Address,
	router: Address,
	custody: Address,
}

impl UniswapAmm {
	/// Connects to the configured RPC endpoint with a signing wallet.
	pub async fn connect(config: UniswapConfig) -> Result<Self, AdapterError> {
		let signer: PrivateKeySigner = config
			.private_key
			.parse()
			.map_err(|e| AdapterError::Provider(format!("invalid private key: {e}")))?;
		let custody = signer.address();
		let wallet = EthereumWallet::from(signer);
		let provider = ProviderBuilder::new()
			.wallet(wallet)
			.connect(&config.rpc_url)
			.await
			.map_err(provider_err)?
			.erased();
		Ok(Self {
			provider,
			quoter: config.quoter,
			router: config.router,
			custody,
		})
	}

	/// Address of the custody account funds are escrowed under.
	pub fn custody(&self) -> Address {
		self.custody
	}
}

fn provider_err<E: std::fmt::Display>(error: E) -> AdapterError {
	AdapterError::Provider(error.to_string())
}

fn fee_as_u24(fee_tier: FeeTier) -> Result<U24, AdapterError> {
	U24::try_from(fee_tier)
		.map_err(|_| AdapterError::Provider(format!("fee tier {fee_tier} out of range")))
}

#[async_trait]
impl PriceOracle for UniswapAmm {
	async fn quote(&self, request: &QuoteRequest) -> Result<U256, AdapterError> {
		let quoter = IQuoter::new(self.quoter, &self.provider);
		let amount_out = quoter
			.quoteExactInputSingle(
				request.token_in,
				request.token_out,
				fee_as_u24(request.fee_tier)?,
				request.amount_in,
				U160::ZERO,
			)
			.call()
			.await
			.map_err(provider_err)?;
		debug!(
			token_in = %request.token_in,
			token_out = %request.token_out,
			fee_tier = request.fee_tier,
			%amount_out,
			"quoted exact input"
		);
		Ok(amount_out)
	}
}

#[async_trait]
impl SwapExecutor for UniswapAmm {
	async fn swap_exact_input(&self, request: &SwapRequest) -> Result<U256, AdapterError> {
		let token_in = IERC20::new(request.token_in, &self.provider);
		let approval = token_in
			.approve(self.router, request.amount_in)
			.send()
			.await
			.map_err(provider_err)?
			.get_receipt()
			.await
			.map_err(provider_err)?;
		if !approval.status() {
			return Err(AdapterError::Provider("router approval reverted".to_string()));
		}

		let token_out = IERC20::new(request.token_out, &self.provider);
		let balance_before = token_out
			.balanceOf(request.recipient)
			.call()
			.await
			.map_err(provider_err)?;

		let params = ISwapRouter::ExactInputSingleParams {
			tokenIn: request.token_in,
			tokenOut: request.token_out,
			fee: fee_as_u24(request.fee_tier)?,
			recipient: request.recipient,
			deadline: U256::from(request.deadline),
			amountIn: request.amount_in,
			amountOutMinimum: request.min_amount_out,
			sqrtPriceLimitX96: U160::ZERO,
		};
		let router = ISwapRouter::new(self.router, &self.provider);
		let receipt = router
			.exactInputSingle(params)
			.send()
			.await
			.map_err(provider_err)?
			.get_receipt()
			.await
			.map_err(provider_err)?;
		if !receipt.status() {
			// The router enforces both the output bound and the deadline
			// on-chain; a revert does not say which one tripped.
			return Err(AdapterError::Provider(
				"swap reverted (output below minimum or deadline elapsed)".to_string(),
			));
		}

		// The router's return value is not recoverable from a receipt, so the
		// realized output is read as the recipient's balance delta.
		let balance_after = token_out
			.balanceOf(request.recipient)
			.call()
			.await
			.map_err(provider_err)?;
		let amount_out = balance_after.saturating_sub(balance_before);
		debug!(
			tx_hash = %receipt.transaction_hash,
			%amount_out,
			"executed exact input swap"
		);
		Ok(amount_out)
	}
}

#[async_trait]
impl TokenLedger for UniswapAmm {
	async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, AdapterError> {
		IERC20::new(token, &self.provider)
			.balanceOf(holder)
			.call()
			.await
			.map_err(provider_err)
	}

	async fn escrow_from(
		&self,
		token: Address,
		owner: Address,
		amount: U256,
	) -> Result<(), AdapterError> {
		let receipt = IERC20::new(token, &self.provider)
			.transferFrom(owner, self.custody, amount)
			.send()
			.await
			.map_err(provider_err)?
			.get_receipt()
			.await
			.map_err(provider_err)?;
		if !receipt.status() {
			return Err(AdapterError::InsufficientFunds(format!(
				"transferFrom of {amount} from {owner} reverted; check balance and allowance"
			)));
		}
		Ok(())
	}

	async fn release_to(
		&self,
		token: Address,
		recipient: Address,
		amount: U256,
	) -> Result<(), AdapterError> {
		let receipt = IERC20::new(token, &self.provider)
			.transfer(recipient, amount)
			.send()
			.await
			.map_err(provider_err)?
			.get_receipt()
			.await
			.map_err(provider_err)?;
		if !receipt.status() {
			return Err(AdapterError::InsufficientFunds(format!(
				"transfer of {amount} to {recipient} reverted"
			)));
		}
		Ok(())
	}
}
