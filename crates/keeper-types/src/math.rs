//! Fixed-point price arithmetic.
//!
//! Prices are exchange rates scaled by 1e18 ([`PRICE_SCALE`]); slippage is
//! expressed in basis points. All helpers use checked U256 arithmetic and
//! return `None` on overflow or a zero denominator, which callers surface as
//! an overflow error rather than wrapping.

use crate::common::{U256, BPS_DENOMINATOR, PRICE_SCALE};

/// Computes `a * b / denom` with overflow checks.
pub fn mul_div(a: U256, b: U256, denom: U256) -> Option<U256> {
	if denom.is_zero() {
		return None;
	}
	a.checked_mul(b)?.checked_div(denom)
}

/// Normalizes a raw quote into the 18-decimal output-per-input price:
/// `amount_out * 1e18 / amount_in`.
pub fn normalize_price(amount_out: U256, amount_in: U256) -> Option<U256> {
	mul_div(amount_out, PRICE_SCALE, amount_in)
}

/// Minimum acceptable swap output for an order:
/// `amount_in * target_price / 1e18 * (10000 - slippage_bps) / 10000`.
///
/// A tolerance of 10000 bps disables the bound entirely.
pub fn min_amount_out(amount_in: U256, target_price: U256, slippage_bps: u16) -> Option<U256> {
	if slippage_bps > BPS_DENOMINATOR {
		return None;
	}
	let gross = mul_div(amount_in, target_price, PRICE_SCALE)?;
	mul_div(
		gross,
		U256::from(BPS_DENOMINATOR - slippage_bps),
		U256::from(BPS_DENOMINATOR),
	)
}
