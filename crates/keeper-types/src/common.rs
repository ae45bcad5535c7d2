//! Common types used throughout the limit-keeper system.

// Re-export commonly used ethereum types
pub use alloy_primitives::{Address, Bytes, U256};

/// Unique, monotonically assigned order identifier. Ids start at 1 and are
/// never reused once an order has been removed.
pub type OrderId = u64;

/// AMM pool fee tier, in parts per million (e.g. 3000 = 0.3%).
pub type FeeTier = u32;

/// Timestamp (Unix seconds)
pub type Timestamp = u64;

/// Scale factor of the 18-decimal fixed-point price representation.
pub const PRICE_SCALE: U256 = U256::from_limbs([1_000_000_000_000_000_000u64, 0, 0, 0]);

/// Basis point denominator; 10000 bps = 100%.
pub const BPS_DENOMINATOR: u16 = 10_000;
