//! Shared types for the limit-keeper system.
//!
//! This crate defines the domain types used across the engine, the AMM
//! adapters and the keeper service: order records, fixed-point price math,
//! engine events and the clock abstraction.

pub mod clock;
pub mod common;
pub mod events;
pub mod math;
pub mod order;

pub use clock::{Clock, ManualClock, SystemClock};
pub use common::{Address, Bytes, FeeTier, OrderId, Timestamp, U256, BPS_DENOMINATOR, PRICE_SCALE};
pub use events::EngineEvent;
pub use order::{Order, OrderParams};
