//! Conditional-order engine for the limit-keeper system.
//!
//! Holds escrowed orders, evaluates their target-price conditions against
//! live AMM quotes and executes the scan-then-execute upkeep protocol: any
//! caller may ask whether an order is executable ([`Engine::check_upkeep`]),
//! only the configured keeper may trigger execution
//! ([`Engine::perform_upkeep`]).

pub mod access;
pub mod engine;
pub mod errors;
pub mod evaluator;
pub mod event_bus;
pub mod scanner;
pub mod store;

pub use engine::{Engine, EngineBuilder, FillReceipt, Upkeep};
pub use errors::{EngineError, Result};
pub use event_bus::EventBus;
pub use store::{OrderBook, OrderStatus};
