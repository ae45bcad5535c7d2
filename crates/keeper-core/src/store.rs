//! Authoritative order storage.
//!
//! The store owns the order lifecycle: ids are assigned sequentially from 1
//! and never reused, and removal is the only mutation after insertion. The
//! store never moves funds; custody movement happens at the engine call
//! sites so the checks-effects ordering stays auditable there.

use std::collections::BTreeMap;

use keeper_types::{Order, OrderId};

use crate::errors::{EngineError, Result};

/// Explicit lifecycle view of an id; absence from the store is terminal.
#[derive(Debug, PartialEq, Eq)]
pub enum OrderStatus<'a> {
	Active(&'a Order),
	Absent,
}

/// Keyed collection of active orders with deterministic ascending-id
/// iteration.
#[derive(Debug, Default)]
pub struct OrderBook {
	orders: BTreeMap<OrderId, Order>,
	next_id: OrderId,
}

impl OrderBook {
	pub fn new() -> Self {
		Self {
			orders: BTreeMap::new(),
			next_id: 1,
		}
	}

	/// Assigns the next sequential id to `order` and stores it.
	pub fn insert(&mut self, mut order: Order) -> OrderId {
		let id = self.next_id;
		self.next_id += 1;
		order.id = id;
		self.orders.insert(id, order);
		id
	}

	pub fn get(&self, id: OrderId) -> Result<&Order> {
		self.orders.get(&id).ok_or(EngineError::OrderNotFound(id))
	}

	/// Deletes the record, returning it. Re-querying a removed id fails.
	pub fn remove(&mut self, id: OrderId) -> Result<Order> {
		self.orders.remove(&id).ok_or(EngineError::OrderNotFound(id))
	}

	pub fn status(&self, id: OrderId) -> OrderStatus<'_> {
		match self.orders.get(&id) {
			Some(order) => OrderStatus::Active(order),
			None => OrderStatus::Absent,
		}
	}

	/// Active orders in ascending id order.
	pub fn iter(&self) -> impl Iterator<Item = &Order> {
		self.orders.values()
	}

	pub fn len(&self) -> usize {
		self.orders.len()
	}

	pub fn is_empty(&self) -> bool {
		self.orders.is_empty()
	}
}
