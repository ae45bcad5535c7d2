//! Principal checks for order-mutating operations.

use keeper_types::{Address, Order};

use crate::errors::{EngineError, Result};

/// Only the configured keeper may trigger execution.
pub fn ensure_keeper(keeper: Address, caller: Address) -> Result<()> {
	if caller == keeper {
		Ok(())
	} else {
		Err(EngineError::AccessDenied { caller })
	}
}

/// Only the order owner may cancel it.
pub fn ensure_owner(order: &Order, caller: Address) -> Result<()> {
	if caller == order.owner {
		Ok(())
	} else {
		Err(EngineError::AccessDenied { caller })
	}
}
