//! Time source consumed by the engine.
//!
//! The engine never reads wall-clock time directly; it is handed a [`Clock`]
//! at construction so tests and the mock AMM can run against a controlled
//! timeline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::common::Timestamp;

/// Monotonically increasing clock, external to the engine.
pub trait Clock: Send + Sync {
	/// Current time in Unix seconds.
	fn now(&self) -> Timestamp;
}

/// Wall-clock implementation used by the keeper service.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> Timestamp {
		SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.unwrap_or_default()
			.as_secs()
	}
}

/// Manually advanced clock for tests and the in-memory AMM backend.
#[derive(Debug)]
pub struct ManualClock {
	now: AtomicU64,
}

impl ManualClock {
	pub fn new(start: Timestamp) -> Self {
		Self {
			now: AtomicU64::new(start),
		}
	}

	/// Moves the clock forward by `secs` seconds.
	pub fn advance(&self, secs: u64) {
		self.now.fetch_add(secs, Ordering::SeqCst);
	}
}

impl Clock for ManualClock {
	fn now(&self) -> Timestamp {
		self.now.load(Ordering::SeqCst)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn manual_clock_advances() {
		let clock = ManualClock::new(1_000);
		assert_eq!(clock.now(), 1_000);
		clock.advance(60);
		assert_eq!(clock.now(), 1_060);
	}
}
