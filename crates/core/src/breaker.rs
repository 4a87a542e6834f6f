// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};

/// Shared cancellation flag, polled at frame dispatch boundaries.
#[derive(Debug, Clone, Default)]
pub struct CircuitBreaker {
	tripped: Arc<AtomicBool>,
}

impl CircuitBreaker {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn trip(&self) {
		self.tripped.store(true, Ordering::Release);
	}

	pub fn is_tripped(&self) -> bool {
		self.tripped.load(Ordering::Acquire)
	}

	pub fn reset(&self) {
		self.tripped.store(false, Ordering::Release);
	}
}
