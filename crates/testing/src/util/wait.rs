// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Wait utilities for testing
//!
//! Polls a condition instead of sleeping for a fixed time, so tests stay
//! fast when the condition is met early.

use std::{
	thread,
	time::{Duration, Instant},
};

use tracing::debug;

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default poll interval (1 millisecond)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Wait for a condition to become true, polling at regular intervals
///
/// # Panics
/// Panics if the condition doesn't become true within the timeout period
pub fn wait_for_condition<F>(condition: F, timeout: Duration, poll_interval: Duration, timeout_message: &str)
where
	F: Fn() -> bool,
{
	let start = Instant::now();
	let mut poll_count = 0u64;

	while !condition() {
		if start.elapsed() > timeout {
			panic!("Timeout after {:?}: {}", timeout, timeout_message);
		}
		poll_count += 1;
		thread::sleep(poll_interval);
	}
	debug!(polls = poll_count, elapsed = ?start.elapsed(), msg = timeout_message, "condition met");
}

/// Wait for a condition with default timeout and poll interval
pub fn wait_for<F>(condition: F, message: &str)
where
	F: Fn() -> bool,
{
	wait_for_condition(condition, DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL, message)
}
