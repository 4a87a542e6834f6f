// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

/// Unit of background work polled by worker threads.
///
/// `run_once` must not block; it returns whether it did any work so an idle
/// worker can back off.
pub trait Job: Send + Sync {
	fn run_once(&self, worker_id: usize) -> bool;

	fn name(&self) -> &str {
		"unnamed_job"
	}
}
