// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::time::Duration;

use strata_core::ExecutionConfig;

/// Configuration for a [`crate::WorkerPool`].
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
	/// Thread name prefix; threads are named `<name>-<index>`.
	pub name: String,
	/// Number of worker threads. Zero is allowed: jobs then only run when
	/// other threads help.
	pub worker_count: usize,
	/// How long an idle worker sleeps before polling again.
	pub idle_sleep: Duration,
	/// Idle polls that only yield before the worker starts sleeping.
	pub spin_before_sleep: usize,
}

impl Default for WorkerPoolConfig {
	fn default() -> Self {
		Self {
			name: "worker".to_string(),
			worker_count: num_cpus::get(),
			idle_sleep: Duration::from_millis(1),
			spin_before_sleep: 64,
		}
	}
}

impl WorkerPoolConfig {
	/// Pool sized by the execution configuration.
	pub fn for_execution(config: &ExecutionConfig) -> Self {
		Self {
			name: "reduce".to_string(),
			worker_count: config.worker_count,
			..Self::default()
		}
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	pub fn with_worker_count(mut self, worker_count: usize) -> Self {
		self.worker_count = worker_count;
		self
	}
}
