// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Execution configuration recognised by the query core.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Selects between the compiled and the interpreted predicate variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitMode {
	Disabled,
	#[default]
	Enabled,
}

/// Configuration for parallel page frame execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
	/// Maximum rows per page frame. Also bounds the retained capacity of
	/// released reduce tasks.
	pub page_frame_max_rows: usize,
	/// Reduce task slots per shard.
	pub reduce_queue_capacity: usize,
	/// Number of independent reduce queues.
	pub shard_count: usize,
	/// Predicate variant used when the filter supports compilation.
	pub jit_mode: JitMode,
	/// When disabled, filters run on the calling thread only.
	pub parallel_filter_enabled: bool,
	/// Initial row id capacity of a reduce task.
	pub initial_task_capacity: usize,
	/// Worker threads polling the reduce queues.
	pub worker_count: usize,
}

impl Default for ExecutionConfig {
	fn default() -> Self {
		Self {
			page_frame_max_rows: 1_000_000,
			reduce_queue_capacity: 64,
			shard_count: 4,
			jit_mode: JitMode::Enabled,
			parallel_filter_enabled: true,
			initial_task_capacity: 16,
			worker_count: num_cpus::get(),
		}
	}
}

impl ExecutionConfig {
	pub fn with_page_frame_max_rows(mut self, rows: usize) -> Self {
		self.page_frame_max_rows = rows;
		self
	}

	pub fn with_reduce_queue_capacity(mut self, capacity: usize) -> Self {
		self.reduce_queue_capacity = capacity;
		self
	}

	pub fn with_shard_count(mut self, shards: usize) -> Self {
		self.shard_count = shards;
		self
	}

	pub fn with_jit_mode(mut self, mode: JitMode) -> Self {
		self.jit_mode = mode;
		self
	}

	pub fn with_parallel_filter(mut self, enabled: bool) -> Self {
		self.parallel_filter_enabled = enabled;
		self
	}

	pub fn with_worker_count(mut self, workers: usize) -> Self {
		self.worker_count = workers;
		self
	}

	pub fn validate(&self) -> Result<()> {
		if self.reduce_queue_capacity == 0 {
			return Err(Error::configuration("reduce_queue_capacity", "must be at least 1"));
		}
		if self.shard_count == 0 {
			return Err(Error::configuration("shard_count", "must be at least 1"));
		}
		if self.page_frame_max_rows == 0 {
			return Err(Error::configuration("page_frame_max_rows", "must be at least 1"));
		}
		if self.initial_task_capacity == 0 {
			return Err(Error::configuration("initial_task_capacity", "must be at least 1"));
		}
		Ok(())
	}

	/// Upper bound for the row capacity a released task may keep.
	pub fn retained_task_capacity(&self) -> usize {
		self.initial_task_capacity.max(self.page_frame_max_rows)
	}
}
