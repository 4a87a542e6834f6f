// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use strata_core::Job;
use tracing::instrument;

use crate::bus::MessageBus;

/// Worker-side consumer of one shard's reduce queue.
///
/// Serves its own shard first and steals from the other shards when that is
/// empty.
pub struct ReduceJob {
	bus: MessageBus,
	shard: usize,
	name: String,
}

impl ReduceJob {
	pub fn new(bus: MessageBus, shard: usize) -> Self {
		Self {
			bus,
			shard,
			name: format!("reduce-shard-{shard}"),
		}
	}

	pub fn shard(&self) -> usize {
		self.shard
	}
}

impl Job for ReduceJob {
	#[instrument(name = "engine::reduce::run_once", level = "trace", skip(self), fields(shard = self.shard))]
	fn run_once(&self, worker_id: usize) -> bool {
		self.bus.steal(self.shard)
	}

	fn name(&self) -> &str {
		&self.name
	}
}
