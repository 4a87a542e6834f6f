// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Process-wide execution context: the shard-indexed reduce queues.
//!
//! A bus is created at engine start and shared by every sequence and every
//! worker. Queues live as long as the last clone of the bus.

use std::sync::{
	Arc,
	atomic::{AtomicU64, Ordering},
};

use strata_core::{ExecutionConfig, Job, Result};
use tracing::{debug, info};
use xxhash_rust::xxh3::xxh3_64;

use crate::reduce::{ReduceJob, ReduceQueue};

#[derive(Clone)]
pub struct MessageBus(Arc<Inner>);

struct Inner {
	config: ExecutionConfig,
	queues: Vec<Arc<ReduceQueue>>,
	next_sequence_id: AtomicU64,
}

impl MessageBus {
	pub fn new(config: ExecutionConfig) -> Result<Self> {
		config.validate()?;

		let queues = (0..config.shard_count)
			.map(|shard| {
				Arc::new(ReduceQueue::new(
					shard,
					config.reduce_queue_capacity,
					config.initial_task_capacity,
					config.retained_task_capacity(),
				))
			})
			.collect();

		info!(
			shards = config.shard_count,
			capacity = config.reduce_queue_capacity,
			page_frame_max_rows = config.page_frame_max_rows,
			"message bus created"
		);

		Ok(Self(Arc::new(Inner {
			config,
			queues,
			next_sequence_id: AtomicU64::new(1),
		})))
	}

	pub fn config(&self) -> &ExecutionConfig {
		&self.0.config
	}

	pub fn shard_count(&self) -> usize {
		self.0.queues.len()
	}

	pub fn queue(&self, shard: usize) -> Option<&Arc<ReduceQueue>> {
		self.0.queues.get(shard)
	}

	pub(crate) fn next_sequence_id(&self) -> u64 {
		self.0.next_sequence_id.fetch_add(1, Ordering::Relaxed)
	}

	/// Shard that serves a sequence.
	#[inline]
	pub fn shard_for(&self, sequence_id: u64) -> usize {
		(xxh3_64(&sequence_id.to_le_bytes()) % self.0.queues.len() as u64) as usize
	}

	/// Reduces one published task, trying `shard` first and then the other
	/// shards in order. Returns whether any work was done.
	pub fn steal(&self, shard: usize) -> bool {
		let queues = &self.0.queues;
		let count = queues.len();
		for offset in 0..count {
			let index = (shard + offset) % count;
			if queues[index].try_reduce() {
				if offset > 0 {
					debug!(from = index, to = shard, "stole reduce task");
				}
				return true;
			}
		}
		false
	}

	/// One job per shard, for registration with a worker pool.
	pub fn reduce_jobs(&self) -> Vec<Arc<dyn Job>> {
		(0..self.shard_count()).map(|shard| Arc::new(ReduceJob::new(self.clone(), shard)) as Arc<dyn Job>).collect()
	}
}

impl std::fmt::Debug for MessageBus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MessageBus").field("config", &self.0.config).field("queues", &self.0.queues).finish()
	}
}

#[cfg(test)]
mod tests {
	use strata_core::Error;

	use super::*;

	#[test]
	fn test_rejects_zero_capacity() {
		let err = MessageBus::new(ExecutionConfig::default().with_reduce_queue_capacity(0)).unwrap_err();
		assert!(matches!(
			err,
			Error::Configuration {
				option: "reduce_queue_capacity",
				..
			}
		));

		let err = MessageBus::new(ExecutionConfig::default().with_shard_count(0)).unwrap_err();
		assert!(matches!(
			err,
			Error::Configuration {
				option: "shard_count",
				..
			}
		));
	}

	#[test]
	fn test_shards_and_jobs() {
		let bus = MessageBus::new(ExecutionConfig::default().with_shard_count(3).with_reduce_queue_capacity(4)).unwrap();
		assert_eq!(bus.shard_count(), 3);
		assert_eq!(bus.queue(2).unwrap().capacity(), 4);
		assert!(bus.queue(3).is_none());

		let jobs = bus.reduce_jobs();
		assert_eq!(jobs.iter().map(|j| j.name().to_string()).collect::<Vec<_>>(), vec![
			"reduce-shard-0",
			"reduce-shard-1",
			"reduce-shard-2"
		]);
		assert!(!jobs[0].run_once(0));
	}

	#[test]
	fn test_shard_assignment_is_stable() {
		let bus = MessageBus::new(ExecutionConfig::default().with_shard_count(4)).unwrap();
		let first = bus.next_sequence_id();
		let second = bus.next_sequence_id();
		assert_ne!(first, second);
		assert_eq!(bus.shard_for(first), bus.shard_for(first));
		assert!(bus.shard_for(second) < 4);
	}
}
