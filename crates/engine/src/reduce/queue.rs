// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Bounded MPMC ring of reduce tasks.
//!
//! Every slot carries a stamp `position * 4 + state` where state is
//! [`FREE`], [`PUBLISHED`] or [`REDUCED`]. Producers claim the slot at the
//! publish cursor when it is free for that lap, consumers claim the slot at
//! the consume cursor once it is published, and the collector releases a
//! reduced slot by stamping it free for the next lap. A slot at the publish
//! cursor that still holds the previous lap means the queue is full.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, MutexGuard};
use strata_core::{LifecycleViolation, Result};

use crate::reduce::task::ReduceTask;

const FREE: u64 = 0;
const PUBLISHED: u64 = 1;
const REDUCED: u64 = 2;
const LAP: u64 = 4;

struct Slot {
	stamp: AtomicU64,
	task: Mutex<ReduceTask>,
}

pub struct ReduceQueue {
	shard: usize,
	slots: Box<[Slot]>,
	publish: AtomicU64,
	consume: AtomicU64,
	retained_capacity: usize,
}

impl ReduceQueue {
	pub fn new(shard: usize, capacity: usize, initial_task_capacity: usize, retained_capacity: usize) -> Self {
		let slots = (0..capacity as u64)
			.map(|position| Slot {
				stamp: AtomicU64::new(position * LAP + FREE),
				task: Mutex::new(ReduceTask::new(initial_task_capacity)),
			})
			.collect();

		Self {
			shard,
			slots,
			publish: AtomicU64::new(0),
			consume: AtomicU64::new(0),
			retained_capacity,
		}
	}

	pub fn shard(&self) -> usize {
		self.shard
	}

	pub fn capacity(&self) -> usize {
		self.slots.len()
	}

	#[inline]
	fn slot(&self, position: u64) -> &Slot {
		&self.slots[(position % self.slots.len() as u64) as usize]
	}

	/// Claims the next slot, lets `bind` fill its task and publishes it.
	/// Returns the slot position, or `None` when the queue is full.
	pub(crate) fn try_publish(&self, bind: impl FnOnce(&mut ReduceTask)) -> Option<u64> {
		loop {
			let position = self.publish.load(Ordering::Acquire);
			let slot = self.slot(position);
			let stamp = slot.stamp.load(Ordering::Acquire);

			if stamp == position * LAP + FREE {
				if self.publish
					.compare_exchange_weak(position, position + 1, Ordering::AcqRel, Ordering::Relaxed)
					.is_ok()
				{
					bind(&mut slot.task.lock());
					slot.stamp.store(position * LAP + PUBLISHED, Ordering::Release);
					return Some(position);
				}
			} else if stamp < position * LAP {
				return None;
			}
		}
	}

	/// Reduces the oldest published task, if any. Returns whether a task was
	/// reduced.
	pub(crate) fn try_reduce(&self) -> bool {
		loop {
			let position = self.consume.load(Ordering::Acquire);
			let slot = self.slot(position);
			let stamp = slot.stamp.load(Ordering::Acquire);

			if stamp == position * LAP + PUBLISHED {
				if self.consume
					.compare_exchange_weak(position, position + 1, Ordering::AcqRel, Ordering::Relaxed)
					.is_ok()
				{
					// The collector locks the slot before reading or releasing it, so
					// the notification lands before the sequence can drain.
					let mut task = slot.task.lock();
					task.reduce();
					slot.stamp.store(position * LAP + REDUCED, Ordering::Release);
					if let Some(progress) = task.progress.as_ref() {
						progress.notify_reduced();
					}
					return true;
				}
			} else if stamp < position * LAP + PUBLISHED {
				return false;
			}
		}
	}

	pub(crate) fn is_reduced(&self, position: u64) -> bool {
		self.slot(position).stamp.load(Ordering::Acquire) == position * LAP + REDUCED
	}

	/// Reduced task at `position`.
	pub(crate) fn task(&self, sequence_id: u64, position: u64, frame_index: usize) -> Result<MutexGuard<'_, ReduceTask>> {
		if !self.is_reduced(position) {
			return Err(LifecycleViolation::NotReady {
				sequence_id,
				frame_index,
			}
			.into());
		}
		Ok(self.slot(position).task.lock())
	}

	/// Resets the reduced task at `position` and frees its slot for the next
	/// lap.
	pub(crate) fn release(&self, position: u64) {
		let slot = self.slot(position);
		debug_assert!(self.is_reduced(position));
		slot.task.lock().reset(self.retained_capacity);
		slot.stamp.store((position + self.slots.len() as u64) * LAP + FREE, Ordering::Release);
	}

	/// Largest buffer capacity held by any slot's task, in rows.
	pub fn largest_task_capacity(&self) -> usize {
		self.slots
			.iter()
			.map(|slot| {
				let task = slot.task.lock();
				task.row_capacity().max(task.column_capacity())
			})
			.max()
			.unwrap_or(0)
	}

	/// Slots between publish and release.
	pub fn in_flight(&self) -> usize {
		self.slots.iter().filter(|slot| slot.stamp.load(Ordering::Acquire) % LAP != FREE).count()
	}
}

impl std::fmt::Debug for ReduceQueue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ReduceQueue")
			.field("shard", &self.shard)
			.field("capacity", &self.slots.len())
			.field("publish", &self.publish.load(Ordering::Relaxed))
			.field("consume", &self.consume.load(Ordering::Relaxed))
			.finish()
	}
}
