// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Page frame sequence: one query execution over a page frame source.
//!
//! [`PageFrameSequence::next`] dispatches frames to the shard's reduce queue
//! and hands back handles of reduced frames. When the queue is full and the
//! sequence has nothing of its own waiting in it, the next frame is reduced
//! on the calling thread instead, so a caller never waits for queue space.
//! When it does have frames waiting, the caller helps by reducing queued
//! tasks itself. Every handle must be passed to
//! [`PageFrameSequence::collect`] exactly once.
//!
//! Teardown always drains: [`PageFrameSequence::await_completion`] waits for
//! every dispatched frame and discards the results nobody collected. Dropping
//! a sequence drains it as well.

mod symbols;

use std::{
	collections::VecDeque,
	ops::Deref,
	sync::{Arc, atomic::Ordering},
	time::Duration,
};

use parking_lot::MutexGuard;
use strata_core::{
	CircuitBreaker, Error, LifecycleViolation, PageFrameSource, Result,
	predicate::{BoundFilter, PredicateKind},
};
use tracing::{debug, instrument, trace};

use crate::{
	bus::MessageBus,
	reduce::{ReduceQueue, ReduceTask, SequenceProgress, progress::Progress},
};
use symbols::PredicateCache;

const PARK_TIMEOUT: Duration = Duration::from_millis(1);

/// Order in which reduced frames are handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanOrder {
	/// Completion order.
	#[default]
	Any,
	/// Ascending frame index.
	Asc,
	/// Descending frame index. Frames are also dispatched last to first.
	Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
	Shared(u64),
	Local(u64),
}

/// Identifies one dispatched frame of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle {
	sequence_id: u64,
	placement: Placement,
	frame_index: usize,
	ordinal: usize,
}

impl FrameHandle {
	pub fn sequence_id(&self) -> u64 {
		self.sequence_id
	}

	pub fn frame_index(&self) -> usize {
		self.frame_index
	}

	/// Position in dispatch order.
	pub fn ordinal(&self) -> usize {
		self.ordinal
	}

	/// Reduced on the calling thread because the queue was full.
	pub fn is_local(&self) -> bool {
		matches!(self.placement, Placement::Local(_))
	}
}

#[derive(Debug)]
struct InFlight {
	placement: Placement,
	frame_index: usize,
	ordinal: usize,
	/// Handed out by `next`.
	issued: bool,
}

/// Reduced task of a handle; releases the slot lock on drop.
pub enum TaskGuard<'a> {
	Shared(MutexGuard<'a, ReduceTask>),
	Local(&'a ReduceTask),
}

impl Deref for TaskGuard<'_> {
	type Target = ReduceTask;

	fn deref(&self) -> &ReduceTask {
		match self {
			TaskGuard::Shared(guard) => guard,
			TaskGuard::Local(task) => task,
		}
	}
}

enum Dispatch {
	Published,
	Local(FrameHandle),
	Blocked,
}

pub struct PageFrameSequence {
	bus: MessageBus,
	queue: Option<Arc<ReduceQueue>>,
	id: u64,
	shard: usize,
	order: ScanOrder,
	capture: Arc<[usize]>,
	source: Option<Arc<dyn PageFrameSource>>,
	breaker: CircuitBreaker,
	predicates: PredicateCache,
	frame_count: usize,
	dispatched: usize,
	next_issue: usize,
	cancelled: bool,
	in_flight: VecDeque<InFlight>,
	local: ReduceTask,
	local_generation: u64,
	local_busy: bool,
	retained_capacity: usize,
	progress: Arc<Progress>,
}

impl PageFrameSequence {
	/// Sequence that dispatches to the bus's reduce queues.
	pub fn new(bus: &MessageBus, kind: PredicateKind) -> Result<Self> {
		Self::build(bus, kind, true)
	}

	/// Sequence that reduces every frame on the calling thread.
	pub fn local(bus: &MessageBus, kind: PredicateKind) -> Result<Self> {
		Self::build(bus, kind, false)
	}

	fn build(bus: &MessageBus, kind: PredicateKind, shared: bool) -> Result<Self> {
		let config = bus.config();
		config.validate()?;

		let id = bus.next_sequence_id();
		let shard = bus.shard_for(id);
		Ok(Self {
			bus: bus.clone(),
			queue: if shared {
				bus.queue(shard).cloned()
			} else {
				None
			},
			id,
			shard,
			order: ScanOrder::Any,
			capture: Arc::from([]),
			source: None,
			breaker: CircuitBreaker::new(),
			predicates: PredicateCache::new(kind),
			frame_count: 0,
			dispatched: 0,
			next_issue: 0,
			cancelled: false,
			in_flight: VecDeque::new(),
			local: ReduceTask::new(config.initial_task_capacity),
			local_generation: 0,
			local_busy: false,
			retained_capacity: config.retained_task_capacity(),
			progress: Arc::new(Progress::default()),
		})
	}

	/// Columns whose values reduce tasks capture for matching rows.
	pub fn with_capture(mut self, columns: impl IntoIterator<Item = usize>) -> Self {
		self.capture = columns.into_iter().collect();
		self
	}

	/// Starts an execution. The previous execution must have been drained.
	#[instrument(name = "engine::sequence::open", level = "debug", skip_all, fields(sequence_id))]
	pub fn open(
		&mut self,
		source: Arc<dyn PageFrameSource>,
		filter: BoundFilter,
		order: ScanOrder,
		breaker: CircuitBreaker,
	) -> Result<()> {
		self.clear()?;

		self.id = self.bus.next_sequence_id();
		self.shard = self.bus.shard_for(self.id);
		if self.queue.is_some() {
			self.queue = self.bus.queue(self.shard).cloned();
		}
		tracing::Span::current().record("sequence_id", self.id);

		self.frame_count = source.frame_count();
		self.order = order;
		self.breaker = breaker;
		self.predicates.prepare(filter);
		self.source = Some(source);
		self.progress.reset(self.frame_count);

		debug!(shard = self.shard, frames = self.frame_count, ?order, "sequence opened");
		Ok(())
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn shard(&self) -> usize {
		self.shard
	}

	pub fn order(&self) -> ScanOrder {
		self.order
	}

	pub fn frame_count(&self) -> usize {
		self.frame_count
	}

	pub fn source(&self) -> Option<&Arc<dyn PageFrameSource>> {
		self.source.as_ref()
	}

	pub fn progress(&self) -> SequenceProgress {
		self.progress.snapshot()
	}

	/// Frames dispatched and not yet collected.
	pub fn in_flight(&self) -> usize {
		self.in_flight.len()
	}

	/// Dispatch was stopped by the circuit breaker or by
	/// [`PageFrameSequence::await_completion`]. Frames already dispatched are
	/// still handed out by `next`.
	pub fn is_cancelled(&self) -> bool {
		self.cancelled
	}

	/// True once `next` will not return any further handle.
	pub fn is_exhausted(&self) -> bool {
		(self.cancelled || self.dispatched == self.frame_count) && !self.in_flight.iter().any(|f| !f.issued)
	}

	/// Returns the handle of a reduced frame, dispatching more frames as
	/// queue space allows. `None` means nothing is ready yet, or the
	/// sequence is exhausted; see [`PageFrameSequence::is_exhausted`].
	#[instrument(name = "engine::sequence::next", level = "trace", skip_all, fields(sequence_id = self.id))]
	pub fn next(&mut self) -> Option<FrameHandle> {
		loop {
			if let Some(handle) = self.issue_ready() {
				return Some(handle);
			}

			if !self.cancelled && self.breaker.is_tripped() {
				debug!(sequence_id = self.id, dispatched = self.dispatched, "circuit breaker tripped, dispatch stopped");
				self.cancelled = true;
			}

			if !self.cancelled && self.dispatched < self.frame_count {
				match self.dispatch() {
					Dispatch::Published => continue,
					Dispatch::Local(handle) => return Some(handle),
					Dispatch::Blocked => {}
				}
			}

			if self.has_pending() && self.bus.steal(self.shard) {
				continue;
			}
			return None;
		}
	}

	/// Reduces one queued task or parks briefly until one of this
	/// sequence's frames is reduced.
	pub fn wait_for_progress(&self) {
		let generation = self.progress.generation();
		if self.has_ready() {
			return;
		}
		if !self.bus.steal(self.shard) {
			self.progress.wait(generation, PARK_TIMEOUT);
		}
	}

	pub fn get_task(&self, handle: FrameHandle) -> Result<TaskGuard<'_>> {
		self.find(handle)?;
		match handle.placement {
			Placement::Shared(position) => match &self.queue {
				Some(queue) => Ok(TaskGuard::Shared(queue.task(self.id, position, handle.frame_index)?)),
				None => Err(self.not_ready(handle)),
			},
			Placement::Local(_) => Ok(TaskGuard::Local(&self.local)),
		}
	}

	/// Releases a handle's task. Unless `force_discard` is set, a predicate
	/// failure captured on the task is returned; the slot is released either
	/// way.
	#[instrument(name = "engine::sequence::collect", level = "trace", skip_all, fields(sequence_id = self.id, frame_index = handle.frame_index))]
	pub fn collect(&mut self, handle: FrameHandle, force_discard: bool) -> Result<()> {
		let index = self.find(handle)?;
		let error = match handle.placement {
			Placement::Shared(position) => {
				let Some(queue) = &self.queue else {
					return Err(self.not_ready(handle));
				};
				let error = queue.task(self.id, position, handle.frame_index)?.take_error();
				queue.release(position);
				error
			}
			Placement::Local(_) => {
				let error = self.local.take_error();
				self.local.reset(self.retained_capacity);
				self.local_busy = false;
				error
			}
		};

		self.in_flight.remove(index);
		self.progress.collected.fetch_add(1, Ordering::AcqRel);

		match error {
			Some(error) if !force_discard => Err(error),
			_ => Ok(()),
		}
	}

	/// Stops dispatch and blocks until every dispatched frame has been
	/// reduced, discarding everything not yet collected.
	#[instrument(name = "engine::sequence::await", level = "trace", skip_all, fields(sequence_id = self.id))]
	pub fn await_completion(&mut self) {
		self.cancelled = true;
		let discarded = self.in_flight.len();

		while let Some(frame) = self.in_flight.pop_front() {
			match frame.placement {
				Placement::Shared(position) => {
					if let Some(queue) = self.queue.clone() {
						while !queue.is_reduced(position) {
							let generation = self.progress.generation();
							if queue.is_reduced(position) {
								break;
							}
							if !self.bus.steal(self.shard) {
								self.progress.wait(generation, PARK_TIMEOUT);
							}
						}
						queue.release(position);
					}
				}
				Placement::Local(_) => {
					self.local.reset(self.retained_capacity);
					self.local_busy = false;
				}
			}
			self.progress.collected.fetch_add(1, Ordering::AcqRel);
		}

		if discarded > 0 {
			debug!(sequence_id = self.id, discarded, "drained in-flight frames");
		}
	}

	/// Resets the sequence for another execution. Fails while frames are
	/// in flight.
	pub fn clear(&mut self) -> Result<()> {
		if !self.in_flight.is_empty() {
			return Err(LifecycleViolation::InFlight {
				sequence_id: self.id,
				in_flight: self.in_flight.len(),
			}
			.into());
		}

		self.source = None;
		self.frame_count = 0;
		self.dispatched = 0;
		self.next_issue = 0;
		self.cancelled = false;
		self.progress.reset(0);
		Ok(())
	}

	/// Drains, clears and drops cached symbol resolutions.
	pub fn release(&mut self) {
		self.await_completion();
		self.source = None;
		self.predicates.release();
	}

	fn frame_index_of(&self, ordinal: usize) -> usize {
		match self.order {
			ScanOrder::Desc => self.frame_count - 1 - ordinal,
			ScanOrder::Any | ScanOrder::Asc => ordinal,
		}
	}

	fn is_reduced(&self, frame: &InFlight) -> bool {
		match frame.placement {
			Placement::Shared(position) => self.queue.as_ref().is_some_and(|q| q.is_reduced(position)),
			Placement::Local(_) => true,
		}
	}

	fn has_pending(&self) -> bool {
		self.in_flight.iter().any(|f| !f.issued)
	}

	fn has_ready(&self) -> bool {
		self.in_flight.iter().any(|f| !f.issued && self.is_reduced(f))
	}

	fn issue_ready(&mut self) -> Option<FrameHandle> {
		let index = match self.order {
			ScanOrder::Any => self.in_flight.iter().position(|f| !f.issued && self.is_reduced(f))?,
			ScanOrder::Asc | ScanOrder::Desc => {
				let index = self.in_flight.iter().position(|f| f.ordinal == self.next_issue)?;
				if !self.is_reduced(&self.in_flight[index]) {
					return None;
				}
				self.next_issue += 1;
				index
			}
		};

		let frame = &mut self.in_flight[index];
		frame.issued = true;
		trace!(frame_index = frame.frame_index, "frame ready");
		Some(FrameHandle {
			sequence_id: self.id,
			placement: frame.placement,
			frame_index: frame.frame_index,
			ordinal: frame.ordinal,
		})
	}

	fn dispatch(&mut self) -> Dispatch {
		let Some(source) = self.source.clone() else {
			return Dispatch::Blocked;
		};
		let ordinal = self.dispatched;
		let frame_index = self.frame_index_of(ordinal);
		let Some(frame) = source.frame(frame_index) else {
			self.cancelled = true;
			return Dispatch::Blocked;
		};
		let Some(predicate) = self.predicates.predicate(source.as_ref(), frame.partition_index()) else {
			self.cancelled = true;
			return Dispatch::Blocked;
		};

		if let Some(queue) = &self.queue {
			let progress = Arc::clone(&self.progress);
			let (id, capture) = (self.id, &self.capture);
			if let Some(position) = queue.try_publish(|task| {
				task.bind(id, frame.clone(), Arc::clone(&predicate), capture, Some(progress))
			}) {
				self.in_flight.push_back(InFlight {
					placement: Placement::Shared(position),
					frame_index,
					ordinal,
					issued: false,
				});
				self.dispatched += 1;
				self.progress.dispatched.fetch_add(1, Ordering::AcqRel);
				return Dispatch::Published;
			}
		}

		if self.local_busy || self.has_pending() {
			return Dispatch::Blocked;
		}

		self.local_busy = true;
		self.local_generation += 1;
		self.local.bind(self.id, frame, predicate, &self.capture, None);
		self.local.reduce();
		if self.queue.is_some() {
			debug!(sequence_id = self.id, frame_index, "queue full, reduced frame locally");
		}

		let placement = Placement::Local(self.local_generation);
		self.in_flight.push_back(InFlight {
			placement,
			frame_index,
			ordinal,
			issued: true,
		});
		self.dispatched += 1;
		if matches!(self.order, ScanOrder::Asc | ScanOrder::Desc) {
			self.next_issue += 1;
		}
		self.progress.dispatched.fetch_add(1, Ordering::AcqRel);
		self.progress.local.fetch_add(1, Ordering::AcqRel);
		self.progress.reduced.fetch_add(1, Ordering::AcqRel);

		Dispatch::Local(FrameHandle {
			sequence_id: self.id,
			placement,
			frame_index,
			ordinal,
		})
	}

	/// Index of the handle's in-flight entry.
	fn find(&self, handle: FrameHandle) -> Result<usize> {
		if handle.sequence_id != self.id {
			return Err(LifecycleViolation::ForeignHandle {
				sequence_id: self.id,
				handle_sequence_id: handle.sequence_id,
			}
			.into());
		}
		self.in_flight
			.iter()
			.position(|f| f.placement == handle.placement && f.issued)
			.ok_or_else(|| {
				LifecycleViolation::DoubleCollect {
					sequence_id: self.id,
					frame_index: handle.frame_index,
				}
				.into()
			})
	}

	fn not_ready(&self, handle: FrameHandle) -> Error {
		LifecycleViolation::NotReady {
			sequence_id: self.id,
			frame_index: handle.frame_index,
		}
		.into()
	}
}

impl Drop for PageFrameSequence {
	fn drop(&mut self) {
		if !self.in_flight.is_empty() {
			self.await_completion();
		}
	}
}

impl std::fmt::Debug for PageFrameSequence {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PageFrameSequence")
			.field("id", &self.id)
			.field("shard", &self.shard)
			.field("order", &self.order)
			.field("progress", &self.progress.snapshot())
			.field("in_flight", &self.in_flight.len())
			.field("resolved_partitions", &self.predicates.resolved_partitions())
			.finish()
	}
}
