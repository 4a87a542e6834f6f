// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	sync::atomic::{AtomicUsize, Ordering},
	time::Duration,
};

use parking_lot::{Condvar, Mutex};

/// Counters of one page frame sequence, shared with the threads reducing its
/// tasks. Reducers bump `reduced` and wake whoever waits on the sequence.
#[derive(Debug, Default)]
pub(crate) struct Progress {
	pub(crate) frame_count: AtomicUsize,
	pub(crate) dispatched: AtomicUsize,
	pub(crate) reduced: AtomicUsize,
	pub(crate) collected: AtomicUsize,
	pub(crate) local: AtomicUsize,
	generation: Mutex<u64>,
	condvar: Condvar,
}

impl Progress {
	/// Ticket for [`Progress::wait`]; read it before checking the condition
	/// being waited for.
	pub(crate) fn generation(&self) -> u64 {
		*self.generation.lock()
	}

	pub(crate) fn notify_reduced(&self) {
		self.reduced.fetch_add(1, Ordering::AcqRel);
		let mut generation = self.generation.lock();
		*generation += 1;
		self.condvar.notify_all();
	}

	/// Parks until a task is reduced after `generation` was read, or until
	/// `timeout` passes.
	pub(crate) fn wait(&self, generation: u64, timeout: Duration) {
		let mut current = self.generation.lock();
		if *current == generation {
			let _ = self.condvar.wait_for(&mut current, timeout);
		}
	}

	pub(crate) fn reset(&self, frame_count: usize) {
		self.frame_count.store(frame_count, Ordering::Release);
		self.dispatched.store(0, Ordering::Release);
		self.reduced.store(0, Ordering::Release);
		self.collected.store(0, Ordering::Release);
		self.local.store(0, Ordering::Release);
	}

	pub(crate) fn snapshot(&self) -> SequenceProgress {
		SequenceProgress {
			frame_count: self.frame_count.load(Ordering::Acquire),
			dispatched: self.dispatched.load(Ordering::Acquire),
			reduced: self.reduced.load(Ordering::Acquire),
			collected: self.collected.load(Ordering::Acquire),
			local: self.local.load(Ordering::Acquire),
		}
	}
}

/// Point-in-time counters of a page frame sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequenceProgress {
	pub frame_count: usize,
	/// Frames handed to the queue or reduced locally.
	pub dispatched: usize,
	pub reduced: usize,
	/// Frames collected or discarded.
	pub collected: usize,
	/// Frames reduced on the calling thread because the queue was full.
	pub local: usize,
}

#[cfg(test)]
mod tests {
	use std::{sync::Arc, thread, time::Instant};

	use super::*;

	#[test]
	fn test_wait_returns_on_notify() {
		let progress = Arc::new(Progress::default());
		let generation = progress.generation();

		let notifier = Arc::clone(&progress);
		let handle = thread::spawn(move || notifier.notify_reduced());

		let start = Instant::now();
		progress.wait(generation, Duration::from_secs(5));
		handle.join().unwrap();

		assert!(start.elapsed() < Duration::from_secs(5));
		assert_eq!(progress.snapshot().reduced, 1);
	}

	#[test]
	fn test_wait_skips_when_generation_moved() {
		let progress = Progress::default();
		let generation = progress.generation();
		progress.notify_reduced();

		let start = Instant::now();
		progress.wait(generation, Duration::from_secs(5));
		assert!(start.elapsed() < Duration::from_secs(1));
	}
}
