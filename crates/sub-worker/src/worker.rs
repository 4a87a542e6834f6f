// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
	thread,
	time::Duration,
};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use strata_core::Job;
use tracing::{debug, trace};

pub(crate) struct Worker {
	pub(crate) id: usize,
	pub(crate) jobs: Arc<[Arc<dyn Job>]>,
	pub(crate) running: Arc<AtomicBool>,
	pub(crate) shutdown: Receiver<()>,
	pub(crate) idle_sleep: Duration,
	pub(crate) spin_before_sleep: usize,
}

impl Worker {
	/// Polls every job round-robin, starting at a per-worker offset so that
	/// workers spread over jobs. Yields while recently busy, then sleeps on
	/// the shutdown channel.
	pub(crate) fn run(self) {
		debug!(worker_id = self.id, jobs = self.jobs.len(), "worker started");
		let mut offset = self.id;
		let mut idle = 0usize;

		while self.running.load(Ordering::Acquire) {
			let mut busy = false;
			let count = self.jobs.len();
			for i in 0..count {
				let job = &self.jobs[(offset + i) % count];
				if job.run_once(self.id) {
					trace!(worker_id = self.id, job = job.name(), "job did work");
					busy = true;
				}
			}
			offset = offset.wrapping_add(1);

			if busy {
				idle = 0;
				continue;
			}

			idle += 1;
			if idle <= self.spin_before_sleep {
				thread::yield_now();
				continue;
			}

			match self.shutdown.recv_timeout(self.idle_sleep) {
				Err(RecvTimeoutError::Timeout) => {}
				Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
			}
		}

		debug!(worker_id = self.id, "worker stopped");
	}
}
