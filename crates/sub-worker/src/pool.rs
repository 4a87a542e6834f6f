// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
	thread::{self, JoinHandle},
};

use crossbeam_channel::{Sender, bounded};
use strata_core::{Error, Job, Result};
use tracing::{error, info};

use crate::{config::WorkerPoolConfig, worker::Worker};

/// Fixed set of OS threads polling assigned jobs until halted.
pub struct WorkerPool {
	config: WorkerPoolConfig,
	jobs: Vec<Arc<dyn Job>>,
	running: Arc<AtomicBool>,
	shutdown: Option<Sender<()>>,
	handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
	pub fn new(config: WorkerPoolConfig) -> Self {
		Self {
			config,
			jobs: Vec::new(),
			running: Arc::new(AtomicBool::new(false)),
			shutdown: None,
			handles: Vec::new(),
		}
	}

	pub fn config(&self) -> &WorkerPoolConfig {
		&self.config
	}

	pub fn worker_count(&self) -> usize {
		self.config.worker_count
	}

	pub fn is_running(&self) -> bool {
		self.running.load(Ordering::Acquire)
	}

	/// Registers a job. Jobs must be assigned before the pool starts.
	pub fn assign(&mut self, job: Arc<dyn Job>) -> Result<()> {
		if self.is_running() {
			return Err(Error::configuration("jobs", "cannot assign jobs to a running pool"));
		}
		self.jobs.push(job);
		Ok(())
	}

	pub fn assign_all(&mut self, jobs: impl IntoIterator<Item = Arc<dyn Job>>) -> Result<()> {
		for job in jobs {
			self.assign(job)?;
		}
		Ok(())
	}

	pub fn start(&mut self) -> Result<()> {
		if self.is_running() {
			return Ok(());
		}
		self.running.store(true, Ordering::Release);

		let (sender, receiver) = bounded::<()>(1);
		let jobs: Arc<[Arc<dyn Job>]> = self.jobs.iter().cloned().collect();

		for id in 0..self.config.worker_count {
			let name = format!("{}-{}", self.config.name, id);
			let worker = Worker {
				id,
				jobs: Arc::clone(&jobs),
				running: Arc::clone(&self.running),
				shutdown: receiver.clone(),
				idle_sleep: self.config.idle_sleep,
				spin_before_sleep: self.config.spin_before_sleep,
			};

			match thread::Builder::new().name(name.clone()).spawn(move || worker.run()) {
				Ok(handle) => self.handles.push(handle),
				Err(err) => {
					self.shutdown = Some(sender);
					self.halt();
					return Err(Error::WorkerSpawn {
						name,
						reason: err.to_string(),
					});
				}
			}
		}

		self.shutdown = Some(sender);
		info!(name = %self.config.name, workers = self.config.worker_count, jobs = self.jobs.len(), "worker pool started");
		Ok(())
	}

	/// Stops all workers and waits for them to exit. Idempotent.
	pub fn halt(&mut self) {
		self.running.store(false, Ordering::Release);
		// disconnecting wakes sleeping workers
		self.shutdown.take();

		let stopped = self.handles.len();
		for handle in self.handles.drain(..) {
			if let Err(panic) = handle.join() {
				error!(name = %self.config.name, ?panic, "worker thread panicked");
			}
		}
		if stopped > 0 {
			info!(name = %self.config.name, workers = stopped, "worker pool halted");
		}
	}
}

impl Drop for WorkerPool {
	fn drop(&mut self) {
		self.halt();
	}
}
