// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{Arc, Once};

use strata_core::{BindVariables, ExecutionConfig, TableSource, predicate::Filter};
use strata_engine::{FilterPlanner, FilteredFactory, Limit, MessageBus, QueryContext};
use strata_sub_worker::{WorkerPool, WorkerPoolConfig};
use tracing_subscriber::{EnvFilter, fmt};

static TRACING: Once = Once::new();

/// Installs a test writer subscriber honouring `RUST_LOG`. Safe to call from
/// every test.
pub fn init_tracing() {
	TRACING.call_once(|| {
		let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
		let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
	});
}

/// A message bus and a started worker pool serving its reduce queues. The
/// pool halts when the harness is dropped.
pub struct Harness {
	bus: MessageBus,
	pool: WorkerPool,
	binds: Arc<BindVariables>,
}

impl Harness {
	pub fn new(config: ExecutionConfig) -> Self {
		init_tracing();
		let workers = config.worker_count;
		let bus = MessageBus::new(config).unwrap_or_else(|err| panic!("invalid configuration: {err}"));

		let mut pool = WorkerPool::new(WorkerPoolConfig::for_execution(bus.config()).with_worker_count(workers));
		pool.assign_all(bus.reduce_jobs()).unwrap_or_else(|err| panic!("assign failed: {err}"));
		pool.start().unwrap_or_else(|err| panic!("pool start failed: {err}"));

		Self {
			bus,
			pool,
			binds: Arc::new(BindVariables::new()),
		}
	}

	/// Harness with the given reduce queue capacity, one shard and
	/// `workers` workers.
	pub fn with_queue(capacity: usize, page_frame_max_rows: usize, workers: usize) -> Self {
		Self::new(
			ExecutionConfig::default()
				.with_reduce_queue_capacity(capacity)
				.with_shard_count(1)
				.with_page_frame_max_rows(page_frame_max_rows)
				.with_worker_count(workers),
		)
	}

	pub fn bus(&self) -> &MessageBus {
		&self.bus
	}

	pub fn pool(&mut self) -> &mut WorkerPool {
		&mut self.pool
	}

	pub fn binds(&self) -> &Arc<BindVariables> {
		&self.binds
	}

	pub fn context(&self) -> QueryContext {
		QueryContext::new(self.bus.config(), self.binds.clone())
	}

	pub fn planner(&self) -> FilterPlanner {
		FilterPlanner::new(self.bus.clone())
	}

	pub fn plan(&self, table: Arc<dyn TableSource>, filter: Filter, limit: Limit) -> FilteredFactory {
		self.plan_with(table, filter, limit, &self.context())
	}

	pub fn plan_with(&self, table: Arc<dyn TableSource>, filter: Filter, limit: Limit, ctx: &QueryContext) -> FilteredFactory {
		self.planner().plan(table, filter, limit, ctx).unwrap_or_else(|err| panic!("plan failed: {err}"))
	}
}
