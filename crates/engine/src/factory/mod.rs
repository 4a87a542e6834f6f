// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Cursor factories for filtered scans.

mod context;
mod planner;

use std::sync::Arc;

pub use context::QueryContext;
pub use planner::FilterPlanner;
use strata_core::{PageFrameSource, Result, TableSource, predicate::Filter};
use tracing::instrument;

use crate::{
	cursor::{FilteredCursor, Limit},
	sequence::{PageFrameSequence, ScanOrder},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryKind {
	/// Reduce queue with the interpreted predicate.
	Async,
	/// Reduce queue with the compiled predicate.
	AsyncCompiled,
	/// Every frame reduced on the calling thread.
	Sync,
}

/// Compiled filtered scan over one table. Owns a page frame sequence that is
/// reused by every execution.
pub struct FilteredFactory {
	kind: FactoryKind,
	table: Arc<dyn TableSource>,
	filter: Filter,
	limit: Limit,
	sequence: PageFrameSequence,
	page_frame_max_rows: usize,
}

impl FilteredFactory {
	pub(crate) fn new(
		kind: FactoryKind,
		table: Arc<dyn TableSource>,
		filter: Filter,
		limit: Limit,
		sequence: PageFrameSequence,
		page_frame_max_rows: usize,
	) -> Self {
		Self {
			kind,
			table,
			filter,
			limit,
			sequence,
			page_frame_max_rows,
		}
	}

	pub fn kind(&self) -> FactoryKind {
		self.kind
	}

	pub fn filter(&self) -> &Filter {
		&self.filter
	}

	pub fn limit(&self) -> Limit {
		self.limit
	}

	/// Opens a cursor over the table's current rows, in scan order.
	#[instrument(name = "engine::factory::cursor", level = "debug", skip_all, fields(kind = ?self.kind))]
	pub fn cursor(&mut self, ctx: &QueryContext) -> Result<FilteredCursor<'_>> {
		let limit = self.limit.resolve(ctx.binds())?;
		let source = self.open(ctx, ScanOrder::Asc)?;
		Ok(FilteredCursor::new(&mut self.sequence, source, limit))
	}

	/// Opens an execution and hands out the raw sequence.
	pub fn execute(&mut self, ctx: &QueryContext, order: ScanOrder) -> Result<&mut PageFrameSequence> {
		self.open(ctx, order)?;
		Ok(&mut self.sequence)
	}

	fn open(&mut self, ctx: &QueryContext, order: ScanOrder) -> Result<Arc<dyn PageFrameSource>> {
		self.sequence.await_completion();
		let source = self.table.open(self.page_frame_max_rows);
		let filter = self.filter.bind(source.metadata(), ctx.binds())?;
		self.sequence.open(Arc::clone(&source), filter, order, ctx.breaker().clone())?;
		Ok(source)
	}
}

impl Drop for FilteredFactory {
	fn drop(&mut self) {
		self.sequence.release();
	}
}
