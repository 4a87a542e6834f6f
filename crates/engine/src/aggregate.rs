// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! `sum(column)` over a filter.
//!
//! Reduce tasks capture the summed column for matching rows, so the
//! aggregate never goes back to the table. Frames are consumed in completion
//! order.

use std::sync::Arc;

use strata_core::{
	Error, Result, TableSource,
	predicate::{Filter, PredicateKind},
};
use tracing::instrument;

use crate::{
	bus::MessageBus,
	cursor::{Limit, ResolvedLimit},
	factory::QueryContext,
	sequence::{PageFrameSequence, ScanOrder},
};

/// Output row of [`FilteredSum`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SumRow {
	/// `None` when no row matched.
	pub sum: Option<f64>,
	pub count: u64,
}

pub struct FilteredSum {
	table: Arc<dyn TableSource>,
	filter: Filter,
	limit: Limit,
	sequence: PageFrameSequence,
	page_frame_max_rows: usize,
}

impl FilteredSum {
	pub fn new(
		bus: &MessageBus,
		table: Arc<dyn TableSource>,
		filter: Filter,
		column: &str,
		limit: Limit,
		kind: PredicateKind,
	) -> Result<Self> {
		let index = table.metadata().column_index(column).ok_or_else(|| Error::UnknownColumn {
			name: column.to_string(),
		})?;
		if !table.metadata().column_type(index)?.is_numeric() {
			return Err(Error::ColumnType {
				name: column.to_string(),
				expected: "numeric",
			});
		}

		let sequence = PageFrameSequence::new(bus, kind)?.with_capture([index]);
		Ok(Self {
			table,
			filter,
			limit,
			sequence,
			page_frame_max_rows: bus.config().page_frame_max_rows,
		})
	}

	/// Runs the aggregate. The limit applies to the single output row. A scan
	/// stopped by the circuit breaker produces no row.
	#[instrument(name = "engine::aggregate::sum", level = "debug", skip_all)]
	pub fn execute(&mut self, ctx: &QueryContext) -> Result<Vec<SumRow>> {
		let limit = self.limit.resolve(ctx.binds())?;
		let source = self.table.open(self.page_frame_max_rows);
		let filter = self.filter.bind(source.metadata(), ctx.binds())?;
		self.sequence.open(source, filter, ScanOrder::Any, ctx.breaker().clone())?;

		let mut sum = 0.0;
		let mut count = 0u64;
		loop {
			if let Some(handle) = self.sequence.next() {
				let folded = self.sequence.get_task(handle).map(|task| {
					let values = task.columns().first().map_or(&[][..], Vec::as_slice);
					(values.iter().sum::<f64>(), task.rows().len() as u64)
				});
				let collected = self.sequence.collect(handle, false);
				match folded.and_then(|folded| collected.map(|_| folded)) {
					Ok((frame_sum, frame_count)) => {
						sum += frame_sum;
						count += frame_count;
					}
					Err(err) => {
						self.sequence.await_completion();
						return Err(err);
					}
				}
			} else if self.sequence.is_exhausted() {
				break;
			} else {
				self.sequence.wait_for_progress();
			}
		}
		let cancelled = self.sequence.is_cancelled();
		self.sequence.await_completion();
		if cancelled {
			return Ok(Vec::new());
		}

		let row = SumRow {
			sum: (count > 0).then_some(sum),
			count,
		};
		Ok(match limit {
			ResolvedLimit::Positive(0) | ResolvedLimit::Negative(0) => Vec::new(),
			_ => vec![row],
		})
	}
}
