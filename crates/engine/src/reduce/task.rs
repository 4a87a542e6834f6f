// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	panic::{self, AssertUnwindSafe},
	sync::Arc,
};

use strata_core::{Error, PageFrame, RowId, predicate::Predicate};
use tracing::warn;

use crate::reduce::progress::Progress;

/// Reusable scratch state for filtering one page frame.
///
/// A task is bound to a frame, reduced by exactly one thread, read by the
/// collector and then reset for the next frame. Row ids are in ascending row
/// order.
#[derive(Debug)]
pub struct ReduceTask {
	sequence_id: u64,
	frame_index: usize,
	frame: Option<PageFrame>,
	predicate: Option<Arc<Predicate>>,
	capture: Arc<[usize]>,
	rows: Vec<RowId>,
	columns: Vec<Vec<f64>>,
	error: Option<Error>,
	initial_capacity: usize,
	pub(crate) progress: Option<Arc<Progress>>,
}

impl ReduceTask {
	pub fn new(initial_capacity: usize) -> Self {
		Self {
			sequence_id: 0,
			frame_index: 0,
			frame: None,
			predicate: None,
			capture: Arc::from([]),
			rows: Vec::with_capacity(initial_capacity),
			columns: Vec::new(),
			error: None,
			initial_capacity,
			progress: None,
		}
	}

	pub fn sequence_id(&self) -> u64 {
		self.sequence_id
	}

	pub fn frame_index(&self) -> usize {
		self.frame_index
	}

	pub fn frame(&self) -> Option<&PageFrame> {
		self.frame.as_ref()
	}

	/// Matching rows of the frame.
	pub fn rows(&self) -> &[RowId] {
		&self.rows
	}

	/// Captured values, one vector per captured column, aligned with
	/// [`ReduceTask::rows`].
	pub fn columns(&self) -> &[Vec<f64>] {
		&self.columns
	}

	pub fn error(&self) -> Option<&Error> {
		self.error.as_ref()
	}

	/// Row id capacity currently held by the task.
	pub fn row_capacity(&self) -> usize {
		self.rows.capacity()
	}

	pub fn column_capacity(&self) -> usize {
		self.columns.iter().map(Vec::capacity).max().unwrap_or(0)
	}

	pub(crate) fn bind(
		&mut self,
		sequence_id: u64,
		frame: PageFrame,
		predicate: Arc<Predicate>,
		capture: &Arc<[usize]>,
		progress: Option<Arc<Progress>>,
	) {
		debug_assert!(self.frame.is_none(), "task bound twice");
		self.sequence_id = sequence_id;
		self.frame_index = frame.frame_index();
		self.frame = Some(frame);
		self.predicate = Some(predicate);
		if !Arc::ptr_eq(&self.capture, capture) {
			self.capture = Arc::clone(capture);
		}
		self.columns.resize_with(self.capture.len(), || Vec::with_capacity(self.initial_capacity));
		self.progress = progress;
	}

	/// Evaluates the predicate over every row of the bound frame.
	///
	/// The first failing row stops the scan and is recorded as the task's
	/// error. A panic inside the predicate is recorded the same way.
	pub(crate) fn reduce(&mut self) {
		let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.filter_rows()));
		if let Err(payload) = outcome {
			let message = payload
				.downcast_ref::<&str>()
				.map(|s| s.to_string())
				.or_else(|| payload.downcast_ref::<String>().cloned())
				.unwrap_or_else(|| "predicate panicked".to_string());
			self.fail(self.frame.as_ref().map_or(0, PageFrame::row_lo), message);
		}
	}

	fn filter_rows(&mut self) {
		let (Some(frame), Some(predicate)) = (self.frame.as_ref(), self.predicate.as_ref()) else {
			return;
		};
		let partition = frame.partition();

		for row in frame.row_lo()..frame.row_hi() {
			match predicate.evaluate(partition, row) {
				Ok(true) => {
					self.rows.push(frame.row_id(row));
					for (values, column) in self.columns.iter_mut().zip(self.capture.iter()) {
						let value = partition
							.double(*column, row)
							.or_else(|| partition.long(*column, row).map(|v| v as f64))
							.unwrap_or(f64::NAN);
						values.push(value);
					}
				}
				Ok(false) => {}
				Err(err) => {
					let message = err.to_string();
					self.fail(row, message);
					return;
				}
			}
		}
	}

	fn fail(&mut self, row: usize, message: String) {
		let (frame_index, partition_index) =
			self.frame.as_ref().map_or((self.frame_index, 0), |f| (f.frame_index(), f.partition_index()));
		warn!(sequence_id = self.sequence_id, frame_index, partition_index, row, %message, "filter failed");
		self.error = Some(Error::PredicateEvaluation {
			frame_index,
			partition_index,
			row: row as u64,
			message,
		});
	}

	pub(crate) fn take_error(&mut self) -> Option<Error> {
		self.error.take()
	}

	/// Unbinds the task. Buffers that grew past `retained_capacity` are
	/// replaced with buffers of the initial capacity.
	pub(crate) fn reset(&mut self, retained_capacity: usize) {
		self.frame = None;
		self.predicate = None;
		self.error = None;
		self.progress = None;

		self.rows.clear();
		if self.rows.capacity() > retained_capacity {
			self.rows = Vec::with_capacity(self.initial_capacity);
		}
		for values in &mut self.columns {
			values.clear();
			if values.capacity() > retained_capacity {
				*values = Vec::with_capacity(self.initial_capacity);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use strata_core::{
		BindVariables, PageFrameSource, TableSource,
		predicate::{Expr, Filter, PredicateKind, SymbolSnapshots},
		table::{ColumnBatch, ColumnType, ColumnValues, MemoryTable, TableMetadata},
	};

	use super::*;

	fn table(values: Vec<i64>) -> MemoryTable {
		let table = MemoryTable::new(TableMetadata::new("x").column("n", ColumnType::Long));
		table.append(ColumnBatch::new(vec![ColumnValues::Long(values)])).unwrap();
		table
	}

	fn predicate(table: &MemoryTable, expr: Expr) -> Arc<Predicate> {
		let bound = Filter::new(expr).bind(table.metadata(), &BindVariables::new()).unwrap();
		Arc::new(bound.resolve(&SymbolSnapshots::default(), PredicateKind::Interpreted))
	}

	#[test]
	fn test_reduce_collects_matches_and_captures() {
		let table = table((0..10).collect());
		let source = table.open(100);
		let mut task = ReduceTask::new(4);
		let capture: Arc<[usize]> = Arc::from([0]);

		task.bind(7, source.frame(0).unwrap(), predicate(&table, Expr::col("n").ge(Expr::long(6))), &capture, None);
		task.reduce();

		assert_eq!(task.sequence_id(), 7);
		assert_eq!(task.rows().iter().map(|r| r.row()).collect::<Vec<_>>(), vec![6, 7, 8, 9]);
		assert_eq!(task.columns(), &[vec![6.0, 7.0, 8.0, 9.0]]);
		assert!(task.error().is_none());
	}

	#[test]
	fn test_reduce_records_first_failure() {
		let table = table(vec![1, 2, 0, 4]);
		let source = table.open(100);
		let mut task = ReduceTask::new(4);

		task.bind(
			1,
			source.frame(0).unwrap(),
			predicate(&table, Expr::long(8).div(Expr::col("n")).gt(Expr::long(0))),
			&Arc::from([]),
			None,
		);
		task.reduce();

		assert_eq!(task.rows().len(), 2);
		assert!(matches!(
			task.take_error(),
			Some(Error::PredicateEvaluation {
				row: 2,
				..
			})
		));
	}

	#[test]
	fn test_reset_bounds_capacity() {
		let table = table((0..1_000).collect());
		let source = table.open(1_000);
		let mut task = ReduceTask::new(4);

		task.bind(1, source.frame(0).unwrap(), predicate(&table, Expr::col("n").ge(Expr::long(0))), &Arc::from([0]), None);
		task.reduce();
		assert!(task.row_capacity() >= 1_000);

		task.reset(100);
		assert!(task.row_capacity() <= 100);
		assert!(task.column_capacity() <= 100);
		assert!(task.rows().is_empty());
		assert!(task.frame().is_none());
	}
}
