// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{ops::Range, sync::Arc};

use crate::table::{Segment, metadata::ColumnType};

/// Column values of one partition. Copied before growth while shared.
#[derive(Debug, Clone)]
pub enum ColumnData {
	Double(Arc<Vec<f64>>),
	Long(Arc<Vec<i64>>),
	Timestamp(Arc<Vec<i64>>),
	Symbol(Arc<Vec<i32>>),
}

impl ColumnData {
	pub(crate) fn empty(column_type: ColumnType) -> Self {
		match column_type {
			ColumnType::Double => ColumnData::Double(Arc::default()),
			ColumnType::Long => ColumnData::Long(Arc::default()),
			ColumnType::Timestamp => ColumnData::Timestamp(Arc::default()),
			ColumnType::Symbol => ColumnData::Symbol(Arc::default()),
		}
	}

	pub fn column_type(&self) -> ColumnType {
		match self {
			ColumnData::Double(_) => ColumnType::Double,
			ColumnData::Long(_) => ColumnType::Long,
			ColumnData::Timestamp(_) => ColumnType::Timestamp,
			ColumnData::Symbol(_) => ColumnType::Symbol,
		}
	}

	pub fn len(&self) -> usize {
		match self {
			ColumnData::Double(values) => values.len(),
			ColumnData::Long(values) | ColumnData::Timestamp(values) => values.len(),
			ColumnData::Symbol(values) => values.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Contiguous rows sharing one partition key.
#[derive(Debug, Clone)]
pub struct Partition {
	index: usize,
	key: i64,
	row_count: usize,
	columns: Vec<ColumnData>,
}

impl Partition {
	pub(crate) fn new(index: usize, key: i64, columns: Vec<ColumnData>) -> Self {
		let row_count = columns.first().map_or(0, ColumnData::len);
		debug_assert!(columns.iter().all(|c| c.len() == row_count));
		Self {
			index,
			key,
			row_count,
			columns,
		}
	}

	/// Appends `range` of every segment. Column vectors still referenced by
	/// an open reader are copied first; unshared ones grow in place.
	pub(super) fn append(&mut self, segments: &[Segment], range: Range<usize>) {
		for (column, segment) in self.columns.iter_mut().zip(segments) {
			match (column, segment) {
				(ColumnData::Double(head), Segment::Double(tail)) => {
					Arc::make_mut(head).extend_from_slice(&tail[range.clone()])
				}
				(ColumnData::Long(head), Segment::Long(tail)) => {
					Arc::make_mut(head).extend_from_slice(&tail[range.clone()])
				}
				(ColumnData::Timestamp(head), Segment::Timestamp(tail)) => {
					Arc::make_mut(head).extend_from_slice(&tail[range.clone()])
				}
				(ColumnData::Symbol(head), Segment::Symbol(tail)) => {
					Arc::make_mut(head).extend_from_slice(&tail[range.clone()])
				}
				// validate() rejects batches whose types differ from the table
				_ => {}
			}
		}
		self.row_count += range.len();
	}

	pub fn index(&self) -> usize {
		self.index
	}

	pub fn key(&self) -> i64 {
		self.key
	}

	pub fn row_count(&self) -> usize {
		self.row_count
	}

	pub fn columns(&self) -> &[ColumnData] {
		&self.columns
	}

	pub fn column(&self, index: usize) -> Option<&ColumnData> {
		self.columns.get(index)
	}

	pub fn double(&self, column: usize, row: usize) -> Option<f64> {
		match self.columns.get(column)? {
			ColumnData::Double(values) => values.get(row).copied(),
			_ => None,
		}
	}

	/// Reads a `Long` or `Timestamp` column.
	pub fn long(&self, column: usize, row: usize) -> Option<i64> {
		match self.columns.get(column)? {
			ColumnData::Long(values) | ColumnData::Timestamp(values) => values.get(row).copied(),
			_ => None,
		}
	}

	pub fn symbol_code(&self, column: usize, row: usize) -> Option<i32> {
		match self.columns.get(column)? {
			ColumnData::Symbol(values) => values.get(row).copied(),
			_ => None,
		}
	}
}
