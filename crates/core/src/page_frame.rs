// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Page frames and the interfaces that produce them.

use std::{fmt, sync::Arc};

use crate::{
	RowId,
	symbol::{NULL_SYMBOL, SymbolTable},
	table::{ColumnData, Partition, TableMetadata},
};

/// Contiguous row range `[row_lo, row_hi)` within one partition.
///
/// Holds the partition's column data by reference count; nothing is copied.
#[derive(Debug, Clone)]
pub struct PageFrame {
	frame_index: usize,
	partition: Arc<Partition>,
	row_lo: usize,
	row_hi: usize,
}

impl PageFrame {
	pub fn new(frame_index: usize, partition: Arc<Partition>, row_lo: usize, row_hi: usize) -> Self {
		debug_assert!(row_lo <= row_hi && row_hi <= partition.row_count());
		Self {
			frame_index,
			partition,
			row_lo,
			row_hi,
		}
	}

	pub fn frame_index(&self) -> usize {
		self.frame_index
	}

	pub fn partition(&self) -> &Arc<Partition> {
		&self.partition
	}

	pub fn partition_index(&self) -> usize {
		self.partition.index()
	}

	pub fn partition_key(&self) -> i64 {
		self.partition.key()
	}

	pub fn row_lo(&self) -> usize {
		self.row_lo
	}

	pub fn row_hi(&self) -> usize {
		self.row_hi
	}

	pub fn row_count(&self) -> usize {
		self.row_hi - self.row_lo
	}

	pub fn column(&self, index: usize) -> Option<&ColumnData> {
		self.partition.column(index)
	}

	pub fn row_id(&self, row: usize) -> RowId {
		RowId::new(self.partition.index(), row)
	}
}

/// Finite, ordered sequence of page frames over one snapshot of a table.
pub trait PageFrameSource: Send + Sync {
	fn metadata(&self) -> &TableMetadata;

	fn frame_count(&self) -> usize;

	fn frame(&self, frame_index: usize) -> Option<PageFrame>;

	fn partition_count(&self) -> usize;

	fn partition(&self, partition_index: usize) -> Option<&Arc<Partition>>;

	/// Live dictionary of a symbol column.
	fn symbol_table(&self, column: usize) -> Option<&Arc<SymbolTable>>;
}

impl dyn PageFrameSource + '_ {
	pub fn record(&self, row_id: RowId) -> Option<Record<'_>> {
		let partition = self.partition(row_id.partition_index())?;
		if row_id.row() >= partition.row_count() {
			return None;
		}
		Some(Record {
			source: self,
			partition,
			row: row_id.row(),
		})
	}
}

/// Opens page frame sources over the current state of a table.
pub trait TableSource: Send + Sync {
	fn metadata(&self) -> &TableMetadata;

	fn open(&self, max_rows: usize) -> Arc<dyn PageFrameSource>;
}

/// Typed read access to one row.
#[derive(Clone, Copy)]
pub struct Record<'a> {
	source: &'a dyn PageFrameSource,
	partition: &'a Arc<Partition>,
	row: usize,
}

impl<'a> Record<'a> {
	pub fn row_id(&self) -> RowId {
		RowId::new(self.partition.index(), self.row)
	}

	pub fn double(&self, column: usize) -> Option<f64> {
		self.partition.double(column, self.row)
	}

	pub fn long(&self, column: usize) -> Option<i64> {
		match self.partition.column(column)? {
			ColumnData::Long(values) => values.get(self.row).copied(),
			_ => None,
		}
	}

	pub fn timestamp(&self, column: usize) -> Option<i64> {
		match self.partition.column(column)? {
			ColumnData::Timestamp(values) => values.get(self.row).copied(),
			_ => None,
		}
	}

	/// Text of a symbol value; `None` for null or non-symbol columns.
	pub fn symbol(&self, column: usize) -> Option<Arc<str>> {
		let code = self.partition.symbol_code(column, self.row)?;
		if code == NULL_SYMBOL {
			return None;
		}
		self.source.symbol_table(column)?.value_of(code)
	}

	pub fn value(&self, column: usize) -> Value {
		match self.partition.column(column) {
			Some(ColumnData::Double(values)) => values.get(self.row).map_or(Value::Null, |v| Value::Double(*v)),
			Some(ColumnData::Long(values)) => values.get(self.row).map_or(Value::Null, |v| Value::Long(*v)),
			Some(ColumnData::Timestamp(values)) => {
				values.get(self.row).map_or(Value::Null, |v| Value::Timestamp(*v))
			}
			Some(ColumnData::Symbol(_)) => self.symbol(column).map_or(Value::Null, Value::Symbol),
			None => Value::Null,
		}
	}

	pub fn values(&self) -> Vec<Value> {
		(0..self.source.metadata().column_count()).map(|c| self.value(c)).collect()
	}
}

impl fmt::Debug for Record<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Record").field("row_id", &self.row_id()).field("values", &self.values()).finish()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Null,
	Double(f64),
	Long(i64),
	Timestamp(i64),
	Symbol(Arc<str>),
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => f.write_str("null"),
			Value::Double(v) => write!(f, "{v}"),
			Value::Long(v) | Value::Timestamp(v) => write!(f, "{v}"),
			Value::Symbol(v) => f.write_str(v),
		}
	}
}
