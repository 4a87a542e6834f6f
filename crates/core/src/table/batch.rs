// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::table::metadata::ColumnType;

/// Values of one column in an append batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
	Double(Vec<f64>),
	Long(Vec<i64>),
	Timestamp(Vec<i64>),
	Symbol(Vec<Option<String>>),
}

impl ColumnValues {
	pub fn column_type(&self) -> ColumnType {
		match self {
			ColumnValues::Double(_) => ColumnType::Double,
			ColumnValues::Long(_) => ColumnType::Long,
			ColumnValues::Timestamp(_) => ColumnType::Timestamp,
			ColumnValues::Symbol(_) => ColumnType::Symbol,
		}
	}

	pub fn len(&self) -> usize {
		match self {
			ColumnValues::Double(values) => values.len(),
			ColumnValues::Long(values) | ColumnValues::Timestamp(values) => values.len(),
			ColumnValues::Symbol(values) => values.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Rows to append, column by column, in table column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnBatch {
	columns: Vec<ColumnValues>,
}

impl ColumnBatch {
	pub fn new(columns: Vec<ColumnValues>) -> Self {
		Self {
			columns,
		}
	}

	pub fn with(mut self, values: ColumnValues) -> Self {
		self.columns.push(values);
		self
	}

	pub fn columns(&self) -> &[ColumnValues] {
		&self.columns
	}

	pub(crate) fn into_columns(self) -> Vec<ColumnValues> {
		self.columns
	}

	pub fn row_count(&self) -> usize {
		self.columns.first().map_or(0, ColumnValues::len)
	}
}
