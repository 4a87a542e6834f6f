// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
	Double,
	Long,
	Timestamp,
	Symbol,
}

impl ColumnType {
	pub fn is_numeric(self) -> bool {
		!matches!(self, ColumnType::Symbol)
	}
}

impl fmt::Display for ColumnType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ColumnType::Double => f.write_str("DOUBLE"),
			ColumnType::Long => f.write_str("LONG"),
			ColumnType::Timestamp => f.write_str("TIMESTAMP"),
			ColumnType::Symbol => f.write_str("SYMBOL"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
	pub name: String,
	pub column_type: ColumnType,
}

const HOUR_MICROS: i64 = 3_600_000_000;
const DAY_MICROS: i64 = 24 * HOUR_MICROS;

/// Partitioning of a table by its designated timestamp (microseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionBy {
	#[default]
	None,
	Hour,
	Day,
}

impl PartitionBy {
	/// Partition key of a timestamp: the start of the enclosing period.
	pub fn floor(self, timestamp: i64) -> i64 {
		match self {
			PartitionBy::None => 0,
			PartitionBy::Hour => timestamp - timestamp.rem_euclid(HOUR_MICROS),
			PartitionBy::Day => timestamp - timestamp.rem_euclid(DAY_MICROS),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
	name: String,
	columns: Vec<ColumnMetadata>,
	timestamp_index: Option<usize>,
	partition_by: PartitionBy,
}

impl TableMetadata {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			columns: Vec::new(),
			timestamp_index: None,
			partition_by: PartitionBy::None,
		}
	}

	pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
		self.columns.push(ColumnMetadata {
			name: name.into(),
			column_type,
		});
		self
	}

	/// Adds the designated timestamp column.
	pub fn timestamp(mut self, name: impl Into<String>) -> Self {
		self.timestamp_index = Some(self.columns.len());
		self.column(name, ColumnType::Timestamp)
	}

	pub fn partition_by(mut self, partition_by: PartitionBy) -> Self {
		self.partition_by = partition_by;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn columns(&self) -> &[ColumnMetadata] {
		&self.columns
	}

	pub fn column_count(&self) -> usize {
		self.columns.len()
	}

	pub fn column_index(&self, name: &str) -> Option<usize> {
		self.columns.iter().position(|c| c.name == name)
	}

	pub fn column_metadata(&self, index: usize) -> Result<&ColumnMetadata> {
		self.columns.get(index).ok_or(Error::ColumnOutOfBounds {
			index,
			count: self.columns.len(),
		})
	}

	pub fn column_type(&self, index: usize) -> Result<ColumnType> {
		Ok(self.column_metadata(index)?.column_type)
	}

	pub fn timestamp_index(&self) -> Option<usize> {
		self.timestamp_index
	}

	pub fn partitioning(&self) -> PartitionBy {
		if self.timestamp_index.is_some() {
			self.partition_by
		} else {
			PartitionBy::None
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_partition_floor() {
		assert_eq!(PartitionBy::Hour.floor(20_000_000), 0);
		assert_eq!(PartitionBy::Hour.floor(HOUR_MICROS + 5), HOUR_MICROS);
		assert_eq!(PartitionBy::Day.floor(DAY_MICROS * 3 + HOUR_MICROS), DAY_MICROS * 3);
		assert_eq!(PartitionBy::Hour.floor(-1), -HOUR_MICROS);
		assert_eq!(PartitionBy::None.floor(123_456), 0);
	}

	#[test]
	fn test_builder() {
		let metadata = TableMetadata::new("x")
			.column("a", ColumnType::Double)
			.timestamp("t")
			.partition_by(PartitionBy::Hour);

		assert_eq!(metadata.column_count(), 2);
		assert_eq!(metadata.column_index("t"), Some(1));
		assert_eq!(metadata.timestamp_index(), Some(1));
		assert_eq!(metadata.column_type(0).unwrap(), ColumnType::Double);
		assert!(metadata.column_type(2).is_err());
		assert_eq!(metadata.partitioning(), PartitionBy::Hour);
	}

	#[test]
	fn test_partitioning_requires_timestamp() {
		let metadata = TableMetadata::new("y").column("a", ColumnType::Long).partition_by(PartitionBy::Day);
		assert_eq!(metadata.partitioning(), PartitionBy::None);
	}
}
