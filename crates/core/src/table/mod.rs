// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Memory-backed columnar table.
//!
//! Rows are appended in designated-timestamp order and routed to partitions
//! by flooring the timestamp. Appending to the newest partition grows it in
//! place unless a frame source opened earlier still holds it; then the
//! partition is copied first, so that reader keeps the rows it captured.

mod batch;
mod frames;
mod metadata;
mod partition;

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, instrument};

pub use batch::{ColumnBatch, ColumnValues};
pub use frames::TableFrames;
pub use metadata::{ColumnMetadata, ColumnType, PartitionBy, TableMetadata};
pub use partition::{ColumnData, Partition};

use crate::{
	Error, Result,
	page_frame::{PageFrameSource, TableSource},
	symbol::{NULL_SYMBOL, SymbolTable},
};

pub struct MemoryTable {
	metadata: Arc<TableMetadata>,
	symbols: Arc<[Option<Arc<SymbolTable>>]>,
	partitions: RwLock<Vec<Arc<Partition>>>,
}

/// Batch column after symbol interning.
enum Segment {
	Double(Vec<f64>),
	Long(Vec<i64>),
	Timestamp(Vec<i64>),
	Symbol(Vec<i32>),
}

impl MemoryTable {
	pub fn new(metadata: TableMetadata) -> Self {
		let symbols = metadata
			.columns()
			.iter()
			.map(|c| (c.column_type == ColumnType::Symbol).then(|| Arc::new(SymbolTable::new())))
			.collect();

		Self {
			metadata: Arc::new(metadata),
			symbols,
			partitions: RwLock::new(Vec::new()),
		}
	}

	pub fn metadata(&self) -> &TableMetadata {
		&self.metadata
	}

	pub fn symbol_table(&self, column: usize) -> Option<&Arc<SymbolTable>> {
		self.symbols.get(column)?.as_ref()
	}

	pub fn row_count(&self) -> usize {
		self.partitions.read().iter().map(|p| p.row_count()).sum()
	}

	pub fn partition_count(&self) -> usize {
		self.partitions.read().len()
	}

	/// Captures the current partitions and splits them into page frames of at
	/// most `max_rows` rows.
	pub fn frames(&self, max_rows: usize) -> TableFrames {
		let partitions = self.partitions.read().clone();
		TableFrames::new(Arc::clone(&self.metadata), Arc::clone(&self.symbols), partitions, max_rows)
	}

	#[instrument(name = "table::append", level = "debug", skip_all, fields(table = %self.metadata.name()))]
	pub fn append(&self, batch: ColumnBatch) -> Result<()> {
		let row_count = self.validate(&batch)?;
		if row_count == 0 {
			return Ok(());
		}

		let mut partitions = self.partitions.write();
		let timestamps = self.check_timestamps(&batch, partitions.last())?;
		let segments = self.intern(batch);
		let partitioning = self.metadata.partitioning();

		let mut start = 0;
		while start < row_count {
			let key = timestamps.as_ref().map_or(0, |ts| partitioning.floor(ts[start]));
			let mut end = start + 1;
			if let Some(ts) = &timestamps {
				while end < row_count && partitioning.floor(ts[end]) == key {
					end += 1;
				}
			} else {
				end = row_count;
			}

			match partitions.last_mut() {
				Some(last) if last.key() == key => Arc::make_mut(last).append(&segments, start..end),
				_ => {
					let columns = self.metadata.columns().iter().map(|meta| ColumnData::empty(meta.column_type)).collect();
					let mut partition = Partition::new(partitions.len(), key, columns);
					partition.append(&segments, start..end);
					partitions.push(Arc::new(partition));
				}
			}
			start = end;
		}

		debug!(rows = row_count, partitions = partitions.len(), "appended rows");
		Ok(())
	}

	fn validate(&self, batch: &ColumnBatch) -> Result<usize> {
		let columns = batch.columns();
		if columns.len() != self.metadata.column_count() {
			return Err(Error::ColumnOutOfBounds {
				index: columns.len(),
				count: self.metadata.column_count(),
			});
		}

		let row_count = batch.row_count();
		for (index, (values, meta)) in columns.iter().zip(self.metadata.columns()).enumerate() {
			if values.column_type() != meta.column_type {
				return Err(Error::ColumnType {
					name: meta.name.clone(),
					expected: type_name(meta.column_type),
				});
			}
			if values.len() != row_count {
				return Err(Error::RowCountMismatch {
					column: index,
					expected: row_count,
					actual: values.len(),
				});
			}
		}
		Ok(row_count)
	}

	fn check_timestamps(&self, batch: &ColumnBatch, last: Option<&Arc<Partition>>) -> Result<Option<Vec<i64>>> {
		let Some(index) = self.metadata.timestamp_index() else {
			return Ok(None);
		};
		let ColumnValues::Timestamp(timestamps) = &batch.columns()[index] else {
			return Ok(None);
		};

		let mut previous = last.and_then(|p| p.long(index, p.row_count().checked_sub(1)?)).unwrap_or(i64::MIN);
		for &timestamp in timestamps {
			if timestamp < previous {
				return Err(Error::TimestampOrder {
					timestamp,
					last: previous,
				});
			}
			previous = timestamp;
		}
		Ok(Some(timestamps.clone()))
	}

	fn intern(&self, batch: ColumnBatch) -> Vec<Segment> {
		batch.into_columns()
			.into_iter()
			.enumerate()
			.map(|(index, values)| match values {
				ColumnValues::Double(values) => Segment::Double(values),
				ColumnValues::Long(values) => Segment::Long(values),
				ColumnValues::Timestamp(values) => Segment::Timestamp(values),
				ColumnValues::Symbol(values) => {
					let table = self.symbols[index].as_ref();
					Segment::Symbol(
						values.iter()
							.map(|value| match (value, table) {
								(Some(value), Some(table)) => table.put(value),
								_ => NULL_SYMBOL,
							})
							.collect(),
					)
				}
			})
			.collect()
	}
}

impl TableSource for MemoryTable {
	fn metadata(&self) -> &TableMetadata {
		&self.metadata
	}

	fn open(&self, max_rows: usize) -> Arc<dyn PageFrameSource> {
		Arc::new(self.frames(max_rows))
	}
}

fn type_name(column_type: ColumnType) -> &'static str {
	match column_type {
		ColumnType::Double => "double",
		ColumnType::Long => "long",
		ColumnType::Timestamp => "timestamp",
		ColumnType::Symbol => "symbol",
	}
}
