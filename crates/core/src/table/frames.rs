// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use crate::{
	page_frame::{PageFrame, PageFrameSource},
	symbol::SymbolTable,
	table::{Partition, TableMetadata},
};

#[derive(Debug, Clone, Copy)]
struct FrameBounds {
	partition: usize,
	row_lo: usize,
	row_hi: usize,
}

/// Page frames over the partitions a table had when the frames were opened.
pub struct TableFrames {
	metadata: Arc<TableMetadata>,
	symbols: Arc<[Option<Arc<SymbolTable>>]>,
	partitions: Vec<Arc<Partition>>,
	bounds: Vec<FrameBounds>,
}

impl TableFrames {
	pub(crate) fn new(
		metadata: Arc<TableMetadata>,
		symbols: Arc<[Option<Arc<SymbolTable>>]>,
		partitions: Vec<Arc<Partition>>,
		max_rows: usize,
	) -> Self {
		let max_rows = max_rows.max(1);
		let mut bounds = Vec::new();
		for (partition, p) in partitions.iter().enumerate() {
			let mut row_lo = 0;
			while row_lo < p.row_count() {
				let row_hi = row_lo.saturating_add(max_rows).min(p.row_count());
				bounds.push(FrameBounds {
					partition,
					row_lo,
					row_hi,
				});
				row_lo = row_hi;
			}
		}

		Self {
			metadata,
			symbols,
			partitions,
			bounds,
		}
	}
}

impl PageFrameSource for TableFrames {
	fn metadata(&self) -> &TableMetadata {
		&self.metadata
	}

	fn frame_count(&self) -> usize {
		self.bounds.len()
	}

	fn frame(&self, frame_index: usize) -> Option<PageFrame> {
		let bounds = self.bounds.get(frame_index)?;
		Some(PageFrame::new(
			frame_index,
			Arc::clone(&self.partitions[bounds.partition]),
			bounds.row_lo,
			bounds.row_hi,
		))
	}

	fn partition_count(&self) -> usize {
		self.partitions.len()
	}

	fn partition(&self, partition_index: usize) -> Option<&Arc<Partition>> {
		self.partitions.get(partition_index)
	}

	fn symbol_table(&self, column: usize) -> Option<&Arc<SymbolTable>> {
		self.symbols.get(column)?.as_ref()
	}
}

#[cfg(test)]
mod tests {
	use crate::{
		page_frame::PageFrameSource,
		table::{ColumnBatch, ColumnType, ColumnValues, MemoryTable, PartitionBy, TableMetadata},
	};

	const HOUR: i64 = 3_600_000_000;

	#[test]
	fn test_frames_split_partitions() {
		let table = MemoryTable::new(
			TableMetadata::new("x")
				.column("a", ColumnType::Long)
				.timestamp("t")
				.partition_by(PartitionBy::Hour),
		);
		let timestamps: Vec<i64> = (0..5).map(|i| i * 10).chain((0..3).map(|i| HOUR + i)).collect();
		table.append(ColumnBatch::new(vec![
			ColumnValues::Long((0..8).collect()),
			ColumnValues::Timestamp(timestamps),
		]))
		.unwrap();

		let frames = table.frames(2);
		// 5 rows -> 2 + 2 + 1, 3 rows -> 2 + 1
		assert_eq!(frames.frame_count(), 5);
		let ranges: Vec<_> = (0..5)
			.map(|i| {
				let f = frames.frame(i).unwrap();
				(f.partition_index(), f.row_lo(), f.row_hi())
			})
			.collect();
		assert_eq!(ranges, vec![(0, 0, 2), (0, 2, 4), (0, 4, 5), (1, 0, 2), (1, 2, 3)]);
		assert!(frames.frame(5).is_none());
	}

	#[test]
	fn test_empty_table_has_no_frames() {
		let table = MemoryTable::new(TableMetadata::new("e").column("a", ColumnType::Double));
		assert_eq!(table.frames(100).frame_count(), 0);
	}
}
