// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Brute-force scans used as expected results.

use strata_core::{PageFrameSource, Record, RowId, table::MemoryTable};

/// Row ids of every row accepted by `predicate`, in scan order.
pub fn matching_rows(table: &MemoryTable, predicate: impl Fn(&Record<'_>) -> bool) -> Vec<RowId> {
	let frames = table.frames(usize::MAX);
	let source: &dyn PageFrameSource = &frames;

	let mut rows = Vec::new();
	for partition_index in 0..source.partition_count() {
		let Some(partition) = source.partition(partition_index) else {
			continue;
		};
		for row in 0..partition.row_count() {
			let row_id = RowId::new(partition_index, row);
			if source.record(row_id).is_some_and(|record| predicate(&record)) {
				rows.push(row_id);
			}
		}
	}
	rows
}

/// Sum of a double column over the rows accepted by `predicate`.
pub fn sum_where(table: &MemoryTable, column: usize, predicate: impl Fn(&Record<'_>) -> bool) -> (f64, u64) {
	let frames = table.frames(usize::MAX);
	let source: &dyn PageFrameSource = &frames;

	let mut sum = 0.0;
	let mut count = 0;
	for row_id in matching_rows(table, predicate) {
		if let Some(value) = source.record(row_id).and_then(|record| record.double(column)) {
			sum += value;
			count += 1;
		}
	}
	(sum, count)
}
