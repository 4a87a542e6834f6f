// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Table fixtures.
//!
//! Timestamps start at zero and advance by [`TIMESTAMP_STEP`] per row, and
//! tables are partitioned by hour, so one partition holds 36 000 rows.

use std::sync::Arc;

use strata_core::table::{ColumnBatch, ColumnType, ColumnValues, MemoryTable, PartitionBy, TableMetadata};

use crate::Rnd;

/// Microseconds between consecutive rows.
pub const TIMESTAMP_STEP: i64 = 100_000;

/// Rows appended per batch while filling a fixture.
const BATCH_ROWS: usize = 100_000;

/// `x(a DOUBLE, t TIMESTAMP)` partitioned by hour.
pub fn double_table(rows: usize, rnd: &mut Rnd) -> Arc<MemoryTable> {
	let table = Arc::new(MemoryTable::new(
		TableMetadata::new("x").column("a", ColumnType::Double).timestamp("t").partition_by(PartitionBy::Hour),
	));
	append_doubles(&table, 0, rows, rnd);
	table
}

/// Appends `rows` rows to a [`double_table`], continuing after `first_row`.
pub fn append_doubles(table: &MemoryTable, first_row: usize, rows: usize, rnd: &mut Rnd) {
	let mut start = first_row;
	let end = first_row + rows;
	while start < end {
		let count = BATCH_ROWS.min(end - start);
		let a = (0..count).map(|_| rnd.next_f64()).collect();
		let t = timestamps(start, count);
		table.append(ColumnBatch::new(vec![ColumnValues::Double(a), ColumnValues::Timestamp(t)]))
			.unwrap_or_else(|err| panic!("append failed: {err}"));
		start += count;
	}
}

/// `y(s SYMBOL, a DOUBLE, l LONG, t TIMESTAMP)` partitioned by hour; `s`
/// is drawn from `symbols`, `l` counts rows from zero.
pub fn symbol_table(rows: usize, symbols: &[&str], rnd: &mut Rnd) -> Arc<MemoryTable> {
	let table = Arc::new(MemoryTable::new(
		TableMetadata::new("y")
			.column("s", ColumnType::Symbol)
			.column("a", ColumnType::Double)
			.column("l", ColumnType::Long)
			.timestamp("t")
			.partition_by(PartitionBy::Hour),
	));
	append_symbols(&table, 0, rows, symbols, rnd);
	table
}

/// Appends `rows` rows to a [`symbol_table`], continuing after `first_row`.
pub fn append_symbols(table: &MemoryTable, first_row: usize, rows: usize, symbols: &[&str], rnd: &mut Rnd) {
	let mut start = first_row;
	let end = first_row + rows;
	while start < end {
		let count = BATCH_ROWS.min(end - start);
		let s = (0..count).map(|_| Some(rnd.pick(symbols).to_string())).collect();
		let a = (0..count).map(|_| rnd.next_f64()).collect();
		let l = (start..start + count).map(|row| row as i64).collect();
		table.append(ColumnBatch::new(vec![
			ColumnValues::Symbol(s),
			ColumnValues::Double(a),
			ColumnValues::Long(l),
			ColumnValues::Timestamp(timestamps(start, count)),
		]))
		.unwrap_or_else(|err| panic!("append failed: {err}"));
		start += count;
	}
}

fn timestamps(first_row: usize, count: usize) -> Vec<i64> {
	(first_row..first_row + count).map(|row| row as i64 * TIMESTAMP_STEP).collect()
}
