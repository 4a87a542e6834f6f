// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use strata_core::{
	CircuitBreaker, Error, ExecutionConfig, JitMode, Result, RowId, TableSource,
	predicate::{Expr, Filter},
	table::MemoryTable,
};
use strata_engine::{CursorState, FactoryKind, FilteredCursor, FilteredFactory, Limit};
use strata_testing::{Harness, Rnd, fixture, reference};

const ROWS: usize = 100_000;

fn a_above(threshold: f64) -> Filter {
	Filter::new(Expr::col("a").gt(Expr::double(threshold)))
}

fn expected_above(table: &MemoryTable, threshold: f64) -> Vec<RowId> {
	reference::matching_rows(table, |r| r.double(0).is_some_and(|a| a > threshold))
}

fn run(harness: &Harness, factory: &mut FilteredFactory) -> Vec<RowId> {
	let ctx = harness.context();
	let cursor = factory.cursor(&ctx).unwrap();
	cursor.collect::<Result<Vec<_>>>().unwrap()
}

#[test]
fn test_no_limit_returns_all_matches_in_scan_order() {
	let table = fixture::double_table(ROWS, &mut Rnd::default());
	let harness = Harness::with_queue(4, 1_000, 2);
	let mut factory = harness.plan(table.clone(), a_above(0.5), Limit::None);

	let ctx = harness.context();
	let mut cursor = factory.cursor(&ctx).unwrap();
	assert_eq!(cursor.state(), CursorState::Init);
	assert_eq!(cursor.size().unwrap(), None);

	let mut rows = Vec::new();
	while let Some(row) = cursor.next_row().unwrap() {
		let record = cursor.record(row).unwrap();
		assert!(record.double(0).unwrap() > 0.5);
		rows.push(row);
	}
	assert_eq!(cursor.state(), CursorState::Exhausted);
	drop(cursor);

	assert_eq!(rows, expected_above(&table, 0.5));
	assert_eq!(harness.bus().queue(0).unwrap().in_flight(), 0);
}

#[test]
fn test_positive_limit() {
	let table = fixture::double_table(ROWS, &mut Rnd::default());
	let harness = Harness::with_queue(4, 1_000, 2);
	let expected = expected_above(&table, 0.5);

	let mut factory = harness.plan(table.clone(), a_above(0.5), Limit::Positive(10));
	let ctx = harness.context();
	let mut cursor = factory.cursor(&ctx).unwrap();
	let mut rows = Vec::new();
	while let Some(row) = cursor.next_row().unwrap() {
		rows.push(row);
	}
	assert_eq!(cursor.state(), CursorState::LimitReached);
	drop(cursor);
	assert_eq!(rows, expected[..10]);
	assert_eq!(harness.bus().queue(0).unwrap().in_flight(), 0);

	let mut factory = harness.plan(table.clone(), a_above(0.5), Limit::Positive(ROWS as u64 * 2));
	assert_eq!(run(&harness, &mut factory), expected);

	let mut factory = harness.plan(table, a_above(0.5), Limit::Positive(0));
	assert!(run(&harness, &mut factory).is_empty());
}

#[test]
fn test_negative_limit_takes_last_rows() {
	let table = fixture::double_table(ROWS, &mut Rnd::default());
	let harness = Harness::with_queue(4, 1_000, 2);
	let expected = expected_above(&table, 0.5);

	let mut factory = harness.plan(table.clone(), a_above(0.5), Limit::Negative(5));
	let ctx = harness.context();
	let mut cursor = factory.cursor(&ctx).unwrap();
	assert_eq!(cursor.size().unwrap(), Some(5));
	assert_eq!(cursor.match_count().unwrap(), Some(expected.len() as u64));

	let rows = cursor.by_ref().collect::<Result<Vec<_>>>().unwrap();
	assert_eq!(rows, expected[expected.len() - 5..]);
	assert_eq!(cursor.state(), CursorState::Exhausted);
	drop(cursor);

	let mut factory = harness.plan(table.clone(), a_above(0.99), Limit::Negative(ROWS as u64));
	let ctx = harness.context();
	let mut cursor = factory.cursor(&ctx).unwrap();
	let matched = expected_above(&table, 0.99);
	assert_eq!(cursor.size().unwrap(), Some(matched.len() as u64));
	assert_eq!(cursor.collect::<Result<Vec<_>>>().unwrap(), matched);
}

#[test]
fn test_dynamic_limit_read_on_every_open() {
	let table = fixture::double_table(ROWS, &mut Rnd::default());
	let harness = Harness::with_queue(3, 1_000, 2);
	let expected = expected_above(&table, 0.5);
	let mut factory = harness.plan(table, a_above(0.5), Limit::Bind(0));

	harness.binds().set_long(0, 3);
	assert_eq!(run(&harness, &mut factory), expected[..3]);

	harness.binds().set_long(0, -3);
	assert_eq!(run(&harness, &mut factory), expected[expected.len() - 3..]);

	harness.binds().clear();
	let ctx = harness.context();
	assert!(matches!(
		factory.cursor(&ctx),
		Err(Error::UndefinedBindVariable {
			index: 0
		})
	));
}

/// Pulls rows from two cursors in lockstep until both are exhausted.
fn interleave(left: &mut FilteredCursor<'_>, right: &mut FilteredCursor<'_>) -> (Vec<RowId>, Vec<RowId>) {
	let mut left_rows = Vec::new();
	let mut right_rows = Vec::new();
	loop {
		let l = left.next_row().unwrap();
		let r = right.next_row().unwrap();
		if let Some(row) = l {
			left_rows.push(row);
		}
		if let Some(row) = r {
			right_rows.push(row);
		}
		if l.is_none() && r.is_none() {
			break;
		}
	}
	(left_rows, right_rows)
}

#[test]
fn test_factories_sharing_full_queue_agree() {
	let table = fixture::double_table(ROWS, &mut Rnd::default());
	let harness = Harness::with_queue(1, 500, 1);
	let expected = expected_above(&table, 0.3);

	let mut first = harness.plan(table.clone(), a_above(0.3), Limit::None);
	let mut second = harness.plan(table, a_above(0.3), Limit::None);
	let ctx = harness.context();
	let mut left = first.cursor(&ctx).unwrap();
	let mut right = second.cursor(&ctx).unwrap();

	let (left_rows, right_rows) = interleave(&mut left, &mut right);
	assert_eq!(left_rows, expected);
	assert_eq!(right_rows, expected);
}

#[test]
fn test_full_queue_positive_limit() {
	let capacity = 4;
	let frame_rows = 100;
	let table = fixture::double_table(10 * capacity * frame_rows, &mut Rnd::default());
	let harness = Harness::with_queue(capacity, frame_rows, 1);
	let expected = expected_above(&table, 0.42);

	let mut first = harness.plan(table.clone(), a_above(0.42), Limit::Positive(3));
	let mut second = harness.plan(table, a_above(0.42), Limit::Positive(3));
	let ctx = harness.context();
	let mut left = first.cursor(&ctx).unwrap();
	let mut right = second.cursor(&ctx).unwrap();

	let (left_rows, right_rows) = interleave(&mut left, &mut right);
	assert_eq!(left.state(), CursorState::LimitReached);
	assert_eq!(right.state(), CursorState::LimitReached);
	drop(left);
	drop(right);

	assert_eq!(left_rows, expected[..3]);
	assert_eq!(right_rows, expected[..3]);

	let queue = harness.bus().queue(0).unwrap();
	assert_eq!(queue.in_flight(), 0);
	assert!(queue.largest_task_capacity() <= harness.bus().config().page_frame_max_rows);
}

#[test]
fn test_full_queue_negative_limit() {
	let capacity = 4;
	let frame_rows = 100;
	let table = fixture::double_table(10 * capacity * frame_rows, &mut Rnd::default());
	let harness = Harness::with_queue(capacity, frame_rows, 1);
	let expected = expected_above(&table, 0.42);

	let mut first = harness.plan(table.clone(), a_above(0.42), Limit::Negative(3));
	let mut second = harness.plan(table, a_above(0.42), Limit::Negative(3));
	let ctx = harness.context();
	let mut left = first.cursor(&ctx).unwrap();
	let mut right = second.cursor(&ctx).unwrap();

	let (left_rows, right_rows) = interleave(&mut left, &mut right);
	drop(left);
	drop(right);

	assert_eq!(left_rows, expected[expected.len() - 3..]);
	assert_eq!(right_rows, expected[expected.len() - 3..]);

	let queue = harness.bus().queue(0).unwrap();
	assert_eq!(queue.in_flight(), 0);
	assert!(queue.largest_task_capacity() <= harness.bus().config().page_frame_max_rows);
}

#[test]
fn test_compiled_and_interpreted_agree() {
	let table = fixture::double_table(ROWS, &mut Rnd::default());
	let harness = Harness::with_queue(4, 2_000, 2);
	let filter = Filter::new(
		Expr::col("a").mul(Expr::double(2.0)).sub(Expr::double(0.25)).lt(Expr::double(0.5)).and(Expr::col("t").ge(Expr::long(1_000_000))),
	);

	let jit = harness.context().with_jit_mode(JitMode::Enabled);
	let mut compiled = harness.plan_with(table.clone(), filter.clone(), Limit::None, &jit);
	assert_eq!(compiled.kind(), FactoryKind::AsyncCompiled);

	let interpreted_ctx = harness.context().with_jit_mode(JitMode::Disabled);
	let mut interpreted = harness.plan_with(table.clone(), filter, Limit::None, &interpreted_ctx);
	assert_eq!(interpreted.kind(), FactoryKind::Async);

	let expected = reference::matching_rows(&table, |r| {
		r.double(0).is_some_and(|a| a * 2.0 - 0.25 < 0.5) && r.timestamp(1).is_some_and(|t| t >= 1_000_000)
	});
	assert_eq!(run(&harness, &mut compiled), expected);
	assert_eq!(run(&harness, &mut interpreted), expected);
}

#[test]
fn test_sync_factory_when_parallel_filter_disabled() {
	let table = fixture::double_table(ROWS, &mut Rnd::default());
	let harness = Harness::new(
		ExecutionConfig::default()
			.with_parallel_filter(false)
			.with_page_frame_max_rows(1_000)
			.with_shard_count(1)
			.with_worker_count(1),
	);

	let mut factory = harness.plan(table.clone(), a_above(0.5), Limit::None);
	assert_eq!(factory.kind(), FactoryKind::Sync);
	assert_eq!(run(&harness, &mut factory), expected_above(&table, 0.5));
	assert_eq!(harness.bus().queue(0).unwrap().in_flight(), 0);
}

#[test]
fn test_tripped_breaker_exhausts_cursor() {
	let table = fixture::double_table(ROWS, &mut Rnd::default());
	let harness = Harness::with_queue(2, 1_000, 1);
	let total = expected_above(&table, 0.5).len();

	let breaker = CircuitBreaker::new();
	let ctx = harness.context().with_breaker(breaker.clone());
	let mut factory = harness.plan_with(table.clone(), a_above(0.5), Limit::None, &ctx);

	let mut cursor = factory.cursor(&ctx).unwrap();
	assert!(cursor.next_row().unwrap().is_some());
	breaker.trip();

	let mut yielded = 1;
	while cursor.next_row().unwrap().is_some() {
		yielded += 1;
	}
	assert_eq!(cursor.state(), CursorState::Exhausted);
	assert!(yielded < total);
	drop(cursor);
	assert_eq!(harness.bus().queue(0).unwrap().in_flight(), 0);

	breaker.reset();
	assert_eq!(run(&harness, &mut factory).len(), total);
}

#[test]
fn test_predicate_failure_surfaces_and_queue_recovers() {
	let table = fixture::symbol_table(ROWS, &["A", "B"], &mut Rnd::default());
	let harness = Harness::with_queue(3, 1_000, 2);
	// division by zero on the row where l = 50000
	let failing = Filter::new(Expr::col("l").div(Expr::col("l").sub(Expr::long(50_000))).ge(Expr::long(0)));
	let mut factory = harness.plan(table.clone(), failing, Limit::None);

	for _ in 0..2 {
		let ctx = harness.context();
		let mut cursor = factory.cursor(&ctx).unwrap();
		let err = loop {
			match cursor.next_row() {
				Ok(Some(_)) => {}
				Ok(None) => panic!("scan finished without error"),
				Err(err) => break err,
			}
		};
		assert!(matches!(
			err,
			Error::PredicateEvaluation {
				partition_index: 1,
				row: 14_000,
				..
			}
		));
		assert_eq!(cursor.state(), CursorState::Exhausted);
		assert!(cursor.next_row().unwrap().is_none());
		drop(cursor);
		assert_eq!(harness.bus().queue(0).unwrap().in_flight(), 0);
	}

	let mut healthy = harness.plan(table.clone(), Filter::new(Expr::col("l").lt(Expr::long(10))), Limit::None);
	assert_eq!(run(&harness, &mut healthy).len(), 10);
}

#[test]
fn test_rows_appended_after_open_are_not_visible() {
	let mut rnd = Rnd::default();
	let table = fixture::double_table(10_000, &mut rnd);
	let harness = Harness::with_queue(2, 1_000, 1);
	let expected = expected_above(&table, 0.5);
	let mut factory = harness.plan(table.clone(), a_above(0.5), Limit::None);

	let ctx = harness.context();
	let mut cursor = factory.cursor(&ctx).unwrap();
	let first = cursor.next_row().unwrap();
	fixture::append_doubles(&table, 10_000, 5_000, &mut rnd);
	let mut rows: Vec<_> = first.into_iter().collect();
	rows.extend(cursor.by_ref().map(|row| row.unwrap()));
	drop(cursor);
	assert_eq!(rows, expected);

	assert_eq!(run(&harness, &mut factory), expected_above(&table, 0.5));
}

#[test]
fn test_narrow_band_over_two_million_rows() {
	let table = fixture::double_table(2_000_000, &mut Rnd::default());
	let harness = Harness::with_queue(4, 100, 1);
	let filter = Filter::new(Expr::col("a").gt(Expr::double(0.345747032)).and(Expr::col("a").lt(Expr::double(0.34575))));
	let expected = reference::matching_rows(&table, |r| r.double(0).is_some_and(|a| a > 0.345747032 && a < 0.34575));

	let source: Arc<dyn TableSource> = table;
	let mut first = harness.plan(source.clone(), filter.clone(), Limit::None);
	let mut second = harness.plan(source, filter, Limit::None);
	let ctx = harness.context();
	let mut left = first.cursor(&ctx).unwrap();
	let mut right = second.cursor(&ctx).unwrap();

	let mut left_rows = Vec::new();
	let mut right_rows = Vec::new();
	let (mut left_done, mut right_done) = (false, false);
	while !(left_done && right_done) {
		if !left_done {
			match left.next_row().unwrap() {
				Some(row) => left_rows.push(row),
				None => left_done = true,
			}
		}
		if !right_done {
			match right.next_row().unwrap() {
				Some(row) => right_rows.push(row),
				None => right_done = true,
			}
		}
	}

	assert_eq!(left_rows, expected);
	assert_eq!(right_rows, expected);
}
