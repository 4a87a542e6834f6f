// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use strata_core::{
	CircuitBreaker, Error,
	predicate::{Expr, Filter, PredicateKind},
};
use strata_engine::{FilteredSum, Limit};
use strata_testing::{Harness, Rnd, fixture, reference};

const ROWS: usize = 100_000;

fn a_above(threshold: f64) -> Filter {
	Filter::new(Expr::col("a").gt(Expr::double(threshold)))
}

#[test]
fn test_sum_matches_reference() {
	let table = fixture::double_table(ROWS, &mut Rnd::default());
	let harness = Harness::with_queue(4, 1_000, 2);
	let (expected_sum, expected_count) = reference::sum_where(&table, 0, |r| r.double(0).is_some_and(|a| a > 0.5));

	for kind in [PredicateKind::Compiled, PredicateKind::Interpreted] {
		let mut sum = FilteredSum::new(harness.bus(), table.clone(), a_above(0.5), "a", Limit::None, kind).unwrap();
		let rows = sum.execute(&harness.context()).unwrap();
		assert_eq!(rows.len(), 1);
		assert_eq!(rows[0].count, expected_count);
		let actual = rows[0].sum.unwrap();
		assert!((actual - expected_sum).abs() <= expected_sum.abs() * 1e-9, "{actual} != {expected_sum}");
	}
}

#[test]
fn test_sum_without_matches() {
	let table = fixture::double_table(ROWS, &mut Rnd::default());
	let harness = Harness::with_queue(2, 1_000, 1);
	let mut sum =
		FilteredSum::new(harness.bus(), table, a_above(2.0), "a", Limit::None, PredicateKind::Compiled).unwrap();

	let rows = sum.execute(&harness.context()).unwrap();
	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].sum, None);
	assert_eq!(rows[0].count, 0);
}

#[test]
fn test_sum_limit_and_breaker() {
	let table = fixture::double_table(ROWS, &mut Rnd::default());
	let harness = Harness::with_queue(2, 1_000, 1);

	let mut limited =
		FilteredSum::new(harness.bus(), table.clone(), a_above(0.5), "a", Limit::Positive(0), PredicateKind::Compiled)
			.unwrap();
	assert!(limited.execute(&harness.context()).unwrap().is_empty());

	let breaker = CircuitBreaker::new();
	breaker.trip();
	let mut cancelled =
		FilteredSum::new(harness.bus(), table, a_above(0.5), "a", Limit::None, PredicateKind::Compiled).unwrap();
	assert!(cancelled.execute(&harness.context().with_breaker(breaker)).unwrap().is_empty());
	assert_eq!(harness.bus().queue(0).unwrap().in_flight(), 0);
}

#[test]
fn test_sum_column_checked() {
	let table = fixture::symbol_table(1_000, &["A"], &mut Rnd::default());
	let harness = Harness::with_queue(2, 1_000, 1);

	let err = FilteredSum::new(harness.bus(), table.clone(), a_above(0.5), "missing", Limit::None, PredicateKind::Compiled)
		.err()
		.unwrap();
	assert_eq!(
		err,
		Error::UnknownColumn {
			name: "missing".to_string()
		}
	);

	let err = FilteredSum::new(harness.bus(), table.clone(), a_above(0.5), "s", Limit::None, PredicateKind::Compiled)
		.err()
		.unwrap();
	assert!(matches!(
		err,
		Error::ColumnType {
			expected: "numeric",
			..
		}
	));

	let mut over_long =
		FilteredSum::new(harness.bus(), table, Filter::new(Expr::col("l").lt(Expr::long(10))), "l", Limit::None, PredicateKind::Interpreted)
			.unwrap();
	let rows = over_long.execute(&harness.context()).unwrap();
	assert_eq!(rows[0].count, 10);
	assert_eq!(rows[0].sum, Some(45.0));
}
