// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Filter predicates.
//!
//! A filter moves through three stages. [`Filter`] is the planned expression.
//! [`Filter::bind`] reads bind variables and type-checks columns once per
//! cursor open, producing a [`BoundFilter`]. [`BoundFilter::resolve`] maps
//! symbol text to dictionary codes against [`SymbolSnapshots`] and produces
//! the executable [`Predicate`], compiled or interpreted.

mod bound;
mod compiled;
mod expr;
mod resolved;

pub use bound::{BoundFilter, Filter};
pub use compiled::CompiledFilter;
pub use expr::{ArithOp, CompareOp, Expr, SymbolOperand};
pub use resolved::{ResolvedExpr, SymbolSnapshots};

use crate::table::Partition;

/// Row-level evaluation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
	#[error("division by zero")]
	DivisionByZero,
	#[error("numeric overflow")]
	Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateKind {
	Compiled,
	Interpreted,
}

#[derive(Debug)]
pub enum Predicate {
	Compiled(CompiledFilter),
	Interpreted(ResolvedExpr),
}

impl Predicate {
	#[inline]
	pub fn evaluate(&self, partition: &Partition, row: usize) -> Result<bool, EvalError> {
		match self {
			Predicate::Compiled(filter) => filter.evaluate(partition, row),
			Predicate::Interpreted(expr) => expr.evaluate(partition, row),
		}
	}

	pub fn kind(&self) -> PredicateKind {
		match self {
			Predicate::Compiled(_) => PredicateKind::Compiled,
			Predicate::Interpreted(_) => PredicateKind::Interpreted,
		}
	}
}

impl BoundFilter {
	/// Resolves symbol text against `snapshots`. A compiled predicate is
	/// produced only when requested and the tree compiles.
	pub fn resolve(&self, snapshots: &SymbolSnapshots, kind: PredicateKind) -> Predicate {
		let resolved = ResolvedExpr::resolve(&self.expr, snapshots);
		if kind == PredicateKind::Compiled {
			if let Some(compiled) = CompiledFilter::compile(&resolved) {
				return Predicate::Compiled(compiled);
			}
		}
		Predicate::Interpreted(resolved)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		Error,
		bind::BindVariables,
		page_frame::{PageFrameSource, TableSource},
		table::{ColumnBatch, ColumnType, ColumnValues, MemoryTable, TableMetadata},
	};

	fn table() -> MemoryTable {
		let table = MemoryTable::new(
			TableMetadata::new("x")
				.column("a", ColumnType::Double)
				.column("n", ColumnType::Long)
				.column("s", ColumnType::Symbol)
				.timestamp("t"),
		);
		table.append(ColumnBatch::new(vec![
			ColumnValues::Double(vec![0.1, 0.5, 0.9, f64::NAN]),
			ColumnValues::Long(vec![1, 2, 0, 4]),
			ColumnValues::Symbol(vec![Some("A".into()), Some("B".into()), None, Some("C".into())]),
			ColumnValues::Timestamp(vec![0, 1, 2, 3]),
		]))
		.unwrap();
		table
	}

	fn matching(table: &MemoryTable, filter: &Filter, binds: &BindVariables, kind: PredicateKind) -> Result<Vec<usize>, EvalError> {
		let source = table.open(100);
		let bound = filter.bind(source.metadata(), binds).unwrap();
		let snapshots = SymbolSnapshots::capture(source.as_ref(), bound.symbol_columns());
		let predicate = bound.resolve(&snapshots, kind);
		let partition = source.partition(0).unwrap();
		let mut rows = Vec::new();
		for row in 0..partition.row_count() {
			if predicate.evaluate(partition, row)? {
				rows.push(row);
			}
		}
		Ok(rows)
	}

	fn both(table: &MemoryTable, filter: &Filter, binds: &BindVariables) -> Vec<usize> {
		let compiled = matching(table, filter, binds, PredicateKind::Compiled).unwrap();
		let interpreted = matching(table, filter, binds, PredicateKind::Interpreted).unwrap();
		assert_eq!(compiled, interpreted);
		compiled
	}

	#[test]
	fn test_numeric_range() {
		let table = table();
		let filter = Filter::new(Expr::double(0.2).lt(Expr::col("a")).and(Expr::col("a").lt(Expr::double(1.0))));
		assert_eq!(both(&table, &filter, &BindVariables::new()), vec![1, 2]);
	}

	#[test]
	fn test_nan_never_matches_comparison() {
		let table = table();
		let filter = Filter::new(Expr::col("a").ge(Expr::double(0.0)));
		assert_eq!(both(&table, &filter, &BindVariables::new()), vec![0, 1, 2]);
	}

	#[test]
	fn test_long_arithmetic_and_binds() {
		let table = table();
		let binds = BindVariables::new();
		binds.set_long(0, 3);
		let filter = Filter::new(Expr::col("n").mul(Expr::long(2)).ge(Expr::bind_long(0)));
		assert_eq!(both(&table, &filter, &binds), vec![1, 3]);
	}

	#[test]
	fn test_division_by_zero_is_reported() {
		let table = table();
		let filter = Filter::new(Expr::long(10).div(Expr::col("n")).gt(Expr::long(0)));
		for kind in [PredicateKind::Compiled, PredicateKind::Interpreted] {
			assert_eq!(matching(&table, &filter, &BindVariables::new(), kind), Err(EvalError::DivisionByZero));
		}
	}

	#[test]
	fn test_symbol_predicates() {
		let table = table();
		let binds = BindVariables::new();
		binds.set_str(0, "B");

		let eq = Filter::new(Expr::symbol_eq("s", SymbolOperand::bind(0)));
		assert_eq!(both(&table, &eq, &binds), vec![1]);

		let null = Filter::new(Expr::symbol_eq("s", SymbolOperand::Null));
		assert_eq!(both(&table, &null, &binds), vec![2]);

		let missing = Filter::new(Expr::symbol_eq("s", SymbolOperand::literal("Z")));
		assert!(both(&table, &missing, &binds).is_empty());

		let not_missing = Filter::new(Expr::symbol_eq("s", SymbolOperand::literal("Z")).negate());
		assert_eq!(both(&table, &not_missing, &binds), vec![0, 1, 2, 3]);

		let set = Filter::new(Expr::symbol_in("s", [SymbolOperand::literal("A"), SymbolOperand::literal("C")]));
		assert_eq!(matching(&table, &set, &binds, PredicateKind::Interpreted).unwrap(), vec![0, 3]);

		binds.set_str(1, "^[BC]$");
		let regex = Filter::new(Expr::symbol_matches("s", SymbolOperand::bind(1)));
		assert_eq!(matching(&table, &regex, &binds, PredicateKind::Interpreted).unwrap(), vec![1, 3]);
	}

	#[test]
	fn test_compiled_support() {
		assert!(CompiledFilter::supports(&Expr::symbol_eq("s", SymbolOperand::bind(0))));
		assert!(!CompiledFilter::supports(&Expr::col("a").gt(Expr::long(1)).and(Expr::symbol_in("s", []))));
		assert!(!CompiledFilter::supports(&Expr::symbol_matches("s", SymbolOperand::literal(".")).negate()));
	}

	#[test]
	fn test_compiled_falls_back_for_unsupported_nodes() {
		let table = table();
		let source = table.open(10);
		let bound = Filter::new(Expr::symbol_in("s", [SymbolOperand::literal("A")]))
			.bind(source.metadata(), &BindVariables::new())
			.unwrap();
		let snapshots = SymbolSnapshots::capture(source.as_ref(), bound.symbol_columns());
		assert_eq!(bound.resolve(&snapshots, PredicateKind::Compiled).kind(), PredicateKind::Interpreted);
	}

	#[test]
	fn test_snapshots_detect_new_symbols() {
		let table = table();
		let source = table.open(10);
		let snapshots = SymbolSnapshots::capture(source.as_ref(), &[2]);
		assert!(!snapshots.is_stale());

		table.symbol_table(2).unwrap().put("D");
		assert!(snapshots.is_stale());
		assert!(matches!(
			Filter::new(Expr::symbol_eq("n", SymbolOperand::Null)).bind(source.metadata(), &BindVariables::new()),
			Err(Error::ColumnType { .. })
		));
	}
}
