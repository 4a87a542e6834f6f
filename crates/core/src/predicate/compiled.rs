// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Closure-compiled predicates.
//!
//! The resolved tree is flattened into nested closures once per partition;
//! evaluation then runs without matching on node kinds.

use std::fmt;

use crate::{
	predicate::{
		EvalError,
		bound::{BoundNum, NumKind, double_arith, long_arith},
		expr::Expr,
		resolved::{Node, ResolvedExpr},
	},
	table::Partition,
};

type BoolFn = Box<dyn Fn(&Partition, usize) -> Result<bool, EvalError> + Send + Sync>;
type LongFn = Box<dyn Fn(&Partition, usize) -> Result<i64, EvalError> + Send + Sync>;
type DoubleFn = Box<dyn Fn(&Partition, usize) -> Result<f64, EvalError> + Send + Sync>;

pub struct CompiledFilter {
	root: BoolFn,
}

impl CompiledFilter {
	/// Whether `expr` can be compiled. Symbol set membership and regex
	/// matching are interpreted only.
	pub fn supports(expr: &Expr) -> bool {
		!expr.any(&|e| matches!(e, Expr::SymbolIn { .. } | Expr::SymbolMatches { .. }))
	}

	/// `None` when the tree holds nodes the compiler does not handle.
	pub(crate) fn compile(resolved: &ResolvedExpr) -> Option<Self> {
		Some(Self {
			root: compile_bool(&resolved.root)?,
		})
	}

	#[inline]
	pub fn evaluate(&self, partition: &Partition, row: usize) -> Result<bool, EvalError> {
		(self.root)(partition, row)
	}
}

impl fmt::Debug for CompiledFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("CompiledFilter")
	}
}

fn bool_fn(f: impl Fn(&Partition, usize) -> Result<bool, EvalError> + Send + Sync + 'static) -> BoolFn {
	Box::new(f)
}

fn long_fn(f: impl Fn(&Partition, usize) -> Result<i64, EvalError> + Send + Sync + 'static) -> LongFn {
	Box::new(f)
}

fn double_fn(f: impl Fn(&Partition, usize) -> Result<f64, EvalError> + Send + Sync + 'static) -> DoubleFn {
	Box::new(f)
}

fn compile_bool(node: &Node) -> Option<BoolFn> {
	Some(match node {
		Node::Compare {
			op,
			kind: NumKind::Long,
			left,
			right,
		} => {
			let (op, left, right) = (*op, compile_long(left), compile_long(right));
			bool_fn(move |p, row| Ok(op.apply(left(p, row)?, right(p, row)?)))
		}
		Node::Compare {
			op,
			kind: NumKind::Double,
			left,
			right,
		} => {
			let (op, left, right) = (*op, compile_double(left), compile_double(right));
			bool_fn(move |p, row| Ok(op.apply(left(p, row)?, right(p, row)?)))
		}
		Node::And(left, right) => {
			let (left, right) = (compile_bool(left)?, compile_bool(right)?);
			bool_fn(move |p, row| Ok(left(p, row)? && right(p, row)?))
		}
		Node::Or(left, right) => {
			let (left, right) = (compile_bool(left)?, compile_bool(right)?);
			bool_fn(move |p, row| Ok(left(p, row)? || right(p, row)?))
		}
		Node::Not(inner) => {
			let inner = compile_bool(inner)?;
			bool_fn(move |p, row| Ok(!inner(p, row)?))
		}
		Node::SymbolEq {
			column,
			code: Some(code),
		} => {
			let (column, code) = (*column, *code);
			bool_fn(move |p, row| Ok(p.symbol_code(column, row) == Some(code)))
		}
		Node::SymbolEq {
			code: None,
			..
		} => bool_fn(|_, _| Ok(false)),
		Node::SymbolIn {
			..
		}
		| Node::SymbolMatches {
			..
		} => return None,
	})
}

fn compile_long(num: &BoundNum) -> LongFn {
	match num {
		BoundNum::LongColumn(column) => {
			let column = *column;
			long_fn(move |p, row| Ok(p.long(column, row).unwrap_or(i64::MIN)))
		}
		BoundNum::Long(value) => {
			let value = *value;
			long_fn(move |_, _| Ok(value))
		}
		BoundNum::Arith {
			kind: NumKind::Long,
			op,
			left,
			right,
		} => {
			let (op, left, right) = (*op, compile_long(left), compile_long(right));
			long_fn(move |p, row| long_arith(op, left(p, row)?, right(p, row)?))
		}
		BoundNum::DoubleColumn(_) | BoundNum::Double(_) | BoundNum::Arith {
			..
		} => {
			let inner = compile_double(num);
			long_fn(move |p, row| Ok(inner(p, row)? as i64))
		}
	}
}

fn compile_double(num: &BoundNum) -> DoubleFn {
	match num {
		BoundNum::DoubleColumn(column) => {
			let column = *column;
			double_fn(move |p, row| Ok(p.double(column, row).unwrap_or(f64::NAN)))
		}
		BoundNum::Double(value) => {
			let value = *value;
			double_fn(move |_, _| Ok(value))
		}
		BoundNum::Arith {
			kind: NumKind::Double,
			op,
			left,
			right,
		} => {
			let (op, left, right) = (*op, compile_double(left), compile_double(right));
			double_fn(move |p, row| Ok(double_arith(op, left(p, row)?, right(p, row)?)))
		}
		BoundNum::LongColumn(_) | BoundNum::Long(_) | BoundNum::Arith {
			..
		} => {
			let inner = compile_long(num);
			double_fn(move |p, row| Ok(inner(p, row)? as f64))
		}
	}
}
