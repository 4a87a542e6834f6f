// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use regex::Regex;

use crate::{
	Error, Result,
	bind::BindVariableStore,
	predicate::{
		EvalError,
		expr::{ArithOp, CompareOp, Expr, SymbolOperand},
	},
	table::{ColumnType, Partition, TableMetadata},
};

/// Filter as planned: an expression over column names, not yet bound to
/// runtime constants.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
	expr: Expr,
}

impl Filter {
	pub fn new(expr: Expr) -> Self {
		Self {
			expr,
		}
	}

	pub fn expr(&self) -> &Expr {
		&self.expr
	}

	/// Type-checks columns, reads bind variables and compiles regexes.
	pub fn bind(&self, metadata: &TableMetadata, binds: &dyn BindVariableStore) -> Result<BoundFilter> {
		let mut symbol_columns = Vec::new();
		let expr = Binder {
			metadata,
			binds,
			symbol_columns: &mut symbol_columns,
		}
		.bind_bool(&self.expr)?;
		symbol_columns.sort_unstable();
		symbol_columns.dedup();

		Ok(BoundFilter {
			expr,
			symbol_columns,
		})
	}
}

/// Filter with runtime constants in place. Symbol text is still unresolved.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundFilter {
	pub(crate) expr: BoundExpr,
	symbol_columns: Vec<usize>,
}

impl BoundFilter {
	/// Symbol columns whose dictionaries the filter needs, ascending.
	pub fn symbol_columns(&self) -> &[usize] {
		&self.symbol_columns
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumKind {
	Long,
	Double,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BoundNum {
	DoubleColumn(usize),
	/// `Long` or `Timestamp` column.
	LongColumn(usize),
	Double(f64),
	Long(i64),
	Arith {
		op: ArithOp,
		kind: NumKind,
		left: Box<BoundNum>,
		right: Box<BoundNum>,
	},
}

impl BoundNum {
	pub(crate) fn kind(&self) -> NumKind {
		match self {
			BoundNum::DoubleColumn(_) | BoundNum::Double(_) => NumKind::Double,
			BoundNum::LongColumn(_) | BoundNum::Long(_) => NumKind::Long,
			BoundNum::Arith {
				kind,
				..
			} => *kind,
		}
	}

	/// Only valid for `NumKind::Long` nodes.
	pub(crate) fn eval_long(&self, partition: &Partition, row: usize) -> std::result::Result<i64, EvalError> {
		match self {
			BoundNum::LongColumn(column) => Ok(partition.long(*column, row).unwrap_or(i64::MIN)),
			BoundNum::Long(value) => Ok(*value),
			BoundNum::Arith {
				kind: NumKind::Long,
				op,
				left,
				right,
			} => long_arith(*op, left.eval_long(partition, row)?, right.eval_long(partition, row)?),
			BoundNum::DoubleColumn(_) | BoundNum::Double(_) | BoundNum::Arith {
				..
			} => Ok(self.eval_double(partition, row)? as i64),
		}
	}

	pub(crate) fn eval_double(&self, partition: &Partition, row: usize) -> std::result::Result<f64, EvalError> {
		match self {
			BoundNum::DoubleColumn(column) => Ok(partition.double(*column, row).unwrap_or(f64::NAN)),
			BoundNum::Double(value) => Ok(*value),
			BoundNum::Arith {
				kind: NumKind::Double,
				op,
				left,
				right,
			} => Ok(double_arith(*op, left.eval_double(partition, row)?, right.eval_double(partition, row)?)),
			BoundNum::LongColumn(_) | BoundNum::Long(_) | BoundNum::Arith {
				..
			} => Ok(self.eval_long(partition, row)? as f64),
		}
	}
}

pub(crate) fn long_arith(op: ArithOp, left: i64, right: i64) -> std::result::Result<i64, EvalError> {
	let result = match op {
		ArithOp::Add => left.checked_add(right),
		ArithOp::Sub => left.checked_sub(right),
		ArithOp::Mul => left.checked_mul(right),
		ArithOp::Div => {
			if right == 0 {
				return Err(EvalError::DivisionByZero);
			}
			left.checked_div(right)
		}
	};
	result.ok_or(EvalError::Overflow)
}

pub(crate) fn double_arith(op: ArithOp, left: f64, right: f64) -> f64 {
	match op {
		ArithOp::Add => left + right,
		ArithOp::Sub => left - right,
		ArithOp::Mul => left * right,
		ArithOp::Div => left / right,
	}
}

/// Compiled regex compared by its source pattern.
#[derive(Debug, Clone)]
pub(crate) struct Pattern(pub(crate) Regex);

impl PartialEq for Pattern {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_str() == other.0.as_str()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BoundExpr {
	Compare {
		op: CompareOp,
		kind: NumKind,
		left: BoundNum,
		right: BoundNum,
	},
	And(Box<BoundExpr>, Box<BoundExpr>),
	Or(Box<BoundExpr>, Box<BoundExpr>),
	Not(Box<BoundExpr>),
	SymbolEq {
		column: usize,
		value: Option<String>,
	},
	SymbolIn {
		column: usize,
		values: Vec<Option<String>>,
	},
	/// `None` for a null pattern, which matches nothing.
	SymbolMatches {
		column: usize,
		pattern: Option<Pattern>,
	},
}

struct Binder<'a> {
	metadata: &'a TableMetadata,
	binds: &'a dyn BindVariableStore,
	symbol_columns: &'a mut Vec<usize>,
}

impl Binder<'_> {
	fn bind_bool(&mut self, expr: &Expr) -> Result<BoundExpr> {
		Ok(match expr {
			Expr::Compare {
				op,
				left,
				right,
			} => {
				let left = self.bind_num(left)?;
				let right = self.bind_num(right)?;
				let kind = if left.kind() == NumKind::Long && right.kind() == NumKind::Long {
					NumKind::Long
				} else {
					NumKind::Double
				};
				BoundExpr::Compare {
					op: *op,
					kind,
					left,
					right,
				}
			}
			Expr::And(left, right) => BoundExpr::And(Box::new(self.bind_bool(left)?), Box::new(self.bind_bool(right)?)),
			Expr::Or(left, right) => BoundExpr::Or(Box::new(self.bind_bool(left)?), Box::new(self.bind_bool(right)?)),
			Expr::Not(inner) => BoundExpr::Not(Box::new(self.bind_bool(inner)?)),
			Expr::SymbolEq {
				column,
				value,
			} => BoundExpr::SymbolEq {
				column: self.symbol_column(column)?,
				value: self.symbol_text(value)?,
			},
			Expr::SymbolIn {
				column,
				values,
			} => BoundExpr::SymbolIn {
				column: self.symbol_column(column)?,
				values: values.iter().map(|v| self.symbol_text(v)).collect::<Result<_>>()?,
			},
			Expr::SymbolMatches {
				column,
				pattern,
			} => {
				let column = self.symbol_column(column)?;
				let pattern = match self.symbol_text(pattern)? {
					Some(pattern) => Some(Pattern(Regex::new(&pattern).map_err(|err| {
						Error::InvalidRegex {
							pattern: pattern.clone(),
							message: err.to_string(),
						}
					})?)),
					None => None,
				};
				BoundExpr::SymbolMatches {
					column,
					pattern,
				}
			}
			Expr::Column(_)
			| Expr::Double(_)
			| Expr::Long(_)
			| Expr::BindLong(_)
			| Expr::BindDouble(_)
			| Expr::Arith {
				..
			} => {
				return Err(Error::InvalidFilter {
					reason: format!("{expr:?} is not a boolean expression"),
				});
			}
		})
	}

	fn bind_num(&mut self, expr: &Expr) -> Result<BoundNum> {
		Ok(match expr {
			Expr::Column(name) => {
				let index = self.column_index(name)?;
				match self.metadata.column_type(index)? {
					ColumnType::Double => BoundNum::DoubleColumn(index),
					ColumnType::Long | ColumnType::Timestamp => BoundNum::LongColumn(index),
					ColumnType::Symbol => {
						return Err(Error::ColumnType {
							name: name.clone(),
							expected: "numeric",
						});
					}
				}
			}
			Expr::Double(value) => BoundNum::Double(*value),
			Expr::Long(value) => BoundNum::Long(*value),
			Expr::BindLong(index) => BoundNum::Long(self.binds.get_long(*index)?),
			Expr::BindDouble(index) => BoundNum::Double(self.binds.get_double(*index)?),
			Expr::Arith {
				op,
				left,
				right,
			} => {
				let left = self.bind_num(left)?;
				let right = self.bind_num(right)?;
				let kind = if left.kind() == NumKind::Long && right.kind() == NumKind::Long {
					NumKind::Long
				} else {
					NumKind::Double
				};
				BoundNum::Arith {
					op: *op,
					kind,
					left: Box::new(left),
					right: Box::new(right),
				}
			}
			_ => {
				return Err(Error::InvalidFilter {
					reason: format!("{expr:?} is not a numeric expression"),
				});
			}
		})
	}

	fn column_index(&self, name: &str) -> Result<usize> {
		self.metadata.column_index(name).ok_or_else(|| Error::UnknownColumn {
			name: name.to_string(),
		})
	}

	fn symbol_column(&mut self, name: &str) -> Result<usize> {
		let index = self.column_index(name)?;
		if self.metadata.column_type(index)? != ColumnType::Symbol {
			return Err(Error::ColumnType {
				name: name.to_string(),
				expected: "symbol",
			});
		}
		self.symbol_columns.push(index);
		Ok(index)
	}

	fn symbol_text(&self, operand: &SymbolOperand) -> Result<Option<String>> {
		match operand {
			SymbolOperand::Null => Ok(None),
			SymbolOperand::Literal(value) => Ok(Some(value.clone())),
			SymbolOperand::Bind(index) => self.binds.get_str(*index),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::bind::BindVariables;

	fn metadata() -> TableMetadata {
		TableMetadata::new("x")
			.column("a", ColumnType::Double)
			.column("n", ColumnType::Long)
			.column("s", ColumnType::Symbol)
			.timestamp("t")
	}

	#[test]
	fn test_bind_reads_variables_once() {
		let binds = BindVariables::new();
		binds.set_long(0, 10);
		let filter = Filter::new(Expr::col("n").gt(Expr::bind_long(0)));

		let first = filter.bind(&metadata(), &binds).unwrap();
		binds.set_long(0, 20);
		let second = filter.bind(&metadata(), &binds).unwrap();
		assert_ne!(first, second);

		binds.set_long(0, 10);
		assert_eq!(first, filter.bind(&metadata(), &binds).unwrap());
	}

	#[test]
	fn test_long_and_double_kinds() {
		let binds = BindVariables::new();
		let bound = Filter::new(Expr::col("n").add(Expr::long(1)).lt(Expr::col("a"))).bind(&metadata(), &binds).unwrap();
		let BoundExpr::Compare {
			kind,
			left,
			..
		} = bound.expr
		else {
			panic!("expected comparison");
		};
		assert_eq!(kind, NumKind::Double);
		assert_eq!(left.kind(), NumKind::Long);
	}

	#[test]
	fn test_symbol_columns_collected() {
		let binds = BindVariables::new();
		binds.set_str(0, "A");
		let filter = Filter::new(
			Expr::symbol_eq("s", SymbolOperand::bind(0))
				.or(Expr::symbol_in("s", [SymbolOperand::literal("B"), SymbolOperand::Null])),
		);
		let bound = filter.bind(&metadata(), &binds).unwrap();
		assert_eq!(bound.symbol_columns(), &[2]);
	}

	#[test]
	fn test_bind_errors() {
		let binds = BindVariables::new();
		let m = metadata();

		let err = Filter::new(Expr::col("a").gt(Expr::bind_long(3))).bind(&m, &binds).unwrap_err();
		assert_eq!(
			err,
			Error::UndefinedBindVariable {
				index: 3
			}
		);

		let err = Filter::new(Expr::col("zz").gt(Expr::long(0))).bind(&m, &binds).unwrap_err();
		assert!(matches!(err, Error::UnknownColumn { .. }));

		let err = Filter::new(Expr::symbol_eq("a", SymbolOperand::literal("x"))).bind(&m, &binds).unwrap_err();
		assert!(matches!(err, Error::ColumnType { .. }));

		let err = Filter::new(Expr::symbol_matches("s", SymbolOperand::literal("("))).bind(&m, &binds).unwrap_err();
		assert!(matches!(err, Error::InvalidRegex { .. }));

		let err = Filter::new(Expr::col("a")).bind(&m, &binds).unwrap_err();
		assert!(matches!(err, Error::InvalidFilter { .. }));
	}

	#[test]
	fn test_long_arith_checks() {
		assert_eq!(long_arith(ArithOp::Div, 1, 0), Err(EvalError::DivisionByZero));
		assert_eq!(long_arith(ArithOp::Add, i64::MAX, 1), Err(EvalError::Overflow));
		assert_eq!(long_arith(ArithOp::Mul, 6, 7), Ok(42));
	}
}
