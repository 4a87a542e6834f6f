// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{
	page_frame::PageFrameSource,
	predicate::{
		EvalError,
		bound::{BoundExpr, BoundNum, NumKind},
		expr::CompareOp,
	},
	symbol::{NULL_SYMBOL, SymbolSnapshot},
	table::Partition,
};

/// Dictionary snapshots of the symbol columns a filter reads.
#[derive(Debug, Clone, Default)]
pub struct SymbolSnapshots {
	entries: Vec<(usize, SymbolSnapshot)>,
}

impl SymbolSnapshots {
	pub fn capture(source: &dyn PageFrameSource, columns: &[usize]) -> Self {
		let entries = columns
			.iter()
			.filter_map(|column| Some((*column, source.symbol_table(*column)?.snapshot())))
			.collect();
		Self {
			entries,
		}
	}

	pub fn get(&self, column: usize) -> Option<&SymbolSnapshot> {
		self.entries.iter().find(|(c, _)| *c == column).map(|(_, snapshot)| snapshot)
	}

	/// True when any dictionary gained entries since capture.
	pub fn is_stale(&self) -> bool {
		self.entries.iter().any(|(_, snapshot)| snapshot.is_stale())
	}

	/// True when every snapshot is of `source`'s live dictionary and none is
	/// stale.
	pub fn is_current(&self, source: &dyn PageFrameSource) -> bool {
		self.entries.iter().all(|(column, snapshot)| {
			!snapshot.is_stale() && source.symbol_table(*column).is_some_and(|table| snapshot.is_snapshot_of(table))
		})
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Filter whose symbol text has been resolved to dictionary codes, evaluated
/// by walking the tree.
#[derive(Debug, Clone)]
pub struct ResolvedExpr {
	pub(crate) root: Node,
}

#[derive(Debug, Clone)]
pub(crate) enum Node {
	Compare {
		op: CompareOp,
		kind: NumKind,
		left: BoundNum,
		right: BoundNum,
	},
	And(Box<Node>, Box<Node>),
	Or(Box<Node>, Box<Node>),
	Not(Box<Node>),
	/// `None` when the value is absent from the dictionary.
	SymbolEq {
		column: usize,
		code: Option<i32>,
	},
	/// Sorted codes.
	SymbolIn {
		column: usize,
		codes: Vec<i32>,
	},
	/// Match flag per code.
	SymbolMatches {
		column: usize,
		matches: Vec<bool>,
	},
}

impl ResolvedExpr {
	pub(crate) fn resolve(expr: &BoundExpr, snapshots: &SymbolSnapshots) -> Self {
		Self {
			root: resolve_node(expr, snapshots),
		}
	}

	pub fn evaluate(&self, partition: &Partition, row: usize) -> Result<bool, EvalError> {
		self.root.evaluate(partition, row)
	}
}

fn resolve_code(snapshots: &SymbolSnapshots, column: usize, value: Option<&str>) -> Option<i32> {
	match value {
		None => Some(NULL_SYMBOL),
		Some(value) => snapshots.get(column)?.code_of(value),
	}
}

fn resolve_node(expr: &BoundExpr, snapshots: &SymbolSnapshots) -> Node {
	match expr {
		BoundExpr::Compare {
			op,
			kind,
			left,
			right,
		} => Node::Compare {
			op: *op,
			kind: *kind,
			left: left.clone(),
			right: right.clone(),
		},
		BoundExpr::And(left, right) => {
			Node::And(Box::new(resolve_node(left, snapshots)), Box::new(resolve_node(right, snapshots)))
		}
		BoundExpr::Or(left, right) => {
			Node::Or(Box::new(resolve_node(left, snapshots)), Box::new(resolve_node(right, snapshots)))
		}
		BoundExpr::Not(inner) => Node::Not(Box::new(resolve_node(inner, snapshots))),
		BoundExpr::SymbolEq {
			column,
			value,
		} => Node::SymbolEq {
			column: *column,
			code: resolve_code(snapshots, *column, value.as_deref()),
		},
		BoundExpr::SymbolIn {
			column,
			values,
		} => {
			let mut codes: Vec<i32> =
				values.iter().filter_map(|v| resolve_code(snapshots, *column, v.as_deref())).collect();
			codes.sort_unstable();
			codes.dedup();
			Node::SymbolIn {
				column: *column,
				codes,
			}
		}
		BoundExpr::SymbolMatches {
			column,
			pattern,
		} => {
			let mut matches = Vec::new();
			if let (Some(pattern), Some(snapshot)) = (pattern, snapshots.get(*column)) {
				matches.reserve(snapshot.len());
				snapshot.for_each(|_, value| matches.push(pattern.0.is_match(value)));
			}
			Node::SymbolMatches {
				column: *column,
				matches,
			}
		}
	}
}

impl Node {
	fn evaluate(&self, partition: &Partition, row: usize) -> Result<bool, EvalError> {
		match self {
			Node::Compare {
				op,
				kind: NumKind::Long,
				left,
				right,
			} => Ok(op.apply(left.eval_long(partition, row)?, right.eval_long(partition, row)?)),
			Node::Compare {
				op,
				kind: NumKind::Double,
				left,
				right,
			} => Ok(op.apply(left.eval_double(partition, row)?, right.eval_double(partition, row)?)),
			Node::And(left, right) => Ok(left.evaluate(partition, row)? && right.evaluate(partition, row)?),
			Node::Or(left, right) => Ok(left.evaluate(partition, row)? || right.evaluate(partition, row)?),
			Node::Not(inner) => Ok(!inner.evaluate(partition, row)?),
			Node::SymbolEq {
				column,
				code,
			} => Ok(code.is_some() && partition.symbol_code(*column, row) == *code),
			Node::SymbolIn {
				column,
				codes,
			} => Ok(partition.symbol_code(*column, row).is_some_and(|code| codes.binary_search(&code).is_ok())),
			Node::SymbolMatches {
				column,
				matches,
			} => Ok(partition
				.symbol_code(*column, row)
				.and_then(|code| usize::try_from(code).ok())
				.is_some_and(|code| matches.get(code).copied().unwrap_or(false))),
		}
	}
}
