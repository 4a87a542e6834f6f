// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
	Add,
	Sub,
	Mul,
	Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
	Lt,
	Le,
	Gt,
	Ge,
	Eq,
	Ne,
}

impl CompareOp {
	pub(crate) fn apply<T: PartialOrd>(self, left: T, right: T) -> bool {
		match self {
			CompareOp::Lt => left < right,
			CompareOp::Le => left <= right,
			CompareOp::Gt => left > right,
			CompareOp::Ge => left >= right,
			CompareOp::Eq => left == right,
			CompareOp::Ne => left != right,
		}
	}
}

/// Text side of a symbol predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOperand {
	Null,
	Literal(String),
	/// String bind variable, read when the cursor opens.
	Bind(usize),
}

impl SymbolOperand {
	pub fn literal(value: impl Into<String>) -> Self {
		SymbolOperand::Literal(value.into())
	}

	pub fn bind(index: usize) -> Self {
		SymbolOperand::Bind(index)
	}
}

/// Unbound filter expression. Columns are referenced by name.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	Column(String),
	Double(f64),
	Long(i64),
	BindLong(usize),
	BindDouble(usize),
	Arith {
		op: ArithOp,
		left: Box<Expr>,
		right: Box<Expr>,
	},
	Compare {
		op: CompareOp,
		left: Box<Expr>,
		right: Box<Expr>,
	},
	And(Box<Expr>, Box<Expr>),
	Or(Box<Expr>, Box<Expr>),
	Not(Box<Expr>),
	SymbolEq {
		column: String,
		value: SymbolOperand,
	},
	SymbolIn {
		column: String,
		values: Vec<SymbolOperand>,
	},
	SymbolMatches {
		column: String,
		pattern: SymbolOperand,
	},
}

impl Expr {
	pub fn col(name: impl Into<String>) -> Self {
		Expr::Column(name.into())
	}

	pub fn double(value: f64) -> Self {
		Expr::Double(value)
	}

	pub fn long(value: i64) -> Self {
		Expr::Long(value)
	}

	pub fn bind_long(index: usize) -> Self {
		Expr::BindLong(index)
	}

	pub fn bind_double(index: usize) -> Self {
		Expr::BindDouble(index)
	}

	pub fn symbol_eq(column: impl Into<String>, value: SymbolOperand) -> Self {
		Expr::SymbolEq {
			column: column.into(),
			value,
		}
	}

	pub fn symbol_in(column: impl Into<String>, values: impl IntoIterator<Item = SymbolOperand>) -> Self {
		Expr::SymbolIn {
			column: column.into(),
			values: values.into_iter().collect(),
		}
	}

	pub fn symbol_matches(column: impl Into<String>, pattern: SymbolOperand) -> Self {
		Expr::SymbolMatches {
			column: column.into(),
			pattern,
		}
	}

	fn arith(self, op: ArithOp, right: Expr) -> Self {
		Expr::Arith {
			op,
			left: Box::new(self),
			right: Box::new(right),
		}
	}

	fn compare(self, op: CompareOp, right: Expr) -> Self {
		Expr::Compare {
			op,
			left: Box::new(self),
			right: Box::new(right),
		}
	}

	pub fn add(self, right: Expr) -> Self {
		self.arith(ArithOp::Add, right)
	}

	pub fn sub(self, right: Expr) -> Self {
		self.arith(ArithOp::Sub, right)
	}

	pub fn mul(self, right: Expr) -> Self {
		self.arith(ArithOp::Mul, right)
	}

	pub fn div(self, right: Expr) -> Self {
		self.arith(ArithOp::Div, right)
	}

	pub fn lt(self, right: Expr) -> Self {
		self.compare(CompareOp::Lt, right)
	}

	pub fn le(self, right: Expr) -> Self {
		self.compare(CompareOp::Le, right)
	}

	pub fn gt(self, right: Expr) -> Self {
		self.compare(CompareOp::Gt, right)
	}

	pub fn ge(self, right: Expr) -> Self {
		self.compare(CompareOp::Ge, right)
	}

	pub fn equal(self, right: Expr) -> Self {
		self.compare(CompareOp::Eq, right)
	}

	pub fn not_equal(self, right: Expr) -> Self {
		self.compare(CompareOp::Ne, right)
	}

	pub fn and(self, right: Expr) -> Self {
		Expr::And(Box::new(self), Box::new(right))
	}

	pub fn or(self, right: Expr) -> Self {
		Expr::Or(Box::new(self), Box::new(right))
	}

	pub fn negate(self) -> Self {
		Expr::Not(Box::new(self))
	}

	/// Visits this node and all of its descendants.
	pub fn any(&self, f: &impl Fn(&Expr) -> bool) -> bool {
		if f(self) {
			return true;
		}
		match self {
			Expr::Arith {
				left,
				right,
				..
			}
			| Expr::Compare {
				left,
				right,
				..
			}
			| Expr::And(left, right)
			| Expr::Or(left, right) => left.any(f) || right.any(f),
			Expr::Not(inner) => inner.any(f),
			_ => false,
		}
	}
}
