// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Indexed bind variables (`$1`, `$2`, ...), zero based.

use parking_lot::RwLock;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
	Null,
	Long(i64),
	Double(f64),
	Str(String),
}

/// Read access to bind variables. The core only reads them, once per cursor
/// open.
pub trait BindVariableStore: Send + Sync {
	fn get_long(&self, index: usize) -> Result<i64>;

	fn get_double(&self, index: usize) -> Result<f64>;

	/// `None` stands for a null string.
	fn get_str(&self, index: usize) -> Result<Option<String>>;
}

#[derive(Debug, Default)]
pub struct BindVariables {
	values: RwLock<Vec<Option<BindValue>>>,
}

impl BindVariables {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(&self, index: usize, value: BindValue) {
		let mut values = self.values.write();
		if values.len() <= index {
			values.resize(index + 1, None);
		}
		values[index] = Some(value);
	}

	pub fn set_long(&self, index: usize, value: i64) {
		self.set(index, BindValue::Long(value));
	}

	pub fn set_double(&self, index: usize, value: f64) {
		self.set(index, BindValue::Double(value));
	}

	pub fn set_str(&self, index: usize, value: impl Into<String>) {
		self.set(index, BindValue::Str(value.into()));
	}

	pub fn clear(&self) {
		self.values.write().clear();
	}

	fn get(&self, index: usize) -> Result<BindValue> {
		self.values.read().get(index).cloned().flatten().ok_or(Error::UndefinedBindVariable {
			index,
		})
	}
}

impl BindVariableStore for BindVariables {
	fn get_long(&self, index: usize) -> Result<i64> {
		match self.get(index)? {
			BindValue::Long(value) => Ok(value),
			_ => Err(Error::BindVariableType {
				index,
				expected: "long",
			}),
		}
	}

	fn get_double(&self, index: usize) -> Result<f64> {
		match self.get(index)? {
			BindValue::Double(value) => Ok(value),
			BindValue::Long(value) => Ok(value as f64),
			_ => Err(Error::BindVariableType {
				index,
				expected: "double",
			}),
		}
	}

	fn get_str(&self, index: usize) -> Result<Option<String>> {
		match self.get(index)? {
			BindValue::Str(value) => Ok(Some(value)),
			BindValue::Null => Ok(None),
			_ => Err(Error::BindVariableType {
				index,
				expected: "string",
			}),
		}
	}
}
