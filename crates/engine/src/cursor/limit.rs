// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use strata_core::{BindVariableStore, Result};

/// LIMIT clause of a filtered query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Limit {
	#[default]
	None,
	/// First `n` matching rows.
	Positive(u64),
	/// Last `n` matching rows.
	Negative(u64),
	/// Read from a long bind variable when the cursor opens. Negative values
	/// select the last rows.
	Bind(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolvedLimit {
	None,
	Positive(u64),
	Negative(u64),
}

impl Limit {
	pub(crate) fn resolve(self, binds: &dyn BindVariableStore) -> Result<ResolvedLimit> {
		Ok(match self {
			Limit::None => ResolvedLimit::None,
			Limit::Positive(n) => ResolvedLimit::Positive(n),
			Limit::Negative(n) => ResolvedLimit::Negative(n),
			Limit::Bind(index) => {
				let value = binds.get_long(index)?;
				if value < 0 {
					ResolvedLimit::Negative(value.unsigned_abs())
				} else {
					ResolvedLimit::Positive(value as u64)
				}
			}
		})
	}
}
