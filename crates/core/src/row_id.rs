// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt;

const ROW_BITS: u32 = 44;
const ROW_MASK: u64 = (1 << ROW_BITS) - 1;

/// Table-wide row address: partition index in the high 20 bits, row within
/// the partition in the low 44 bits. Orders by partition, then row.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(u64);

impl RowId {
	#[inline]
	pub fn new(partition_index: usize, row: usize) -> Self {
		debug_assert!((row as u64) <= ROW_MASK, "row {row} does not fit into a row id");
		Self(((partition_index as u64) << ROW_BITS) | row as u64)
	}

	#[inline]
	pub fn partition_index(self) -> usize {
		(self.0 >> ROW_BITS) as usize
	}

	#[inline]
	pub fn row(self) -> usize {
		(self.0 & ROW_MASK) as usize
	}

	#[inline]
	pub fn as_u64(self) -> u64 {
		self.0
	}
}

impl fmt::Debug for RowId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "RowId({}:{})", self.partition_index(), self.row())
	}
}
