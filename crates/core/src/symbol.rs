// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Symbol dictionaries.
//!
//! A symbol column stores `i32` codes; the dictionary maps codes to text. The
//! dictionary is append-only, so a snapshot is just the dictionary plus the
//! number of entries that existed when it was taken. Writers may keep
//! appending while readers hold snapshots.

use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::RwLock;

/// Code stored for a null symbol.
pub const NULL_SYMBOL: i32 = -1;

#[derive(Default)]
struct Entries {
	values: Vec<Arc<str>>,
	codes: HashMap<Arc<str>, i32>,
}

/// Append-only string dictionary of one symbol column.
#[derive(Default)]
pub struct SymbolTable {
	entries: RwLock<Entries>,
}

impl SymbolTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the code of `value`, appending it when missing.
	pub fn put(&self, value: &str) -> i32 {
		if let Some(code) = self.entries.read().codes.get(value) {
			return *code;
		}

		let mut entries = self.entries.write();
		if let Some(code) = entries.codes.get(value) {
			return *code;
		}
		let code = entries.values.len() as i32;
		let value: Arc<str> = Arc::from(value);
		entries.values.push(Arc::clone(&value));
		entries.codes.insert(value, code);
		code
	}

	pub fn code_of(&self, value: &str) -> Option<i32> {
		self.entries.read().codes.get(value).copied()
	}

	pub fn value_of(&self, code: i32) -> Option<Arc<str>> {
		if code < 0 {
			return None;
		}
		self.entries.read().values.get(code as usize).cloned()
	}

	pub fn len(&self) -> usize {
		self.entries.read().values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Takes a point-in-time view of the dictionary.
	pub fn snapshot(self: &Arc<Self>) -> SymbolSnapshot {
		SymbolSnapshot {
			table: Arc::clone(self),
			len: self.len(),
		}
	}
}

impl fmt::Debug for SymbolTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SymbolTable").field("len", &self.len()).finish()
	}
}

/// Read-only view of a [`SymbolTable`] as of the moment it was taken.
///
/// Codes appended after the snapshot are invisible to it; [`is_stale`]
/// reports whether that has happened.
///
/// [`is_stale`]: SymbolSnapshot::is_stale
#[derive(Debug, Clone)]
pub struct SymbolSnapshot {
	table: Arc<SymbolTable>,
	len: usize,
}

impl SymbolSnapshot {
	pub fn code_of(&self, value: &str) -> Option<i32> {
		self.table.code_of(value).filter(|code| (*code as usize) < self.len)
	}

	pub fn value_of(&self, code: i32) -> Option<Arc<str>> {
		if code < 0 || code as usize >= self.len {
			return None;
		}
		self.table.value_of(code)
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// True when the dictionary gained entries since this snapshot was taken.
	pub fn is_stale(&self) -> bool {
		self.table.len() > self.len
	}

	/// Clones a fresh snapshot of the same dictionary.
	pub fn refresh(&self) -> SymbolSnapshot {
		self.table.snapshot()
	}

	/// Visits every entry visible to this snapshot in code order.
	pub fn for_each(&self, mut f: impl FnMut(i32, &str)) {
		let entries = self.table.entries.read();
		for (code, value) in entries.values.iter().take(self.len).enumerate() {
			f(code as i32, value);
		}
	}

	pub fn same_table(&self, other: &SymbolSnapshot) -> bool {
		Arc::ptr_eq(&self.table, &other.table)
	}

	pub fn is_snapshot_of(&self, table: &Arc<SymbolTable>) -> bool {
		Arc::ptr_eq(&self.table, table)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_put_is_idempotent() {
		let table = SymbolTable::new();
		assert_eq!(table.put("A"), 0);
		assert_eq!(table.put("B"), 1);
		assert_eq!(table.put("A"), 0);
		assert_eq!(table.len(), 2);
		assert_eq!(table.value_of(1).as_deref(), Some("B"));
		assert_eq!(table.value_of(NULL_SYMBOL), None);
	}

	#[test]
	fn test_snapshot_hides_later_entries() {
		let table = Arc::new(SymbolTable::new());
		table.put("A");
		table.put("B");

		let snapshot = table.snapshot();
		table.put("C");

		assert_eq!(snapshot.len(), 2);
		assert_eq!(snapshot.code_of("C"), None);
		assert_eq!(snapshot.value_of(2), None);
		assert!(snapshot.is_stale());

		let fresh = snapshot.refresh();
		assert!(!fresh.is_stale());
		assert_eq!(fresh.code_of("C"), Some(2));
		assert!(fresh.same_table(&snapshot));
	}

	#[test]
	fn test_for_each_respects_snapshot_len() {
		let table = Arc::new(SymbolTable::new());
		table.put("x");
		let snapshot = table.snapshot();
		table.put("y");

		let mut seen = Vec::new();
		snapshot.for_each(|code, value| seen.push((code, value.to_string())));
		assert_eq!(seen, vec![(0, "x".to_string())]);
	}
}
