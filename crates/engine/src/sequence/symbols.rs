// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Deferred symbol resolution.
//!
//! Symbol text in a filter is resolved to dictionary codes per partition, at
//! dispatch time, against snapshots the sequence keeps. A cached predicate is
//! reused until its partition's dictionaries advance past the snapshots it
//! was resolved against, or the bound filter changes.

use std::{collections::HashMap, sync::Arc};

use strata_core::{
	PageFrameSource,
	predicate::{BoundFilter, Predicate, PredicateKind, SymbolSnapshots},
};
use tracing::debug;

struct Resolved {
	predicate: Arc<Predicate>,
	snapshots: SymbolSnapshots,
}

pub(crate) struct PredicateCache {
	kind: PredicateKind,
	filter: Option<BoundFilter>,
	partitions: HashMap<usize, Resolved>,
}

impl PredicateCache {
	pub(crate) fn new(kind: PredicateKind) -> Self {
		Self {
			kind,
			filter: None,
			partitions: HashMap::new(),
		}
	}

	/// Installs the filter of the next execution. Resolutions survive when
	/// the filter is unchanged.
	pub(crate) fn prepare(&mut self, filter: BoundFilter) {
		if self.filter.as_ref() != Some(&filter) {
			self.partitions.clear();
			self.filter = Some(filter);
		}
	}

	pub(crate) fn predicate(&mut self, source: &dyn PageFrameSource, partition_index: usize) -> Option<Arc<Predicate>> {
		let filter = self.filter.as_ref()?;

		if let Some(resolved) = self.partitions.get(&partition_index) {
			if resolved.snapshots.is_current(source) {
				return Some(Arc::clone(&resolved.predicate));
			}
			debug!(partition_index, "symbol dictionary advanced, resolving filter again");
		}

		let snapshots = SymbolSnapshots::capture(source, filter.symbol_columns());
		let predicate = Arc::new(filter.resolve(&snapshots, self.kind));
		self.partitions.insert(
			partition_index,
			Resolved {
				predicate: Arc::clone(&predicate),
				snapshots,
			},
		);
		Some(predicate)
	}

	pub(crate) fn resolved_partitions(&self) -> usize {
		self.partitions.len()
	}

	/// Drops every snapshot and resolution.
	pub(crate) fn release(&mut self) {
		self.filter = None;
		self.partitions.clear();
	}
}
