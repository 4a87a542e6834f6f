// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use strata_core::{
	JitMode, Result, TableSource,
	predicate::{CompiledFilter, Filter, PredicateKind},
};
use tracing::debug;

use crate::{
	bus::MessageBus,
	cursor::Limit,
	factory::{FactoryKind, FilteredFactory, QueryContext},
	sequence::PageFrameSequence,
};

/// Picks the factory for a filtered scan.
///
/// Parallel filtering disabled yields a [`FactoryKind::Sync`] factory and the
/// JIT mode is ignored. Otherwise the compiled predicate is used when JIT is
/// enabled and the filter compiles.
pub struct FilterPlanner {
	bus: MessageBus,
}

impl FilterPlanner {
	pub fn new(bus: MessageBus) -> Self {
		Self {
			bus,
		}
	}

	pub fn bus(&self) -> &MessageBus {
		&self.bus
	}

	pub fn kind(&self, filter: &Filter, jit_mode: JitMode) -> FactoryKind {
		if !self.bus.config().parallel_filter_enabled {
			FactoryKind::Sync
		} else if jit_mode == JitMode::Enabled && CompiledFilter::supports(filter.expr()) {
			FactoryKind::AsyncCompiled
		} else {
			FactoryKind::Async
		}
	}

	pub fn plan(
		&self,
		table: Arc<dyn TableSource>,
		filter: Filter,
		limit: Limit,
		ctx: &QueryContext,
	) -> Result<FilteredFactory> {
		let kind = self.kind(&filter, ctx.jit_mode());
		let sequence = match kind {
			FactoryKind::Sync => PageFrameSequence::local(&self.bus, PredicateKind::Interpreted)?,
			FactoryKind::Async => PageFrameSequence::new(&self.bus, PredicateKind::Interpreted)?,
			FactoryKind::AsyncCompiled => PageFrameSequence::new(&self.bus, PredicateKind::Compiled)?,
		};
		debug!(table = table.metadata().name(), ?kind, ?limit, "planned filtered scan");

		Ok(FilteredFactory::new(kind, table, filter, limit, sequence, self.bus.config().page_frame_max_rows))
	}
}
