// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use strata_core::{BindVariableStore, BindVariables, CircuitBreaker, ExecutionConfig, JitMode};

/// Per-execution inputs: bind variables, cancellation and JIT selection.
#[derive(Clone)]
pub struct QueryContext {
	binds: Arc<dyn BindVariableStore>,
	breaker: CircuitBreaker,
	jit_mode: JitMode,
}

impl QueryContext {
	pub fn new(config: &ExecutionConfig, binds: Arc<dyn BindVariableStore>) -> Self {
		Self {
			binds,
			breaker: CircuitBreaker::new(),
			jit_mode: config.jit_mode,
		}
	}

	/// Context with an empty bind variable store.
	pub fn empty(config: &ExecutionConfig) -> Self {
		Self::new(config, Arc::new(BindVariables::new()))
	}

	pub fn with_jit_mode(mut self, jit_mode: JitMode) -> Self {
		self.jit_mode = jit_mode;
		self
	}

	pub fn with_breaker(mut self, breaker: CircuitBreaker) -> Self {
		self.breaker = breaker;
		self
	}

	pub fn binds(&self) -> &dyn BindVariableStore {
		self.binds.as_ref()
	}

	pub fn breaker(&self) -> &CircuitBreaker {
		&self.breaker
	}

	pub fn jit_mode(&self) -> JitMode {
		self.jit_mode
	}
}
