// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

//! Data model and external interfaces of the parallel query core: page
//! frames and their sources, the in-memory columnar table, symbol
//! dictionaries, bind variables, filter predicates, configuration and the
//! shared error type.

pub use bind::{BindValue, BindVariableStore, BindVariables};
pub use breaker::CircuitBreaker;
pub use config::{ExecutionConfig, JitMode};
pub use error::{Error, LifecycleViolation, Result};
pub use job::Job;
pub use page_frame::{PageFrame, PageFrameSource, Record, TableSource, Value};
pub use row_id::RowId;

pub mod bind;
mod breaker;
pub mod config;
mod error;
mod job;
pub mod page_frame;
pub mod predicate;
mod row_id;
pub mod symbol;
pub mod table;
