// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

//! Parallel execution of filtered scans.
//!
//! A [`MessageBus`] owns one bounded reduce queue per shard. A
//! [`PageFrameSequence`] splits one query execution into page frames and
//! dispatches them to its shard's queue, where pool workers running
//! [`ReduceJob`]s filter them. A [`FilteredCursor`] reassembles the results
//! in scan order and applies the LIMIT policy.

pub use aggregate::{FilteredSum, SumRow};
pub use bus::MessageBus;
pub use cursor::{CursorState, FilteredCursor, Limit};
pub use factory::{FactoryKind, FilterPlanner, FilteredFactory, QueryContext};
pub use reduce::{ReduceJob, ReduceQueue, ReduceTask, SequenceProgress};
pub use sequence::{FrameHandle, PageFrameSequence, ScanOrder, TaskGuard};
pub use strata_core::{Error, Result};

mod aggregate;
mod bus;
mod cursor;
mod factory;
mod reduce;
mod sequence;
