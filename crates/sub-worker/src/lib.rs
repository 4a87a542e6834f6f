// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

mod config;
mod pool;
mod worker;

pub use config::WorkerPoolConfig;
pub use pool::WorkerPool;
pub use strata_core::Job;
