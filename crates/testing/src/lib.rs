// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Shared test support: deterministic data, table fixtures, brute-force
//! reference scans and a bus plus worker pool harness.

pub mod fixture;
mod harness;
pub mod reference;
mod rnd;
pub mod util;

pub use harness::{Harness, init_tracing};
pub use rnd::Rnd;
