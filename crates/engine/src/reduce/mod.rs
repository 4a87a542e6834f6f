// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod job;
pub(crate) mod progress;
mod queue;
mod task;

pub use job::ReduceJob;
pub use progress::SequenceProgress;
pub use queue::ReduceQueue;
pub use task::ReduceTask;
