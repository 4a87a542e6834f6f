// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::result;

/// Errors raised by the query core.
///
/// Errors are `Clone` because a failure captured on a reduce task by one
/// thread is re-raised to whichever thread collects that task.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
	#[error("invalid configuration for '{option}': {reason}")]
	Configuration {
		option: &'static str,
		reason: String,
	},

	#[error("filter failed in frame {frame_index} (partition {partition_index}, row {row}): {message}")]
	PredicateEvaluation {
		frame_index: usize,
		partition_index: usize,
		row: u64,
		message: String,
	},

	#[error(transparent)]
	ResourceLifecycle(#[from] LifecycleViolation),

	#[error("undefined bind variable: {index}")]
	UndefinedBindVariable {
		index: usize,
	},

	#[error("bind variable {index} cannot be read as {expected}")]
	BindVariableType {
		index: usize,
		expected: &'static str,
	},

	#[error("column index {index} is out of bounds for a table with {count} columns")]
	ColumnOutOfBounds {
		index: usize,
		count: usize,
	},

	#[error("invalid filter: {reason}")]
	InvalidFilter {
		reason: String,
	},

	#[error("unknown column '{name}'")]
	UnknownColumn {
		name: String,
	},

	#[error("column '{name}' is not a {expected} column")]
	ColumnType {
		name: String,
		expected: &'static str,
	},

	#[error("invalid regex '{pattern}': {message}")]
	InvalidRegex {
		pattern: String,
		message: String,
	},

	#[error("column batch has {actual} rows in column {column}, expected {expected}")]
	RowCountMismatch {
		column: usize,
		expected: usize,
		actual: usize,
	},

	#[error("failed to spawn worker thread '{name}': {reason}")]
	WorkerSpawn {
		name: String,
		reason: String,
	},

	#[error("timestamp {timestamp} is earlier than the last stored timestamp {last}")]
	TimestampOrder {
		timestamp: i64,
		last: i64,
	},
}

/// Misuse of the dispatch/collect handshake. These are programming errors and
/// are reported immediately instead of being tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleViolation {
	#[error("frame {frame_index} of sequence {sequence_id} was already collected")]
	DoubleCollect {
		sequence_id: u64,
		frame_index: usize,
	},

	#[error("task for frame {frame_index} of sequence {sequence_id} was accessed before it was reduced")]
	NotReady {
		sequence_id: u64,
		frame_index: usize,
	},

	#[error("handle of sequence {handle_sequence_id} used with sequence {sequence_id}")]
	ForeignHandle {
		sequence_id: u64,
		handle_sequence_id: u64,
	},

	#[error("sequence {sequence_id} still has {in_flight} frames in flight")]
	InFlight {
		sequence_id: u64,
		in_flight: usize,
	},
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
	pub fn configuration(option: &'static str, reason: impl Into<String>) -> Self {
		Self::Configuration {
			option,
			reason: reason.into(),
		}
	}

	pub fn is_lifecycle(&self) -> bool {
		matches!(self, Self::ResourceLifecycle(_))
	}
}
