// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Cursor over the rows a page frame sequence reduces.

mod limit;

use std::{collections::VecDeque, sync::Arc};

pub use limit::Limit;
pub(crate) use limit::ResolvedLimit;
use strata_core::{PageFrameSource, Record, Result, RowId};
use tracing::{debug, instrument, warn};

use crate::sequence::{FrameHandle, PageFrameSequence, ScanOrder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
	Init,
	Scanning,
	LimitReached,
	Exhausted,
}

/// Yields matching row ids in scan order, applying the LIMIT policy.
///
/// Rows of a frame are copied out and the frame is collected before any of
/// them is yielded. With a positive limit the cursor stops requesting frames
/// once enough rows are buffered and drains whatever is still in flight.
/// With a negative limit every match is materialized before the first row is
/// yielded. Dropping the cursor drains the sequence.
pub struct FilteredCursor<'a> {
	sequence: &'a mut PageFrameSequence,
	source: Arc<dyn PageFrameSource>,
	limit: ResolvedLimit,
	state: CursorState,
	rows: VecDeque<RowId>,
	yielded: u64,
	matched: Option<u64>,
}

impl<'a> FilteredCursor<'a> {
	pub(crate) fn new(sequence: &'a mut PageFrameSequence, source: Arc<dyn PageFrameSource>, limit: ResolvedLimit) -> Self {
		Self {
			sequence,
			source,
			limit,
			state: CursorState::Init,
			rows: VecDeque::new(),
			yielded: 0,
			matched: None,
		}
	}

	pub fn state(&self) -> CursorState {
		self.state
	}

	pub fn record(&self, row_id: RowId) -> Option<Record<'_>> {
		self.source.record(row_id)
	}

	pub fn source(&self) -> &Arc<dyn PageFrameSource> {
		&self.source
	}

	/// Number of rows the cursor yields in total. Known only with a negative
	/// limit, where it is computed without iterating.
	pub fn size(&mut self) -> Result<Option<u64>> {
		let ResolvedLimit::Negative(n) = self.limit else {
			return Ok(None);
		};
		Ok(self.match_count()?.map(|matched| matched.min(n)))
	}

	/// Total number of matching rows, ignoring the limit. Known only with a
	/// negative limit.
	pub fn match_count(&mut self) -> Result<Option<u64>> {
		if let ResolvedLimit::Negative(_) = self.limit {
			if self.state == CursorState::Init {
				self.start()?;
			}
		}
		Ok(self.matched)
	}

	#[instrument(name = "engine::cursor::next", level = "trace", skip_all)]
	pub fn next_row(&mut self) -> Result<Option<RowId>> {
		loop {
			match self.state {
				CursorState::Init => self.start()?,
				CursorState::Scanning => {
					if let ResolvedLimit::Positive(n) = self.limit {
						if self.yielded >= n {
							self.sequence.await_completion();
							self.state = CursorState::LimitReached;
							debug!(limit = n, "limit reached");
							continue;
						}
					}
					if let Some(row) = self.rows.pop_front() {
						self.yielded += 1;
						return Ok(Some(row));
					}
					if matches!(self.limit, ResolvedLimit::Negative(_)) || !self.fill()? {
						self.state = CursorState::Exhausted;
					}
				}
				CursorState::LimitReached | CursorState::Exhausted => return Ok(None),
			}
		}
	}

	fn start(&mut self) -> Result<()> {
		self.state = CursorState::Scanning;
		let ResolvedLimit::Negative(n) = self.limit else {
			return Ok(());
		};

		while self.fill()? {}
		let matched = self.rows.len() as u64;
		let skip = matched.saturating_sub(n) as usize;
		self.rows.drain(..skip);
		self.matched = Some(matched);
		Ok(())
	}

	/// Buffers the rows of the next reduced frame. Returns `false` once the
	/// sequence is exhausted.
	fn fill(&mut self) -> Result<bool> {
		loop {
			if self.sequence.is_cancelled() {
				self.sequence.await_completion();
				return Ok(false);
			}

			if let Some(handle) = self.sequence.next() {
				if self.sequence.is_cancelled() {
					self.sequence.collect(handle, true)?;
					continue;
				}
				if let Err(err) = self.take_rows(handle) {
					self.sequence.await_completion();
					self.state = CursorState::Exhausted;
					return Err(err);
				}
				return Ok(true);
			}

			if self.sequence.is_exhausted() {
				return Ok(false);
			}
			self.sequence.wait_for_progress();
		}
	}

	fn take_rows(&mut self, handle: FrameHandle) -> Result<()> {
		let copied = match self.sequence.get_task(handle) {
			Ok(task) => {
				if self.sequence.order() == ScanOrder::Desc {
					self.rows.extend(task.rows().iter().rev());
				} else {
					self.rows.extend(task.rows());
				}
				Ok(())
			}
			Err(err) => Err(err),
		};
		match copied {
			Ok(()) => self.sequence.collect(handle, false),
			Err(err) => {
				if let Err(discard) = self.sequence.collect(handle, true) {
					warn!(
						sequence_id = self.sequence.id(),
						frame_index = handle.frame_index(),
						error = %discard,
						"failed to discard frame"
					);
				}
				Err(err)
			}
		}
	}
}

impl Iterator for FilteredCursor<'_> {
	type Item = Result<RowId>;

	fn next(&mut self) -> Option<Self::Item> {
		self.next_row().transpose()
	}
}

impl Drop for FilteredCursor<'_> {
	fn drop(&mut self) {
		self.sequence.await_completion();
	}
}
