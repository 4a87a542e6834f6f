// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

/// Deterministic generator for test data. Two instances built from the same
/// seeds produce the same stream.
#[derive(Debug, Clone)]
pub struct Rnd {
	s0: u64,
	s1: u64,
}

impl Default for Rnd {
	fn default() -> Self {
		Self::new(0xdead_beef, 0xdead_beef)
	}
}

impl Rnd {
	pub fn new(s0: u64, s1: u64) -> Self {
		Self {
			s0,
			s1,
		}
	}

	/// xorshift128+
	pub fn next_u64(&mut self) -> u64 {
		let mut s1 = self.s0;
		let s0 = self.s1;
		self.s0 = s0;
		s1 ^= s1 << 23;
		self.s1 = s1 ^ s0 ^ (s1 >> 17) ^ (s0 >> 26);
		self.s1.wrapping_add(s0)
	}

	/// Uniform in `[0, 1)`.
	pub fn next_f64(&mut self) -> f64 {
		(self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
	}

	pub fn next_i64(&mut self) -> i64 {
		self.next_u64() as i64
	}

	/// Uniform in `[0, bound)`. `bound` must be positive.
	pub fn next_below(&mut self, bound: usize) -> usize {
		(self.next_u64() % bound as u64) as usize
	}

	pub fn pick<'a>(&mut self, values: &[&'a str]) -> &'a str {
		values[self.next_below(values.len())]
	}
}
