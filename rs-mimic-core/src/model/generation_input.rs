use serde::{Deserialize, Serialize};

use crate::error::{MimicError, Result};

/// Default cap on the rendered length of a generated line, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 200;

/// Default number of walks tried before giving up.
pub const DEFAULT_MAX_TRIES: usize = 100;

/// Optional rejection of candidates that copy their training data.
///
/// A candidate of `w` words is rejected when any run of
/// `min(max_overlap_total, round(max_overlap_ratio * w))` consecutive words,
/// joined by spaces, occurs anywhere in the training text. The match is a
/// plain substring search: it may start or end inside a word and may span
/// two training lines.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct NoveltyFilter {
	max_overlap_ratio: f32,
	max_overlap_total: usize,
}

impl Default for NoveltyFilter {
	fn default() -> Self {
		Self { max_overlap_ratio: 0.7, max_overlap_total: 15 }
	}
}

impl NoveltyFilter {
	/// # Errors
	/// Returns an error if `max_overlap_ratio` is outside `0.0..=1.0` or
	/// `max_overlap_total` is zero.
	pub fn new(max_overlap_ratio: f32, max_overlap_total: usize) -> Result<Self> {
		let filter = Self { max_overlap_ratio, max_overlap_total };
		filter.validate()?;
		Ok(filter)
	}

	pub fn validate(&self) -> Result<()> {
		if !(0.0..=1.0).contains(&self.max_overlap_ratio) {
			return Err(MimicError::InvalidOverlapRatio(self.max_overlap_ratio));
		}
		if self.max_overlap_total == 0 {
			return Err(MimicError::NonPositive { field: "max_overlap_total" });
		}
		Ok(())
	}

	pub fn max_overlap_ratio(&self) -> f32 {
		self.max_overlap_ratio
	}

	pub fn max_overlap_total(&self) -> usize {
		self.max_overlap_total
	}

	/// `true` if `words` shares too long a run with `source`.
	pub(crate) fn rejects(&self, words: &[&str], source: &str) -> bool {
		if words.is_empty() {
			return false;
		}

		let by_ratio = (self.max_overlap_ratio * words.len() as f32).round() as usize;
		let overlap_max = self.max_overlap_total.min(by_ratio).clamp(1, words.len());
		let gram_count = (words.len() - overlap_max).max(1);

		(0..gram_count)
			.map(|i| &words[i..i + overlap_max])
			.any(|gram| source.contains(gram.join(" ").as_str()))
	}
}

/// Parameters of one generation request.
///
/// # Invariants
/// - `max_tries >= 1`
/// - `min_length <= max_length`
/// - `novelty`, when set, has been validated
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationInput {
	max_length: usize,
	max_tries: usize,
	min_length: usize,
	novelty: Option<NoveltyFilter>,
}

impl Default for GenerationInput {
	fn default() -> Self {
		Self {
			max_length: DEFAULT_MAX_LENGTH,
			max_tries: DEFAULT_MAX_TRIES,
			min_length: 0,
			novelty: None,
		}
	}
}

impl GenerationInput {
	/// # Errors
	/// Returns an error if `max_tries` is zero.
	pub fn new(max_length: usize, max_tries: usize) -> Result<Self> {
		if max_tries == 0 {
			return Err(MimicError::NonPositive { field: "max_tries" });
		}
		Ok(Self { max_length, max_tries, ..Self::default() })
	}

	pub fn max_length(&self) -> usize {
		self.max_length
	}

	pub fn max_tries(&self) -> usize {
		self.max_tries
	}

	pub fn min_length(&self) -> usize {
		self.min_length
	}

	pub fn novelty(&self) -> Option<&NoveltyFilter> {
		self.novelty.as_ref()
	}

	/// Sets the shortest accepted candidate, in characters.
	///
	/// # Errors
	/// Returns an error if `min_length` is greater than `max_length`.
	pub fn set_min_length(&mut self, min_length: usize) -> Result<()> {
		if min_length > self.max_length {
			return Err(MimicError::MinLengthAboveMax { min_length, max_length: self.max_length });
		}
		self.min_length = min_length;
		Ok(())
	}

	/// Enables (or disables with `None`) the novelty filter.
	pub fn set_novelty(&mut self, novelty: Option<NoveltyFilter>) -> Result<()> {
		if let Some(filter) = &novelty {
			filter.validate()?;
		}
		self.novelty = novelty;
		Ok(())
	}
}
