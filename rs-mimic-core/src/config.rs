use serde::{Deserialize, Serialize};

use crate::corpus::{CorpusSettings, DatasetPolicy};
use crate::error::{MimicError, Result};
use crate::model::generation_input::{DEFAULT_MAX_LENGTH, DEFAULT_MAX_TRIES};
use crate::model::{GenerationInput, NoveltyFilter};

/// Default per-author (and default dataset) capacity.
pub const DEFAULT_MAX_LIMIT: usize = 25_000;

/// Default chain order.
pub const DEFAULT_ORDER: usize = 2;

/// Settings the host hands to the corpus and the generator.
///
/// Deserializable from the `[chain]` table of a host config file; missing
/// keys take their defaults.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ChainConfig {
	pub max_limit: usize,
	pub order: usize,
	pub max_length: usize,
	pub max_tries: usize,
	pub min_length: usize,
	pub dataset_policy: DatasetPolicy,
	pub novelty: Option<NoveltyFilter>,
}

impl Default for ChainConfig {
	fn default() -> Self {
		Self {
			max_limit: DEFAULT_MAX_LIMIT,
			order: DEFAULT_ORDER,
			max_length: DEFAULT_MAX_LENGTH,
			max_tries: DEFAULT_MAX_TRIES,
			min_length: 0,
			dataset_policy: DatasetPolicy::default(),
			novelty: None,
		}
	}
}

impl ChainConfig {
	/// Checks every value at once, so a bad config fails at startup rather
	/// than on the first request.
	pub fn validate(&self) -> Result<()> {
		for (field, value) in [
			("max_limit", self.max_limit),
			("order", self.order),
			("max_length", self.max_length),
			("max_tries", self.max_tries),
		] {
			if value == 0 {
				return Err(MimicError::NonPositive { field });
			}
		}
		self.generation_input()?;
		Ok(())
	}

	pub fn corpus_settings(&self) -> Result<CorpusSettings> {
		CorpusSettings::new(self.max_limit, self.dataset_policy)
	}

	pub fn generation_input(&self) -> Result<GenerationInput> {
		let mut input = GenerationInput::new(self.max_length, self.max_tries)?;
		input.set_min_length(self.min_length)?;
		input.set_novelty(self.novelty)?;
		Ok(input)
	}
}
