use log::{debug, trace};
use rand::Rng;

use super::chain_model::ChainModel;
use super::generation_input::GenerationInput;
use crate::error::Result;

/// No attempt produced an acceptable line.
///
/// This is an expected outcome, not a fault: the caller decides what to
/// show instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no line of at most {max_length} characters after {attempts} attempts")]
pub struct GenerationExhausted {
	/// Walks performed; always the configured `max_tries`.
	pub attempts: usize,
	pub max_length: usize,
}

/// Length-constrained line generator.
///
/// # Responsibilities
/// - Walk a `ChainModel` repeatedly, up to `max_tries` times
/// - Accept the first candidate within the length bounds (and novel
///   enough, when a novelty filter is set)
/// - Never return a candidate longer than `max_length`
#[derive(Debug, Clone, Default)]
pub struct Generator {
	input: GenerationInput,
}

impl Generator {
	pub fn new(input: GenerationInput) -> Self {
		Self { input }
	}

	pub fn input(&self) -> &GenerationInput {
		&self.input
	}

	/// Builds the model this generator walks.
	///
	/// The training text is kept only when a novelty filter is set.
	pub fn build_model<S: AsRef<str> + Sync>(&self, order: usize, lines: &[S]) -> Result<ChainModel> {
		if self.input.novelty().is_some() {
			ChainModel::build_with_source(order, lines)
		} else {
			ChainModel::build(order, lines)
		}
	}

	/// Generates a line using the thread-local RNG.
	pub fn generate(&self, model: &ChainModel) -> Result<String, GenerationExhausted> {
		self.generate_with(model, &mut rand::rng())
	}

	/// Generates a line using `rng`.
	///
	/// # Behavior
	/// - Each attempt walks from the start state until END or a dead end.
	/// - A walk is abandoned as soon as it passes `max_length` characters.
	/// - Candidates shorter than `min_length`, or rejected by the novelty
	///   filter, are discarded. The filter only sees models that kept their
	///   source text (see [`build_model`](Self::build_model)).
	///
	/// # Notes
	/// - A model built from no data yields `""` on the first attempt.
	pub fn generate_with<R: Rng + ?Sized>(&self, model: &ChainModel, rng: &mut R) -> Result<String, GenerationExhausted> {
		let max_length = self.input.max_length();
		let mut attempts = 0;

		while attempts < self.input.max_tries() {
			attempts += 1;

			let Some(candidate) = model.walk_within(&mut *rng, max_length) else {
				trace!("Attempt {attempts}: longer than {max_length} characters");
				continue;
			};

			if candidate.chars().count() < self.input.min_length() {
				trace!("Attempt {attempts}: shorter than {} characters", self.input.min_length());
				continue;
			}

			if let (Some(novelty), Some(source)) = (self.input.novelty(), model.source()) {
				let words: Vec<&str> = candidate.split(' ').filter(|w| !w.is_empty()).collect();
				if novelty.rejects(&words, source) {
					trace!("Attempt {attempts}: too close to the training data");
					continue;
				}
			}

			debug!("Generated a {}-character line in {attempts} attempts", candidate.chars().count());
			return Ok(candidate);
		}

		debug!("Gave up after {attempts} attempts");
		Err(GenerationExhausted { attempts, max_length })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::generation_input::NoveltyFilter;

	fn generator(max_length: usize, max_tries: usize) -> Generator {
		Generator::new(GenerationInput::new(max_length, max_tries).unwrap())
	}

	#[test]
	fn empty_model_yields_empty_line() {
		let model = ChainModel::build::<String>(2, &[]).unwrap();
		assert_eq!(generator(0, 1).generate(&model), Ok(String::new()));
		assert_eq!(generator(200, 100).generate(&model), Ok(String::new()));
	}

	#[test]
	fn only_long_candidates_exhaust_tries() {
		let model = ChainModel::build(2, &["abcdefghij klmnop", "qrstuvwxyz abcdef"]).unwrap();
		let result = generator(5, 17).generate(&model);
		assert_eq!(result, Err(GenerationExhausted { attempts: 17, max_length: 5 }));
	}

	#[test]
	fn never_exceeds_max_length() {
		let model = ChainModel::build(1, &["a b c d e f", "b a", "c", "e e e e e e e e e"]).unwrap();
		let generator = generator(7, 100);
		for _ in 0..500 {
			if let Ok(line) = generator.generate(&model) {
				assert!(line.chars().count() <= 7, "{line:?}");
			}
		}
	}

	#[test]
	fn min_length_discards_short_lines() {
		let model = ChainModel::build(2, &["hi"]).unwrap();
		let mut input = GenerationInput::new(10, 3).unwrap();
		input.set_min_length(3).unwrap();

		let result = Generator::new(input).generate(&model);
		assert_eq!(result, Err(GenerationExhausted { attempts: 3, max_length: 10 }));
	}

	#[test]
	fn novelty_filter_rejects_verbatim_lines() {
		// Only one possible walk, identical to the training line.
		let lines = ["one two three four"];
		let mut input = GenerationInput::new(100, 4).unwrap();
		let plain = Generator::new(input);
		let model = plain.build_model(2, &lines).unwrap();
		assert_eq!(model.source(), None);
		assert_eq!(plain.generate(&model), Ok("one two three four".to_owned()));

		input.set_novelty(Some(NoveltyFilter::default())).unwrap();
		let filtered = Generator::new(input);
		let model = filtered.build_model(2, &lines).unwrap();
		assert_eq!(model.source(), Some("one two three four"));
		assert!(filtered.generate(&model).is_err());
	}

	#[test]
	fn novelty_filter_accepts_empty_line() {
		let mut input = GenerationInput::default();
		input.set_novelty(Some(NoveltyFilter::default())).unwrap();
		let generator = Generator::new(input);
		let model = generator.build_model::<String>(2, &[]).unwrap();
		assert_eq!(generator.generate(&model), Ok(String::new()));
	}
}
