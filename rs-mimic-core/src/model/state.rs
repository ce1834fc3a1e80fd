use std::collections::HashMap;
use std::fmt;

use rand::Rng;

use crate::error::{MimicError, Result};

/// One symbol of a training line as seen by the chain.
///
/// `Start` only appears in state keys (padding before the first word),
/// `End` only as a transition target (after the last word).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
	Start,
	Word(String),
	End,
}

impl Token {
	pub fn word(word: impl Into<String>) -> Self {
		Token::Word(word.into())
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Token::Start => f.write_str("<START>"),
			Token::Word(word) => f.write_str(word),
			Token::End => f.write_str("<END>"),
		}
	}
}

/// Represents a state in a chain model.
///
/// A `State` corresponds to a fixed window of `order` tokens (`key`) and
/// stores all observed transitions from this window to the next token.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate transition occurrences during learning
/// - Predict the next token using weighted random sampling
/// - Merge with another state having the same key (parallel learning support)
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct State {
	/// The window of preceding tokens.
	key: Vec<Token>,
	/// Outgoing transitions indexed by the next token.
	/// Example: { Word("c") => 1, Word("d") => 1, End => 3 }
	transitions: HashMap<Token, usize>,
}

impl State {
	/// Creates a new empty state for the given window.
	pub fn new(key: &[Token]) -> Self {
		Self {
			key: key.to_vec(),
			transitions: HashMap::new(),
		}
	}

	pub fn key(&self) -> &[Token] {
		&self.key
	}

	/// Records an occurrence of a transition toward `next`.
	pub fn add_transition(&mut self, next: Token) {
		*self.transitions.entry(next).or_insert(0) += 1;
	}

	/// Observed count of the transition toward `next` (0 if never seen).
	pub fn weight(&self, next: &Token) -> usize {
		self.transitions.get(next).copied().unwrap_or(0)
	}

	/// All possible next tokens with their counts.
	pub fn next_tokens(&self) -> impl Iterator<Item = (&Token, usize)> {
		self.transitions.iter().map(|(token, occurrence)| (token, *occurrence))
	}

	/// Predicts the next token using weighted random sampling.
	///
	/// The probability of selecting a token is proportional to its
	/// occurrence count.
	///
	/// Returns `None` if the state has no transitions.
	pub fn predict<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Token> {
		let total: usize = self.transitions.values().sum();
		if total == 0 {
			return None;
		}

		let mut r = rng.random_range(0..total);

		let mut fallback = None;
		for (next, occurrence) in &self.transitions {
			if r < *occurrence {
				return Some(next);
			}
			r -= occurrence;
			fallback = Some(next);
		}

		fallback
	}

	/// Merges another state into this one.
	///
	/// Both states must have the same key; transition counts are summed.
	///
	/// # Errors
	/// Returns an error if the state keys do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.key != other.key {
			return Err(MimicError::StateKeyMismatch);
		}

		for (next, occurrence) in &other.transitions {
			*self.transitions.entry(next.clone()).or_insert(0) += *occurrence;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn predict_follows_weights() {
		let mut state = State::new(&[Token::Start]);
		for _ in 0..3 {
			state.add_transition(Token::word("often"));
		}
		state.add_transition(Token::End);

		let mut rng = StdRng::seed_from_u64(7);
		let mut often = 0;
		for _ in 0..4000 {
			if state.predict(&mut rng) == Some(&Token::word("often")) {
				often += 1;
			}
		}
		// Expected 3000.
		assert!((2800..3200).contains(&often), "often = {often}");
	}

	#[test]
	fn empty_state_predicts_nothing() {
		let state = State::new(&[Token::Start]);
		assert_eq!(state.predict(&mut rand::rng()), None);
	}

	#[test]
	fn merge_sums_counts_and_checks_key() {
		let mut left = State::new(&[Token::word("a")]);
		left.add_transition(Token::word("b"));
		let mut right = State::new(&[Token::word("a")]);
		right.add_transition(Token::word("b"));
		right.add_transition(Token::End);

		left.merge(&right).unwrap();
		assert_eq!(left.weight(&Token::word("b")), 2);
		assert_eq!(left.weight(&Token::End), 1);

		let other = State::new(&[Token::word("z")]);
		assert!(matches!(left.merge(&other), Err(MimicError::StateKeyMismatch)));
	}
}
