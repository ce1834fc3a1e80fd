use std::collections::{HashMap, VecDeque};
use std::iter;
use std::sync::mpsc;
use std::thread;

use log::debug;
use rand::Rng;

use super::state::{State, Token};
use crate::error::{MimicError, Result};

/// Datasets at least this long are built on several threads.
const PARALLEL_THRESHOLD: usize = 4096;

/// Chunks per CPU for the parallel build.
const CHUNK_FACTOR: usize = 8;

/// Word-level Markov chain compiled from training lines.
///
/// Each state is the window of the `order` tokens preceding a word. Lines
/// are padded with `order` [`Token::Start`] so that short lines still
/// contribute, and every line ends with a transition to [`Token::End`].
///
/// # Responsibilities
/// - Build the transition table from lines (sequentially or in parallel)
/// - Expose the possible next tokens of a state with their weights
/// - Walk the chain to produce one candidate line
/// - Merge with another model of the same order
///
/// # Invariants
/// - `order` is always >= 1
/// - Every state key holds exactly `order` tokens
/// - All transition counts are >= 1
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainModel {
	order: usize,
	states: HashMap<Vec<Token>, State>,
	/// Training lines rejoined into one text, kept only on request.
	source: Option<String>,
}

impl ChainModel {
	/// Creates an empty model of the given order.
	///
	/// # Errors
	/// Returns an error if `order` is 0.
	pub fn new(order: usize) -> Result<Self> {
		if order == 0 {
			return Err(MimicError::NonPositive { field: "order" });
		}
		Ok(Self::empty(order))
	}

	fn empty(order: usize) -> Self {
		Self { order, states: HashMap::new(), source: None }
	}

	/// Compiles `lines` (one training line each) into a model.
	///
	/// Large datasets are split into chunks learned on separate threads and
	/// merged afterwards; the resulting model is the same either way.
	pub fn build<S: AsRef<str> + Sync>(order: usize, lines: &[S]) -> Result<Self> {
		let model = if lines.len() >= PARALLEL_THRESHOLD {
			Self::build_parallel(order, lines)?
		} else {
			let mut model = Self::new(order)?;
			for line in lines {
				model.add_line(line.as_ref());
			}
			model
		};

		debug!("Built order-{order} chain: {} lines, {} states", lines.len(), model.states.len());
		Ok(model)
	}

	/// Like [`build`](Self::build), but also keeps the training text so
	/// candidates can be compared against it.
	///
	/// Each line's words are rejoined with single spaces and the lines are
	/// joined with a space, in dataset order. Empty lines are skipped.
	pub fn build_with_source<S: AsRef<str> + Sync>(order: usize, lines: &[S]) -> Result<Self> {
		let mut model = Self::build(order, lines)?;
		let source: Vec<String> = lines
			.iter()
			.map(|line| line.as_ref().split_whitespace().collect::<Vec<_>>().join(" "))
			.filter(|line| !line.is_empty())
			.collect();
		model.source = Some(source.join(" "));
		Ok(model)
	}

	/// Splits the lines into chunks (CPU cores * factor), learns a partial
	/// model per chunk on its own thread and merges the partial models in
	/// chunk order.
	fn build_parallel<S: AsRef<str> + Sync>(order: usize, lines: &[S]) -> Result<Self> {
		let mut model = Self::new(order)?;
		let chunks = num_cpus::get() * CHUNK_FACTOR;
		let chunk_size = lines.len().div_ceil(chunks).max(1);

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| {
			for (index, chunk) in lines.chunks(chunk_size).enumerate() {
				let tx = tx.clone();
				scope.spawn(move || {
					let mut partial = Self::empty(order);
					for line in chunk {
						partial.add_line(line.as_ref());
					}
					// The receiver outlives the scope.
					let _ = tx.send((index, partial));
				});
			}
		});
		drop(tx);

		let mut partials: Vec<(usize, ChainModel)> = rx.iter().collect();
		partials.sort_by_key(|(index, _)| *index);
		for (_, partial) in &partials {
			model.merge(partial)?;
		}

		Ok(model)
	}

	/// Adds one training line.
	///
	/// The line is split on whitespace; no line is rejected, including empty
	/// ones (they only record `START.. -> END`).
	pub fn add_line(&mut self, line: &str) {
		let words: Vec<&str> = line.split_whitespace().collect();
		let mut window: VecDeque<Token> = iter::repeat_n(Token::Start, self.order).collect();

		for word in &words {
			let next = Token::word(*word);
			self.record(window.make_contiguous(), next.clone());
			window.pop_front();
			window.push_back(next);
		}
		self.record(window.make_contiguous(), Token::End);
	}

	fn record(&mut self, key: &[Token], next: Token) {
		match self.states.get_mut(key) {
			Some(state) => state.add_transition(next),
			None => {
				let mut state = State::new(key);
				state.add_transition(next);
				self.states.insert(key.to_vec(), state);
			}
		}
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// `true` when nothing was learned (built from an empty dataset).
	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	pub fn state_count(&self) -> usize {
		self.states.len()
	}

	/// The state every walk starts from: `order` START tokens.
	pub fn start_state(&self) -> Vec<Token> {
		vec![Token::Start; self.order]
	}

	/// Outgoing transitions of `key`, or `None` for a never-observed state
	/// (a dead end, treated as END when walking).
	pub fn transitions(&self, key: &[Token]) -> Option<&State> {
		self.states.get(key)
	}

	/// Rejoined training text, if the model was built with
	/// [`build_with_source`](Self::build_with_source).
	pub fn source(&self) -> Option<&str> {
		self.source.as_deref()
	}

	/// Walks the chain once from the start state and renders the words
	/// joined by single spaces.
	pub fn walk<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
		self.walk_within(rng, usize::MAX).unwrap_or_default()
	}

	/// Like [`walk`](Self::walk), but gives up and returns `None` as soon as
	/// the rendered text would exceed `max_length` characters.
	pub fn walk_within<R: Rng + ?Sized>(&self, rng: &mut R, max_length: usize) -> Option<String> {
		let mut window: VecDeque<Token> = iter::repeat_n(Token::Start, self.order).collect();
		let mut words: Vec<&str> = Vec::new();
		let mut length = 0usize;

		loop {
			let next = self
				.states
				.get(&*window.make_contiguous())
				.and_then(|state| state.predict(&mut *rng));

			let word = match next {
				Some(Token::Word(word)) => word,
				// END, or a dead end
				_ => break,
			};

			length = length
				.saturating_add(word.chars().count())
				.saturating_add(usize::from(!words.is_empty()));
			if length > max_length {
				return None;
			}

			words.push(word);
			window.pop_front();
			window.push_back(Token::Word(word.clone()));
		}

		Some(words.join(" "))
	}

	/// Merges another chain model into this one.
	///
	/// # Notes
	/// - Both models must have the same order.
	/// - Counts of matching states and transitions are summed.
	/// - The source text of `other`, if kept, is appended.
	///
	/// # Errors
	/// Returns an error if the model orders do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.order != other.order {
			return Err(MimicError::OrderMismatch { left: self.order, right: other.order });
		}

		for (key, state) in &other.states {
			if let Some(existing) = self.states.get_mut(key) {
				existing.merge(state)?;
			} else {
				self.states.insert(key.clone(), state.clone());
			}
		}
		if let Some(more) = other.source.as_deref().filter(|more| !more.is_empty()) {
			let text = self.source.get_or_insert_with(String::new);
			if !text.is_empty() {
				text.push(' ');
			}
			text.push_str(more);
		}

		Ok(())
	}
}
