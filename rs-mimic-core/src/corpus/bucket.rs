use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MimicError, Result};

/// Stable identifier of an author (string form of an integer identity).
///
/// Never empty: construction rejects blank input, including when the id
/// comes out of a snapshot.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct AuthorId(String);

impl AuthorId {
	/// Creates an id, trimming surrounding whitespace.
	///
	/// # Errors
	/// Returns [`MimicError::EmptyAuthorId`] for empty or blank input.
	pub fn new(id: impl Into<String>) -> Result<Self> {
		let id = id.into();
		let trimmed = id.trim();
		if trimmed.is_empty() {
			return Err(MimicError::EmptyAuthorId);
		}
		if trimmed.len() == id.len() {
			Ok(Self(id))
		} else {
			Ok(Self(trimmed.to_owned()))
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<u64> for AuthorId {
	fn from(id: u64) -> Self {
		Self(id.to_string())
	}
}

impl TryFrom<String> for AuthorId {
	type Error = MimicError;

	fn try_from(id: String) -> Result<Self> {
		Self::new(id)
	}
}

impl From<AuthorId> for String {
	fn from(id: AuthorId) -> Self {
		id.0
	}
}

impl std::str::FromStr for AuthorId {
	type Err = MimicError;

	fn from_str(s: &str) -> Result<Self> {
		Self::new(s)
	}
}

impl fmt::Display for AuthorId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Ordered, bounded history of one author's lines (oldest first).
///
/// Behaves as a FIFO queue: pushing past the limit evicts exactly the
/// oldest entry.
///
/// # Invariants
/// - Entries keep their insertion order
/// - `len() <= max_limit` after every `push` made with that limit
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct AuthorBucket {
	entries: VecDeque<String>,
}

impl AuthorBucket {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends `entry`; if that takes the bucket over `max_limit`, the
	/// oldest entry is evicted and returned.
	pub fn push(&mut self, entry: String, max_limit: usize) -> Option<String> {
		self.entries.push_back(entry);
		if self.entries.len() > max_limit {
			self.evict_oldest()
		} else {
			None
		}
	}

	/// Removes and returns the oldest entry.
	pub fn evict_oldest(&mut self) -> Option<String> {
		self.entries.pop_front()
	}

	/// Evicts oldest entries until at most `max_limit` remain.
	///
	/// Returns how many entries were dropped.
	pub(crate) fn truncate_oldest(&mut self, max_limit: usize) -> usize {
		let excess = self.entries.len().saturating_sub(max_limit);
		self.entries.drain(..excess);
		excess
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterates from oldest to newest.
	pub fn iter(&self) -> impl DoubleEndedIterator<Item = &String> + ExactSizeIterator {
		self.entries.iter()
	}

	pub fn to_vec(&self) -> Vec<String> {
		self.entries.iter().cloned().collect()
	}

	pub fn into_vec(self) -> Vec<String> {
		self.entries.into()
	}
}

impl FromIterator<String> for AuthorBucket {
	fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
		Self { entries: iter.into_iter().collect() }
	}
}
