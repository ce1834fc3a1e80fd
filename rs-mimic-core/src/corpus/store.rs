use std::path::Path;
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::bucket::{AuthorBucket, AuthorId};
use super::normalizer::normalize;
use super::snapshot::{self, SnapshotFormat};
use crate::error::{MimicError, Result};

/// Which entries survive when the aggregate dataset is over the limit.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DatasetPolicy {
	/// Keep the first `max_limit` entries of the concatenation.
	#[default]
	KeepOldest,
	/// Keep the last `max_limit` entries of the concatenation.
	KeepNewest,
}

/// Capacity settings shared by every bucket and the default dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CorpusSettings {
	max_limit: usize,
	dataset_policy: DatasetPolicy,
}

impl CorpusSettings {
	/// # Errors
	/// Returns an error if `max_limit` is zero.
	pub fn new(max_limit: usize, dataset_policy: DatasetPolicy) -> Result<Self> {
		if max_limit == 0 {
			return Err(MimicError::NonPositive { field: "max_limit" });
		}
		Ok(Self { max_limit, dataset_policy })
	}

	pub fn max_limit(&self) -> usize {
		self.max_limit
	}

	pub fn dataset_policy(&self) -> DatasetPolicy {
		self.dataset_policy
	}
}

/// Per-author text history.
///
/// Maps each [`AuthorId`] to its [`AuthorBucket`]. The map keeps author
/// insertion order, which is the order used to build the default dataset
/// and the order written to snapshots.
///
/// # Invariants
/// - Only authors with at least one entry have a key
/// - Every bucket holds at most `max_limit` entries
/// - The default dataset holds at most `max_limit` entries
#[derive(Clone, Debug)]
pub struct Corpus {
	buckets: IndexMap<AuthorId, AuthorBucket>,
	settings: CorpusSettings,
}

impl Corpus {
	/// Creates an empty corpus.
	pub fn new(settings: CorpusSettings) -> Self {
		Self { buckets: IndexMap::new(), settings }
	}

	/// Builds a corpus from decoded buckets.
	///
	/// Empty buckets are dropped and buckets over the limit keep their
	/// newest `max_limit` entries, so the invariants hold whatever limit
	/// the data was written under.
	pub fn from_buckets(buckets: IndexMap<AuthorId, AuthorBucket>, settings: CorpusSettings) -> Self {
		let mut corpus = Self::new(settings);
		for (author, mut bucket) in buckets {
			if bucket.is_empty() {
				warn!("Dropping empty bucket for author {author}");
				continue;
			}
			let dropped = bucket.truncate_oldest(settings.max_limit);
			if dropped > 0 {
				warn!("Evicted {dropped} entries of author {author} over the limit of {}", settings.max_limit);
			}
			corpus.buckets.insert(author, bucket);
		}
		corpus
	}

	/// Normalizes `text` and appends it to the author's bucket.
	///
	/// Creates the bucket if needed; evicts the oldest entry when the bucket
	/// goes over the limit. Empty text is stored too.
	pub fn add(&mut self, author: &AuthorId, text: &str) {
		let entry = normalize(text);
		let max_limit = self.settings.max_limit;
		let bucket = self.buckets.entry(author.clone()).or_default();
		if bucket.push(entry, max_limit).is_some() {
			debug!("Evicted oldest entry of author {author}");
		}
	}

	/// Deletes the author's bucket and returns its entries (oldest first).
	///
	/// Unknown authors give an empty vector. The order of the remaining
	/// authors is preserved.
	pub fn remove(&mut self, author: &AuthorId) -> Vec<String> {
		self.buckets
			.shift_remove(author)
			.map(AuthorBucket::into_vec)
			.unwrap_or_default()
	}

	/// Returns the author's entries, or the default dataset for an author
	/// without a bucket.
	pub fn get(&self, author: &AuthorId) -> Vec<String> {
		match self.buckets.get(author) {
			Some(bucket) => bucket.to_vec(),
			None => self.default_dataset(),
		}
	}

	/// Concatenation of every bucket in author order, capped at `max_limit`
	/// according to the dataset policy. Computed on every call.
	pub fn default_dataset(&self) -> Vec<String> {
		let all = self.buckets.values().flat_map(AuthorBucket::iter);
		let max_limit = self.settings.max_limit;
		match self.settings.dataset_policy {
			DatasetPolicy::KeepOldest => all.take(max_limit).cloned().collect(),
			DatasetPolicy::KeepNewest => {
				let skip = self.total_entries().saturating_sub(max_limit);
				all.skip(skip).cloned().collect()
			}
		}
	}

	/// Read-only view of one author's bucket.
	pub fn bucket(&self, author: &AuthorId) -> Option<&AuthorBucket> {
		self.buckets.get(author)
	}

	pub(crate) fn buckets(&self) -> &IndexMap<AuthorId, AuthorBucket> {
		&self.buckets
	}

	/// Authors with their entry counts, in insertion order.
	pub fn authors(&self) -> Vec<(AuthorId, usize)> {
		self.buckets
			.iter()
			.map(|(author, bucket)| (author.clone(), bucket.len()))
			.collect()
	}

	/// Number of authors.
	pub fn len(&self) -> usize {
		self.buckets.len()
	}

	pub fn is_empty(&self) -> bool {
		self.buckets.is_empty()
	}

	/// Number of entries across all authors.
	pub fn total_entries(&self) -> usize {
		self.buckets.values().map(AuthorBucket::len).sum()
	}
}

// Author order is part of the corpus, unlike `IndexMap` equality.
impl PartialEq for Corpus {
	fn eq(&self, other: &Self) -> bool {
		self.settings == other.settings && self.buckets.iter().eq(other.buckets.iter())
	}
}

impl Eq for Corpus {}

/// Shared owner of the [`Corpus`].
///
/// Mutations hold the write lock for their whole read-modify-write.
/// Reads copy what they need under the read lock and release it, so model
/// building and generation never run while the lock is held.
/// Saves run one at a time.
#[derive(Debug)]
pub struct CorpusStore {
	corpus: RwLock<Corpus>,
	saving: Mutex<()>,
}

impl CorpusStore {
	pub fn new(corpus: Corpus) -> Self {
		Self { corpus: RwLock::new(corpus), saving: Mutex::new(()) }
	}

	/// Loads the corpus from `path`, or starts empty when there is no file
	/// yet (an empty document is written in that case).
	///
	/// # Errors
	/// Fails if an existing snapshot cannot be read or parsed.
	pub fn open<P: AsRef<Path>>(path: P, format: SnapshotFormat, settings: CorpusSettings) -> Result<Self> {
		let buckets = snapshot::load_or_init(&path, format)?;
		let corpus = Corpus::from_buckets(buckets, settings);
		info!(
			"Loaded {} authors ({} entries) from {}",
			corpus.len(),
			corpus.total_entries(),
			path.as_ref().display()
		);
		Ok(Self::new(corpus))
	}

	// Every mutation leaves the corpus consistent, so a poisoned lock still
	// guards valid data.
	fn read(&self) -> RwLockReadGuard<'_, Corpus> {
		self.corpus.read().unwrap_or_else(PoisonError::into_inner)
	}

	fn write(&self) -> RwLockWriteGuard<'_, Corpus> {
		self.corpus.write().unwrap_or_else(PoisonError::into_inner)
	}

	/// See [`Corpus::add`].
	pub fn add(&self, author: &AuthorId, text: &str) {
		self.write().add(author, text);
	}

	/// See [`Corpus::remove`].
	pub fn remove(&self, author: &AuthorId) -> Vec<String> {
		let removed = self.write().remove(author);
		info!("Erased {} entries of author {author}", removed.len());
		removed
	}

	/// See [`Corpus::get`].
	pub fn get(&self, author: &AuthorId) -> Vec<String> {
		self.read().get(author)
	}

	/// See [`Corpus::default_dataset`].
	pub fn default_dataset(&self) -> Vec<String> {
		self.read().default_dataset()
	}

	/// See [`Corpus::authors`].
	pub fn authors(&self) -> Vec<(AuthorId, usize)> {
		self.read().authors()
	}

	/// Copy of the whole corpus.
	pub fn snapshot(&self) -> Corpus {
		self.read().clone()
	}

	/// Rewrites the snapshot at `path` from a consistent view of the corpus.
	///
	/// The corpus is copied under the read lock; encoding and the file write
	/// happen after it is released. Concurrent saves are serialized, so the
	/// last one to start is the one left on disk.
	pub fn save<P: AsRef<Path>>(&self, path: P, format: SnapshotFormat) -> Result<()> {
		let _saving = self.saving.lock().unwrap_or_else(PoisonError::into_inner);
		snapshot::save(&path, &self.snapshot(), format)?;
		info!("Saved corpus snapshot to {}", path.as_ref().display());
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;
	use std::thread;

	fn corpus(max_limit: usize, policy: DatasetPolicy) -> Corpus {
		Corpus::new(CorpusSettings::new(max_limit, policy).unwrap())
	}

	fn id(s: &str) -> AuthorId {
		AuthorId::new(s).unwrap()
	}

	#[test]
	fn add_keeps_most_recent_entries() {
		let mut corpus = corpus(3, DatasetPolicy::KeepOldest);
		let a = id("A");
		corpus.add(&a, "hello world");
		corpus.add(&a, "foo bar");
		corpus.add(&a, "baz qux");
		corpus.add(&a, "new one");

		assert_eq!(corpus.get(&a), vec!["foo bar", "baz qux", "new one"]);
	}

	#[test]
	fn add_normalizes_and_stores_empty_text() {
		let mut corpus = corpus(10, DatasetPolicy::KeepOldest);
		let a = id("A");
		corpus.add(&a, "two\nlines");
		corpus.add(&a, "");

		assert_eq!(corpus.get(&a), vec!["two lines", ""]);
	}

	#[test]
	fn remove_deletes_key_and_falls_back_to_default() {
		let mut corpus = corpus(10, DatasetPolicy::KeepOldest);
		corpus.add(&id("A"), "from a");
		corpus.add(&id("B"), "from b");

		assert_eq!(corpus.remove(&id("A")), vec!["from a"]);
		assert!(corpus.bucket(&id("A")).is_none());
		assert_eq!(corpus.get(&id("A")), vec!["from b"]);
		assert!(corpus.remove(&id("A")).is_empty());
	}

	#[test]
	fn unknown_author_gets_default_dataset() {
		let mut corpus = corpus(10, DatasetPolicy::KeepOldest);
		corpus.add(&id("A"), "a1");
		corpus.add(&id("B"), "b1");
		corpus.add(&id("A"), "a2");

		assert_eq!(corpus.get(&id("nobody")), vec!["a1", "a2", "b1"]);
	}

	#[test]
	fn default_dataset_policies() {
		let mut oldest = corpus(3, DatasetPolicy::KeepOldest);
		let mut newest = corpus(3, DatasetPolicy::KeepNewest);
		for corpus in [&mut oldest, &mut newest] {
			corpus.add(&id("A"), "a1");
			corpus.add(&id("A"), "a2");
			corpus.add(&id("B"), "b1");
			corpus.add(&id("B"), "b2");
		}

		assert_eq!(oldest.default_dataset(), vec!["a1", "a2", "b1"]);
		assert_eq!(newest.default_dataset(), vec!["a2", "b1", "b2"]);
	}

	#[test]
	fn removal_preserves_author_order() {
		let mut corpus = corpus(10, DatasetPolicy::KeepOldest);
		for name in ["A", "B", "C"] {
			corpus.add(&id(name), name);
		}
		corpus.remove(&id("A"));

		let authors: Vec<String> = corpus.authors().into_iter().map(|(a, _)| a.to_string()).collect();
		assert_eq!(authors, vec!["B", "C"]);
		assert_eq!(corpus.default_dataset(), vec!["B", "C"]);
	}

	#[test]
	fn from_buckets_repairs_invariants() {
		let mut buckets = IndexMap::new();
		buckets.insert(id("empty"), AuthorBucket::new());
		buckets.insert(id("big"), ["1", "2", "3"].into_iter().map(String::from).collect());

		let corpus = Corpus::from_buckets(buckets, CorpusSettings::new(2, DatasetPolicy::KeepOldest).unwrap());
		assert_eq!(corpus.len(), 1);
		assert_eq!(corpus.get(&id("big")), vec!["2", "3"]);
	}

	#[test]
	fn settings_reject_zero_limit() {
		assert!(matches!(
			CorpusSettings::new(0, DatasetPolicy::KeepOldest),
			Err(MimicError::NonPositive { field: "max_limit" })
		));
	}

	#[test]
	fn concurrent_adds_respect_limit() {
		let store = Arc::new(CorpusStore::new(corpus(50, DatasetPolicy::KeepOldest)));
		let author = id("shared");

		let handles: Vec<_> = (0..8)
			.map(|t| {
				let store = Arc::clone(&store);
				let author = author.clone();
				thread::spawn(move || {
					for i in 0..100 {
						store.add(&author, &format!("{t}-{i}"));
					}
				})
			})
			.collect();
		for handle in handles {
			handle.join().unwrap();
		}

		assert_eq!(store.get(&author).len(), 50);
		assert_eq!(store.authors(), vec![(author, 50)]);
	}

	#[test]
	fn concurrent_saves_all_succeed() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("corpus.json");
		let mut large = corpus(20_000, DatasetPolicy::KeepOldest);
		for i in 0..20_000 {
			large.add(&id(&(i % 40).to_string()), &format!("line number {i}"));
		}
		let store = Arc::new(CorpusStore::new(large));

		let handles: Vec<_> = (0..4)
			.map(|_| {
				let store = Arc::clone(&store);
				let path = path.clone();
				thread::spawn(move || (0..10).filter(|_| store.save(&path, SnapshotFormat::Json).is_err()).count())
			})
			.collect();
		let failures: usize = handles.into_iter().map(|handle| handle.join().unwrap()).sum();

		assert_eq!(failures, 0);
		let reopened = CorpusStore::open(&path, SnapshotFormat::Json, CorpusSettings::new(20_000, DatasetPolicy::KeepOldest).unwrap()).unwrap();
		assert_eq!(reopened.snapshot(), store.snapshot());
	}
}
