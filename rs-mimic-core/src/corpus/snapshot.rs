//! Whole-corpus snapshots.
//!
//! A snapshot is a single document mapping author ids to their ordered
//! lines, in author insertion order:
//!
//! ```json
//! {
//!     "1234": [
//!         "hello world",
//!         "foo bar"
//!     ]
//! }
//! ```
//!
//! It is always written in full; there is no incremental format.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::info;
use serde::Serialize;

use super::bucket::{AuthorBucket, AuthorId};
use super::store::Corpus;
use crate::error::{MimicError, Result};
use crate::io::write_atomic;

/// Decoded snapshot contents.
pub type Buckets = IndexMap<AuthorId, AuthorBucket>;

/// Encoding used on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotFormat {
	/// Pretty-printed JSON document (4-space indent).
	Json,
	/// Compact `postcard` encoding of the same mapping.
	Postcard,
}

impl SnapshotFormat {
	/// Picks the format from the file extension: `.bin` is postcard,
	/// anything else JSON.
	pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
		match path.as_ref().extension().and_then(|ext| ext.to_str()) {
			Some("bin") => Self::Postcard,
			_ => Self::Json,
		}
	}

	fn empty_document(self) -> Result<Vec<u8>> {
		encode_buckets(&Buckets::new(), self)
	}
}

/// Serializes the whole corpus.
pub fn encode(corpus: &Corpus, format: SnapshotFormat) -> Result<Vec<u8>> {
	encode_buckets(corpus.buckets(), format)
}

fn encode_buckets(buckets: &Buckets, format: SnapshotFormat) -> Result<Vec<u8>> {
	match format {
		SnapshotFormat::Json => {
			let mut bytes = Vec::new();
			let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
			let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
			buckets
				.serialize(&mut serializer)
				.map_err(|e| MimicError::SnapshotEncode(e.to_string()))?;
			Ok(bytes)
		}
		SnapshotFormat::Postcard => {
			postcard::to_stdvec(buckets).map_err(|e| MimicError::SnapshotEncode(e.to_string()))
		}
	}
}

/// Parses snapshot bytes back into buckets.
///
/// Use [`Corpus::from_buckets`] to turn the result into a corpus.
pub fn decode(bytes: &[u8], format: SnapshotFormat) -> Result<Buckets> {
	match format {
		SnapshotFormat::Json => serde_json::from_slice(bytes).map_err(|e| MimicError::SnapshotDecode(e.to_string())),
		SnapshotFormat::Postcard => postcard::from_bytes(bytes).map_err(|e| MimicError::SnapshotDecode(e.to_string())),
	}
}

/// Reads the snapshot at `path`.
///
/// A missing file is the bootstrap state and yields empty buckets.
///
/// # Errors
/// - [`MimicError::SnapshotIo`] if the file exists but cannot be read
/// - [`MimicError::SnapshotParse`] if its content is not a valid snapshot
pub fn load<P: AsRef<Path>>(path: P, format: SnapshotFormat) -> Result<Buckets> {
	let path = path.as_ref();
	let bytes = match fs::read(path) {
		Ok(bytes) => bytes,
		Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Buckets::new()),
		Err(source) => return Err(MimicError::SnapshotIo { path: path.to_path_buf(), source }),
	};

	decode(&bytes, format).map_err(|e| MimicError::SnapshotParse {
		path: path.to_path_buf(),
		message: match e {
			MimicError::SnapshotDecode(message) => message,
			other => other.to_string(),
		},
	})
}

/// Like [`load`], but writes an empty document when the file is missing so
/// later saves and external tools find it in place.
pub fn load_or_init<P: AsRef<Path>>(path: P, format: SnapshotFormat) -> Result<Buckets> {
	let path = path.as_ref();
	if !path.exists() {
		write(path, &format.empty_document()?)?;
		info!("Created empty corpus snapshot at {}", path.display());
		return Ok(Buckets::new());
	}
	load(path, format)
}

/// Encodes `corpus` and replaces the file at `path` with it.
pub fn save<P: AsRef<Path>>(path: P, corpus: &Corpus, format: SnapshotFormat) -> Result<()> {
	write(path, &encode(corpus, format)?)
}

pub(crate) fn write<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<()> {
	let path = path.as_ref();
	write_atomic(path, bytes).map_err(|source| MimicError::SnapshotIo { path: PathBuf::from(path), source })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::corpus::store::{CorpusSettings, DatasetPolicy};

	fn settings() -> CorpusSettings {
		CorpusSettings::new(3, DatasetPolicy::KeepOldest).unwrap()
	}

	fn sample() -> Corpus {
		let mut corpus = Corpus::new(settings());
		for (author, text) in [("20", "zeta line"), ("3", "three"), ("20", "again"), ("100", "hundred")] {
			corpus.add(&AuthorId::new(author).unwrap(), text);
		}
		corpus
	}

	#[test]
	fn json_layout_keeps_insertion_order() {
		let bytes = encode(&sample(), SnapshotFormat::Json).unwrap();
		let text = String::from_utf8(bytes).unwrap();

		let expected = "{\n    \"20\": [\n        \"zeta line\",\n        \"again\"\n    ],\n    \"3\": [\n        \"three\"\n    ],\n    \"100\": [\n        \"hundred\"\n    ]\n}";
		assert_eq!(text, expected);
	}

	#[test]
	fn round_trip_both_formats() {
		let corpus = sample();
		for format in [SnapshotFormat::Json, SnapshotFormat::Postcard] {
			let bytes = encode(&corpus, format).unwrap();
			let decoded = Corpus::from_buckets(decode(&bytes, format).unwrap(), settings());
			assert_eq!(decoded, corpus);
		}
	}

	#[test]
	fn missing_file_is_empty() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("corpus.json");

		assert!(load(&path, SnapshotFormat::Json).unwrap().is_empty());
		assert!(!path.exists());
	}

	#[test]
	fn load_or_init_bootstraps_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("data").join("corpus.json");

		assert!(load_or_init(&path, SnapshotFormat::Json).unwrap().is_empty());
		assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
		assert!(load(&path, SnapshotFormat::Json).unwrap().is_empty());
	}

	#[test]
	fn malformed_snapshot_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("corpus.json");
		fs::write(&path, "{\"1\": [\"unterminated\"").unwrap();

		assert!(matches!(load(&path, SnapshotFormat::Json), Err(MimicError::SnapshotParse { .. })));
		assert!(matches!(load_or_init(&path, SnapshotFormat::Json), Err(MimicError::SnapshotParse { .. })));
	}

	#[test]
	fn empty_author_key_is_rejected() {
		assert!(decode(b"{\"\": [\"x\"]}", SnapshotFormat::Json).is_err());
	}

	#[test]
	fn save_then_load() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("corpus.bin");
		let format = SnapshotFormat::from_path(&path);
		assert_eq!(format, SnapshotFormat::Postcard);

		save(&path, &sample(), format).unwrap();
		let loaded = Corpus::from_buckets(load(&path, format).unwrap(), settings());
		assert_eq!(loaded, sample());
	}
}
