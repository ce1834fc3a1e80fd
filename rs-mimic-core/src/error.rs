use std::io;
use std::path::PathBuf;

/// Errors raised by the corpus, the chain model and the persistence layer.
///
/// Generation running out of tries is not part of this enum: it is an
/// expected outcome and is reported through
/// [`GenerationExhausted`](crate::model::generator::GenerationExhausted).
#[derive(Debug, thiserror::Error)]
pub enum MimicError {
	#[error("author id cannot be empty")]
	EmptyAuthorId,

	#[error("{field} must be a positive integer")]
	NonPositive { field: &'static str },

	#[error("min_length {min_length} is greater than max_length {max_length}")]
	MinLengthAboveMax { min_length: usize, max_length: usize },

	#[error("overlap ratio must be between 0.0 and 1.0, got {0}")]
	InvalidOverlapRatio(f32),

	#[error("order mismatch: {left} != {right}")]
	OrderMismatch { left: usize, right: usize },

	#[error("state key mismatch")]
	StateKeyMismatch,

	#[error("failed to access snapshot {}: {source}", .path.display())]
	SnapshotIo {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("malformed snapshot {}: {message}", .path.display())]
	SnapshotParse { path: PathBuf, message: String },

	#[error("failed to decode snapshot: {0}")]
	SnapshotDecode(String),

	#[error("failed to encode snapshot: {0}")]
	SnapshotEncode(String),

	#[error("failed to read config {}: {source}", .path.display())]
	ConfigIo {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("malformed config {}: {message}", .path.display())]
	ConfigParse { path: PathBuf, message: String },
}

pub type Result<T, E = MimicError> = std::result::Result<T, E>;
