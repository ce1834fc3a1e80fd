//! Per-author text history and its persistence.
//!
//! - Line normalization (`normalizer`)
//! - Bounded FIFO buckets and author ids (`bucket`)
//! - The corpus map and its synchronized owner (`store`)
//! - Whole-corpus snapshots (`snapshot`)

/// Raw text to storable single line.
pub mod normalizer;

/// `AuthorId` and the bounded `AuthorBucket`.
pub mod bucket;

/// `Corpus` (add / remove / get / default dataset) and `CorpusStore`.
pub mod store;

/// JSON and postcard snapshot codec.
pub mod snapshot;

pub use bucket::{AuthorBucket, AuthorId};
pub use snapshot::SnapshotFormat;
pub use store::{Corpus, CorpusSettings, CorpusStore, DatasetPolicy};
