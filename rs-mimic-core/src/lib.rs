//! Per-author text mimicry library.
//!
//! This crate keeps a bounded history of short lines per author and
//! synthesizes new lines that statistically resemble them:
//! - Bounded, evicting per-author storage with an aggregate fallback dataset
//! - JSON / postcard snapshots of the whole corpus
//! - Word-level Markov chain models built from a dataset
//! - Length-constrained generation with a bounded retry budget

/// Per-author storage, normalization and snapshots.
pub mod corpus;

/// Chain models and generation logic.
pub mod model;

/// Settings consumed by the corpus and the generator.
pub mod config;

/// Error type shared by the crate.
pub mod error;

/// I/O utilities (file loading, atomic writes, path helpers).
pub mod io;

pub use config::ChainConfig;
pub use corpus::{AuthorId, Corpus, CorpusSettings, CorpusStore, DatasetPolicy, SnapshotFormat};
pub use error::{MimicError, Result};
pub use model::{ChainModel, GenerationExhausted, GenerationInput, Generator, NoveltyFilter};
