//! Top-level module for the text model and generation.
//!
//! This module provides a word-level Markov chain generator, including:
//! - Internal state management (`State`, `Token`)
//! - The compiled transition table (`ChainModel`)
//! - Generation configuration (`GenerationInput`, `NoveltyFilter`)
//! - A length-constrained generation interface (`Generator`)

/// Length-constrained generation with a bounded retry budget.
pub mod generator;

/// Word-level chain model (`order >= 1`).
///
/// Handles line ingestion, transition counting, random walks, and model
/// merging (parallel construction).
pub mod chain_model;

/// A single chain state (window of preceding tokens) and its weighted
/// transitions.
pub mod state;

/// Generation parameters: length bounds, retry budget, novelty filter.
pub mod generation_input;

pub use chain_model::ChainModel;
pub use generation_input::{GenerationInput, NoveltyFilter};
pub use generator::{GenerationExhausted, Generator};
pub use state::{State, Token};
