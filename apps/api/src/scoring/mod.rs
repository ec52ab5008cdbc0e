// Scoring Engine: relevance = keyword relevance (semantic similarity),
// readability (Flesch) and user-profile fit, fused with fixed weights.
// Pure apart from the embedding capability; no LLM calls here.

pub mod embeddings;
pub mod engine;
pub mod readability;

pub use embeddings::{Embedder, FastEmbedder, HttpEmbedder};
pub use engine::ScoringEngine;
pub use readability::FleschReadability;
