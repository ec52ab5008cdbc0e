// Completion Service: task-specific prompts over the text-completion client.
// Every call is retried with backoff, bounded per attempt, and parsed into a typed shape.

pub mod prompts;
pub mod service;
pub mod usage;

pub use service::{
    CompletionError, CompletionService, DraftQuality, KeywordRecommendationInput,
    SentimentMetrics,
};
pub use usage::TokenUsage;
