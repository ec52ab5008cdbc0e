//! Completion Service: turns an analysis task plus input text into a minimal
//! prompt, calls the text-completion client through the retry wrapper, and
//! parses the JSON reply into the task's shape.
//!
//! Retries cover the transport call only. A reply that is not valid JSON, or
//! that lacks a required key, is a `CompletionError::Parse` and is returned
//! to the caller without another attempt.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::completion::prompts::{
    DRAFT_ANALYSIS_PROMPT_TEMPLATE, KEYWORD_GENERATION_PROMPT_TEMPLATE,
    KEYWORD_RECOMMENDATION_PROMPT_TEMPLATE, SENTIMENT_PROMPT_TEMPLATE,
    TOPIC_EXTRACTION_PROMPT_TEMPLATE,
};
use crate::completion::usage::TokenUsage;
use crate::llm_client::{strip_json_fences, CompletionOptions, LlmError, TextCompletion};
use crate::models::ReadingLevel;
use crate::retry::{retry_with_backoff, RetryPolicy};

pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

// ────────────────────────────────────────────────────────────────────────────
// Tasks
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Sentiment,
    TopicExtraction,
    KeywordGeneration,
    KeywordRecommendation,
    DraftAnalysis,
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::Sentiment => "sentiment",
            Task::TopicExtraction => "topic_extraction",
            Task::KeywordGeneration => "keyword_generation",
            Task::KeywordRecommendation => "keyword_recommendation",
            Task::DraftAnalysis => "draft_analysis",
        }
    }

    /// Characters of input text kept before prompting.
    pub fn char_budget(&self) -> usize {
        match self {
            Task::Sentiment => 1000,
            Task::TopicExtraction
            | Task::KeywordGeneration
            | Task::KeywordRecommendation
            | Task::DraftAnalysis => 1500,
        }
    }

    fn max_tokens(&self) -> u32 {
        match self {
            Task::Sentiment => 50,
            Task::TopicExtraction | Task::KeywordGeneration => 100,
            Task::KeywordRecommendation => 150,
            Task::DraftAnalysis => 200,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors and response shapes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CompletionError {
    /// The upstream call failed on every allowed attempt.
    #[error("{task} call failed: {source}")]
    Transport {
        task: &'static str,
        #[source]
        source: LlmError,
    },

    #[error("{task} response could not be parsed: {message}")]
    Parse { task: &'static str, message: String },
}

impl CompletionError {
    fn parse(task: Task, message: impl ToString) -> Self {
        CompletionError::Parse {
            task: task.name(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentMetrics {
    /// -1.0 (negative) to 1.0 (positive)
    pub polarity: f64,
    /// 0.0 (objective) to 1.0 (subjective)
    pub subjectivity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftQuality {
    pub quality_score: f64,
    pub structure_notes: String,
    #[serde(default)]
    pub improvement_areas: Vec<String>,
}

/// Inputs for the context-aware keyword recommendation task.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRecommendationInput<'a> {
    pub draft_text: &'a str,
    pub cursor_context: Option<&'a str>,
    pub key_topics: &'a [String],
    pub preferred_topics: &'a [String],
    pub reading_level: ReadingLevel,
}

// ────────────────────────────────────────────────────────────────────────────
// Service
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct CompletionService {
    llm: Arc<dyn TextCompletion>,
    retry: RetryPolicy,
    attempt_timeout: Duration,
}

impl CompletionService {
    pub fn new(llm: Arc<dyn TextCompletion>, retry: RetryPolicy, attempt_timeout: Duration) -> Self {
        Self {
            llm,
            retry,
            attempt_timeout,
        }
    }

    pub async fn analyze_sentiment(
        &self,
        text: &str,
        tokens: &mut TokenUsage,
    ) -> Result<SentimentMetrics, CompletionError> {
        let task = Task::Sentiment;
        let prompt = SENTIMENT_PROMPT_TEMPLATE.replace("{text}", truncate_chars(text, task.char_budget()));
        let reply = self.invoke(task, &prompt, tokens).await?;
        let sentiment: SentimentMetrics = parse_object(task, &reply)?;
        Ok(SentimentMetrics {
            polarity: clamp_finite(sentiment.polarity, -1.0, 1.0),
            subjectivity: clamp_finite(sentiment.subjectivity, 0.0, 1.0),
        })
    }

    pub async fn extract_topics(
        &self,
        text: &str,
        tokens: &mut TokenUsage,
    ) -> Result<Vec<String>, CompletionError> {
        let task = Task::TopicExtraction;
        let prompt =
            TOPIC_EXTRACTION_PROMPT_TEMPLATE.replace("{text}", truncate_chars(text, task.char_budget()));
        let reply = self.invoke(task, &prompt, tokens).await?;
        parse_list(task, &reply)
    }

    pub async fn generate_initial_keywords(
        &self,
        text: &str,
        tokens: &mut TokenUsage,
    ) -> Result<Vec<String>, CompletionError> {
        let task = Task::KeywordGeneration;
        let prompt = KEYWORD_GENERATION_PROMPT_TEMPLATE
            .replace("{text}", truncate_chars(text, task.char_budget()));
        let reply = self.invoke(task, &prompt, tokens).await?;
        parse_list(task, &reply)
    }

    pub async fn recommend_keywords(
        &self,
        input: KeywordRecommendationInput<'_>,
        tokens: &mut TokenUsage,
    ) -> Result<Vec<String>, CompletionError> {
        let task = Task::KeywordRecommendation;
        let prompt = build_recommendation_prompt(input);
        let reply = self.invoke(task, &prompt, tokens).await?;
        parse_list(task, &reply)
    }

    pub async fn analyze_draft(
        &self,
        draft_text: &str,
        tokens: &mut TokenUsage,
    ) -> Result<DraftQuality, CompletionError> {
        let task = Task::DraftAnalysis;
        let prompt = DRAFT_ANALYSIS_PROMPT_TEMPLATE
            .replace("{draft_text}", truncate_chars(draft_text, task.char_budget()));
        let reply = self.invoke(task, &prompt, tokens).await?;
        let mut quality: DraftQuality = parse_object(task, &reply)?;
        quality.quality_score = clamp_finite(quality.quality_score, 0.0, 1.0);
        quality.improvement_areas = normalize_terms(quality.improvement_areas);
        Ok(quality)
    }

    /// Calls the completion client with retries and a per-attempt timeout.
    /// Records the call's token usage as soon as a reply arrives.
    async fn invoke(
        &self,
        task: Task,
        prompt: &str,
        tokens: &mut TokenUsage,
    ) -> Result<String, CompletionError> {
        let llm = &self.llm;
        let attempt_timeout = self.attempt_timeout;
        let options = CompletionOptions {
            max_tokens: task.max_tokens(),
        };

        let completion = retry_with_backoff(self.retry, move || async move {
            match tokio::time::timeout(attempt_timeout, llm.complete(prompt, options)).await {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout(attempt_timeout)),
            }
        })
        .await
        .map_err(|source| CompletionError::Transport {
            task: task.name(),
            source,
        })?;

        tokens.record(completion.tokens_used);
        debug!(
            "{} call used {} tokens ({} chars returned)",
            task.name(),
            completion.tokens_used,
            completion.text.len()
        );

        Ok(completion.text)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Prompt building and parsing helpers
// ────────────────────────────────────────────────────────────────────────────

/// Leading `max_chars` characters of `text`. Never splits a UTF-8 sequence.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn build_recommendation_prompt(input: KeywordRecommendationInput<'_>) -> String {
    let join_or_none = |items: &[String]| {
        if items.is_empty() {
            "None".to_string()
        } else {
            items.join(", ")
        }
    };

    KEYWORD_RECOMMENDATION_PROMPT_TEMPLATE
        .replace("{reading_level}", input.reading_level.as_str())
        .replace("{preferred_topics}", &join_or_none(input.preferred_topics))
        .replace("{key_topics}", &join_or_none(input.key_topics))
        .replace("{cursor_context}", input.cursor_context.unwrap_or("None"))
        .replace(
            "{draft_text}",
            truncate_chars(input.draft_text, Task::KeywordRecommendation.char_budget()),
        )
}

/// Narrows `text` to the span between the first `{` and the last `}`.
fn narrow_to_object(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

fn parse_object<T: DeserializeOwned>(task: Task, reply: &str) -> Result<T, CompletionError> {
    let cleaned = narrow_to_object(strip_json_fences(reply));
    serde_json::from_str(cleaned).map_err(|e| CompletionError::parse(task, e))
}

fn parse_list(task: Task, reply: &str) -> Result<Vec<String>, CompletionError> {
    let items: Vec<String> = serde_json::from_str(strip_json_fences(reply))
        .map_err(|e| CompletionError::parse(task, e))?;
    Ok(normalize_terms(items))
}

/// Trims terms, drops blanks and case-insensitive duplicates. Order is preserved.
fn normalize_terms(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect()
}

fn clamp_finite(value: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        min
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
