//! Drives one `AnalysisState` through the stages.
//!
//! Stage functions take the state by value and hand it back either as `Ok`
//! (advance to the successor) or inside a `StageFailure` (route to
//! `handle_error`). Completion and scoring errors never escape a stage, so a
//! run that passed validation always produces an `AnalysisResult`.

use std::fmt;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::completion::{
    CompletionError, CompletionService, DraftQuality, KeywordRecommendationInput, SentimentMetrics,
    TokenUsage,
};
use crate::models::UserProfile;
use crate::pipeline::state::{
    AnalysisResult, AnalysisState, Stage, StageError, StageFailure, StageResult, ValidationError,
};
use crate::scoring::engine::clamp_score;
use crate::scoring::ScoringEngine;

/// Per-text output of batch analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogAnalysis {
    pub sentiment_metrics: SentimentMetrics,
    pub key_topics: Vec<String>,
    pub initial_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftAssessment {
    #[serde(flatten)]
    pub quality: DraftQuality,
    pub token_usage: TokenUsage,
}

#[derive(Clone)]
pub struct AnalysisPipeline {
    completion: CompletionService,
    scoring: ScoringEngine,
}

impl AnalysisPipeline {
    pub fn new(completion: CompletionService, scoring: ScoringEngine) -> Self {
        Self {
            completion,
            scoring,
        }
    }

    /// Runs the full pipeline for one draft. Only malformed input is an `Err`;
    /// stage failures come back as a degraded result with `error` set.
    pub async fn run_pipeline(
        &self,
        draft_text: impl Into<String>,
        cursor_context: Option<String>,
        user_profile: UserProfile,
    ) -> Result<AnalysisResult, ValidationError> {
        let state = AnalysisState::new(draft_text, cursor_context, user_profile)?;
        let span = info_span!("analysis", run_id = %Uuid::new_v4());
        Ok(self.drive(state).instrument(span).await)
    }

    async fn drive(&self, mut state: AnalysisState) -> AnalysisResult {
        let mut pending: Option<StageError> = None;

        loop {
            debug!("Entering stage {}", state.stage);
            state = match state.stage {
                Stage::AnalyzeDraft => {
                    route(self.analyze_draft(state).await, Stage::GenerateKeywords, &mut pending)
                }
                Stage::GenerateKeywords => route(
                    self.generate_keywords(state).await,
                    Stage::CalculateScores,
                    &mut pending,
                ),
                Stage::CalculateScores => route(
                    self.calculate_scores(state).await,
                    Stage::FormatOutput,
                    &mut pending,
                ),
                Stage::HandleError => handle_error(state, pending.take()),
                Stage::FormatOutput | Stage::Done => return format_output(state),
            };
        }
    }

    // ── Stages ──────────────────────────────────────────────────────────────

    /// Sentiment, key topics and initial keywords, one call after another.
    async fn analyze_draft(&self, mut state: AnalysisState) -> StageResult {
        info!(
            "Analyzing draft ({} chars)",
            state.draft_text.chars().count()
        );
        let outcome = self.populate_analysis(&mut state).await;
        finish(Stage::AnalyzeDraft, outcome, state)
    }

    async fn populate_analysis(&self, state: &mut AnalysisState) -> Result<(), CompletionError> {
        let text = state.draft_text.as_str();
        let tokens = &mut state.token_usage;

        let sentiment = self.completion.analyze_sentiment(text, tokens).await?;
        debug!(
            "Sentiment polarity={:.2} subjectivity={:.2}",
            sentiment.polarity, sentiment.subjectivity
        );
        state.sentiment = Some(sentiment);

        state.key_topics = self.completion.extract_topics(text, tokens).await?;
        state.initial_keywords = self.completion.generate_initial_keywords(text, tokens).await?;

        debug!(
            "Found {} topics and {} initial keywords",
            state.key_topics.len(),
            state.initial_keywords.len()
        );
        Ok(())
    }

    async fn generate_keywords(&self, mut state: AnalysisState) -> StageResult {
        let input = KeywordRecommendationInput {
            draft_text: &state.draft_text,
            cursor_context: state.cursor_context.as_deref(),
            key_topics: &state.key_topics,
            preferred_topics: &state.user_profile.preferred_topics,
            reading_level: state.user_profile.reading_level,
        };

        let outcome = self
            .completion
            .recommend_keywords(input, &mut state.token_usage)
            .await
            .map(|keywords| {
                info!("Generated {} keyword suggestions", keywords.len());
                state.suggested_keywords = keywords;
            });
        finish(Stage::GenerateKeywords, outcome, state)
    }

    async fn calculate_scores(&self, mut state: AnalysisState) -> StageResult {
        let outcome = self
            .scoring
            .score(&state.draft_text, &state.user_profile)
            .await
            .map(|report| {
                debug!("Score components: {:?}", report.components);
                state.readability_score = Some(report.readability_score);
                state.relevance_score = Some(report.relevance_score);
            });
        finish(Stage::CalculateScores, outcome, state)
    }

    // ── Batch analysis ──────────────────────────────────────────────────────

    /// analyze_draft for each non-blank text, concurrently. Output order
    /// follows input order. The first completion failure fails the batch.
    pub async fn run_batch_analysis(
        &self,
        blog_texts: &[String],
    ) -> Result<Vec<BlogAnalysis>, CompletionError> {
        let analyses = blog_texts
            .iter()
            .filter(|text| !text.trim().is_empty())
            .map(|text| self.analyze_blog(text));

        let results = try_join_all(analyses).await?;
        info!("Analyzed {} blog texts", results.len());
        Ok(results)
    }

    async fn analyze_blog(&self, text: &str) -> Result<BlogAnalysis, CompletionError> {
        let mut tokens = TokenUsage::default();
        let sentiment_metrics = self.completion.analyze_sentiment(text, &mut tokens).await?;
        let key_topics = self.completion.extract_topics(text, &mut tokens).await?;
        let initial_keywords = self
            .completion
            .generate_initial_keywords(text, &mut tokens)
            .await?;

        debug!("Blog analysis used {} tokens", tokens.total());
        Ok(BlogAnalysis {
            sentiment_metrics,
            key_topics,
            initial_keywords,
        })
    }

    // ── Draft quality ───────────────────────────────────────────────────────

    pub async fn assess_draft(&self, draft_text: &str) -> Result<DraftAssessment, CompletionError> {
        let mut token_usage = TokenUsage::default();
        let quality = self
            .completion
            .analyze_draft(draft_text, &mut token_usage)
            .await?;
        Ok(DraftAssessment {
            quality,
            token_usage,
        })
    }
}

fn finish<E: fmt::Display>(stage: Stage, outcome: Result<(), E>, state: AnalysisState) -> StageResult {
    match outcome {
        Ok(()) => Ok(state),
        Err(e) => Err(StageFailure::new(stage, e, state)),
    }
}

/// `Ok` moves to `next`; a failure parks its error in `pending` and moves to
/// handle_error.
fn route(result: StageResult, next: Stage, pending: &mut Option<StageError>) -> AnalysisState {
    match result {
        Ok(mut state) => {
            state.stage = next;
            state
        }
        Err(StageFailure { error, state }) => {
            warn!("Stage {} failed: {}", error.stage, error.message);
            let mut state = *state;
            state.stage = Stage::HandleError;
            *pending = Some(error);
            state
        }
    }
}

/// Records the failure (first one wins) and fills whatever the failed stage
/// left unset with neutral values.
fn handle_error(mut state: AnalysisState, failure: Option<StageError>) -> AnalysisState {
    if let Some(failure) = failure {
        state.record_error(failure);
    }

    if state.suggested_keywords.is_empty() {
        state.suggested_keywords = state.initial_keywords.clone();
    }
    state.readability_score.get_or_insert(0.0);
    state.relevance_score.get_or_insert(0.0);

    state.stage = Stage::FormatOutput;
    state
}

fn format_output(mut state: AnalysisState) -> AnalysisResult {
    state.stage = Stage::Done;

    let error = state.error().map(ToString::to_string);
    if let Some(error) = &error {
        warn!("Analysis finished degraded: {error}");
    } else {
        info!(
            "Analysis finished: {} keywords, {} tokens, sentiment {:?}",
            state.suggested_keywords.len(),
            state.token_usage.total(),
            state.sentiment.map(|s| s.polarity)
        );
    }

    AnalysisResult {
        suggested_keywords: state.suggested_keywords,
        readability_score: clamp_score(state.readability_score.unwrap_or(0.0)),
        relevance_score: clamp_score(state.relevance_score.unwrap_or(0.0)),
        token_usage: state.token_usage.total(),
        error,
    }
}
