use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::completion::{SentimentMetrics, TokenUsage};
use crate::models::UserProfile;

/// Position of a run in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AnalyzeDraft,
    GenerateKeywords,
    CalculateScores,
    FormatOutput,
    HandleError,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::AnalyzeDraft => "analyze_draft",
            Stage::GenerateKeywords => "generate_keywords",
            Stage::CalculateScores => "calculate_scores",
            Stage::FormatOutput => "format_output",
            Stage::HandleError => "handle_error",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stage failed and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageError {
    pub stage: Stage,
    pub message: String,
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.message)
    }
}

/// Malformed pipeline input. The only failure `run_pipeline` returns to its caller.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Everything a single pipeline run knows. Owned by exactly one stage at a time.
#[derive(Debug, Clone)]
pub struct AnalysisState {
    pub draft_text: String,
    pub cursor_context: Option<String>,
    pub user_profile: UserProfile,
    pub sentiment: Option<SentimentMetrics>,
    pub key_topics: Vec<String>,
    pub initial_keywords: Vec<String>,
    pub suggested_keywords: Vec<String>,
    pub readability_score: Option<f64>,
    pub relevance_score: Option<f64>,
    pub token_usage: TokenUsage,
    pub stage: Stage,
    // Set-once: see `record_error`.
    error: Option<StageError>,
}

impl AnalysisState {
    pub fn new(
        draft_text: impl Into<String>,
        cursor_context: Option<String>,
        user_profile: UserProfile,
    ) -> Result<Self, ValidationError> {
        let draft_text = draft_text.into();
        if draft_text.trim().is_empty() {
            return Err(ValidationError("draft_text cannot be empty".to_string()));
        }

        Ok(Self {
            draft_text,
            cursor_context: cursor_context.filter(|c| !c.trim().is_empty()),
            user_profile: user_profile.normalized(),
            sentiment: None,
            key_topics: Vec::new(),
            initial_keywords: Vec::new(),
            suggested_keywords: Vec::new(),
            readability_score: None,
            relevance_score: None,
            token_usage: TokenUsage::default(),
            stage: Stage::AnalyzeDraft,
            error: None,
        })
    }

    pub fn error(&self) -> Option<&StageError> {
        self.error.as_ref()
    }

    /// Records the first failure of the run. Later calls are ignored.
    pub fn record_error(&mut self, error: StageError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

/// A stage that could not complete. Carries the state so the run can degrade
/// gracefully instead of aborting.
#[derive(Debug)]
pub struct StageFailure {
    pub error: StageError,
    pub state: Box<AnalysisState>,
}

impl StageFailure {
    pub fn new(stage: Stage, cause: impl fmt::Display, state: AnalysisState) -> Self {
        Self {
            error: StageError {
                stage,
                message: cause.to_string(),
            },
            state: Box::new(state),
        }
    }
}

pub type StageResult = Result<AnalysisState, StageFailure>;

/// Public result of a run. Same shape whether or not a stage failed; a
/// degraded run is recognisable only by `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub suggested_keywords: Vec<String>,
    pub readability_score: f64,
    pub relevance_score: f64,
    pub token_usage: u64,
    pub error: Option<String>,
}
