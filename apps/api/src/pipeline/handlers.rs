//! Axum route handlers for the analysis API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::UserProfile;
use crate::pipeline::{AnalysisResult, BlogAnalysis, DraftAssessment};
use crate::state::AppState;

/// Upper bound on texts per batch request; each one costs three completion calls.
pub const MAX_BATCH_SIZE: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeBlogsRequest {
    pub blog_texts: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendKeywordsRequest {
    pub draft_text: String,
    #[serde(default)]
    pub cursor_context: Option<String>,
    pub user_profile: UserProfile,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeDraftRequest {
    pub draft_text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyze-blogs
///
/// Sentiment, key topics and initial keywords for each text, in input order.
/// Blank texts are skipped.
pub async fn handle_analyze_blogs(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeBlogsRequest>, JsonRejection>,
) -> Result<Json<Vec<BlogAnalysis>>, AppError> {
    let Json(request) = payload?;
    if request.blog_texts.len() > MAX_BATCH_SIZE {
        return Err(AppError::Validation(format!(
            "blog_texts may contain at most {MAX_BATCH_SIZE} entries"
        )));
    }

    let analyses = state.pipeline.run_batch_analysis(&request.blog_texts).await?;
    Ok(Json(analyses))
}

/// POST /api/v1/recommend-keywords
///
/// Full pipeline. A failed stage still yields 200 with `error` set and
/// fallback values in place.
pub async fn handle_recommend_keywords(
    State(state): State<AppState>,
    payload: Result<Json<RecommendKeywordsRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let Json(request) = payload?;

    let result = state
        .pipeline
        .run_pipeline(
            request.draft_text,
            request.cursor_context,
            request.user_profile,
        )
        .await?;

    Ok(Json(result))
}

/// POST /api/v1/analyze-draft
///
/// Quality score, structure notes and improvement areas for a draft.
pub async fn handle_analyze_draft(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeDraftRequest>, JsonRejection>,
) -> Result<Json<DraftAssessment>, AppError> {
    let Json(request) = payload?;
    if request.draft_text.trim().is_empty() {
        return Err(AppError::Validation("draft_text cannot be empty".to_string()));
    }

    let assessment = state.pipeline.assess_draft(&request.draft_text).await?;
    Ok(Json(assessment))
}
