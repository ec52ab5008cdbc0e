//! Relevance scoring for a draft against a user profile.
//!
//! relevance = keyword_relevance × 0.4 + readability × 0.3 + user_profile_fit × 0.3
//!
//! Each component is clamped to [0, 100] before weighting and the weighted sum
//! is clamped again, so the result is always in [0, 100].

use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;
use thiserror::Error;

use crate::models::{ReadingLevel, UserProfile};
use crate::scoring::embeddings::{cosine_similarity, Embedder, EmbeddingError};
use crate::scoring::readability::Readability;

/// Score inside the preferred band.
const IN_BAND_FIT: f64 = 90.0;
/// Floor for the profile fit, so a mismatch never zeroes the whole formula.
const MIN_FIT: f64 = 10.0;
/// Fit lost per readability point outside the band.
const FIT_PENALTY_PER_POINT: f64 = 0.8;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("draft text is empty")]
    EmptyDraft,

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

#[derive(Debug, Clone)]
pub struct ScoringWeights {
    pub keyword_relevance: f64,
    pub readability: f64,
    pub user_profile: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            keyword_relevance: 0.4,
            readability: 0.3,
            user_profile: 0.3,
        }
    }
}

/// The three sub-scores, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreComponents {
    pub keyword_relevance: f64,
    pub readability: f64,
    pub user_profile_fit: f64,
}

impl ScoreComponents {
    pub fn weighted(&self, weights: &ScoringWeights) -> f64 {
        clamp_score(
            clamp_score(self.keyword_relevance) * weights.keyword_relevance
                + clamp_score(self.readability) * weights.readability
                + clamp_score(self.user_profile_fit) * weights.user_profile,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreReport {
    pub readability_score: f64,
    pub relevance_score: f64,
    pub components: ScoreComponents,
}

#[derive(Clone)]
pub struct ScoringEngine {
    embedder: Arc<dyn Embedder>,
    readability: Arc<dyn Readability>,
    weights: ScoringWeights,
}

impl ScoringEngine {
    pub fn new(embedder: Arc<dyn Embedder>, readability: Arc<dyn Readability>) -> Self {
        Self {
            embedder,
            readability,
            weights: ScoringWeights::default(),
        }
    }

    pub async fn score(
        &self,
        draft_text: &str,
        profile: &UserProfile,
    ) -> Result<ScoreReport, ScoringError> {
        if draft_text.trim().is_empty() {
            return Err(ScoringError::EmptyDraft);
        }

        let readability = self.readability_score(draft_text);
        let components = ScoreComponents {
            keyword_relevance: self
                .keyword_relevance(draft_text, &profile.preferred_topics)
                .await?,
            readability,
            user_profile_fit: user_profile_fit(readability, profile.reading_level),
        };

        Ok(ScoreReport {
            readability_score: readability,
            relevance_score: components.weighted(&self.weights),
            components,
        })
    }

    /// Flesch Reading Ease clamped to [0, 100].
    pub fn readability_score(&self, draft_text: &str) -> f64 {
        clamp_score(self.readability.score(draft_text))
    }

    /// Best cosine similarity between the draft and any preferred topic, mapped
    /// to [0, 100]. No topics scores 0.
    pub async fn keyword_relevance(
        &self,
        draft_text: &str,
        topics: &[String],
    ) -> Result<f64, ScoringError> {
        if topics.is_empty() {
            return Ok(0.0);
        }

        let draft_embedding = self.embedder.embed(draft_text).await?;
        let topic_embeddings =
            try_join_all(topics.iter().map(|topic| self.embedder.embed(topic))).await?;

        let max_similarity = topic_embeddings
            .iter()
            .map(|topic| f64::from(cosine_similarity(&draft_embedding, topic)))
            .fold(f64::NEG_INFINITY, f64::max);

        Ok(similarity_to_score(max_similarity))
    }
}

/// Maps a similarity in [-1, 1] onto [0, 100].
pub fn similarity_to_score(similarity: f64) -> f64 {
    clamp_score((similarity.clamp(-1.0, 1.0) + 1.0) / 2.0 * 100.0)
}

/// Closed readability band each reading level is comfortable with.
pub fn preferred_band(level: ReadingLevel) -> (f64, f64) {
    match level {
        ReadingLevel::Beginner => (60.0, 100.0),
        ReadingLevel::Intermediate => (40.0, 80.0),
        ReadingLevel::Advanced => (0.0, 60.0),
    }
}

/// 90 inside the band; outside, 90 minus 0.8 per point of distance to the
/// nearest edge, floored at 10.
pub fn user_profile_fit(readability: f64, level: ReadingLevel) -> f64 {
    let (min, max) = preferred_band(level);
    if (min..=max).contains(&readability) {
        return IN_BAND_FIT;
    }
    let distance = (readability - min).abs().min((readability - max).abs());
    (IN_BAND_FIT - distance * FIT_PENALTY_PER_POINT).max(MIN_FIT)
}

/// Clamps to [0, 100]; NaN becomes 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingEmbedder, FixedEmbedder, FixedReadability};
    use proptest::prelude::*;

    fn engine(embedder: impl Embedder + 'static, readability: f64) -> ScoringEngine {
        ScoringEngine::new(Arc::new(embedder), Arc::new(FixedReadability(readability)))
    }

    fn profile(topics: &[&str], level: ReadingLevel) -> UserProfile {
        UserProfile {
            preferred_topics: topics.iter().map(|t| t.to_string()).collect(),
            reading_level: level,
        }
    }

    #[test]
    fn test_worked_example_low_fit() {
        let components = ScoreComponents {
            keyword_relevance: 95.0,
            readability: 30.0,
            user_profile_fit: 45.0,
        };
        let score = components.weighted(&ScoringWeights::default());
        // 38 + 9 + 13.5
        assert!((score - 60.5).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn test_worked_example_high_fit() {
        let components = ScoreComponents {
            keyword_relevance: 88.0,
            readability: 85.0,
            user_profile_fit: 90.0,
        };
        let score = components.weighted(&ScoringWeights::default());
        assert!((score - 87.7).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn test_fit_inside_band_is_90() {
        assert_eq!(user_profile_fit(60.0, ReadingLevel::Beginner), 90.0);
        assert_eq!(user_profile_fit(100.0, ReadingLevel::Beginner), 90.0);
        assert_eq!(user_profile_fit(40.0, ReadingLevel::Intermediate), 90.0);
        assert_eq!(user_profile_fit(0.0, ReadingLevel::Advanced), 90.0);
    }

    #[test]
    fn test_fit_penalizes_distance_to_nearest_edge() {
        // beginner band [60, 100]; 30 is 30 below → 90 - 24 = 66
        assert!((user_profile_fit(30.0, ReadingLevel::Beginner) - 66.0).abs() < 1e-9);
        // advanced band [0, 60]; 85 is 25 above → 90 - 20 = 70
        assert!((user_profile_fit(85.0, ReadingLevel::Advanced) - 70.0).abs() < 1e-9);
        // intermediate band [40, 80]; 95 is 15 above → 78
        assert!((user_profile_fit(95.0, ReadingLevel::Intermediate) - 78.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_floor_is_10() {
        assert_eq!(user_profile_fit(-500.0, ReadingLevel::Beginner), 10.0);
    }

    #[test]
    fn test_similarity_mapping_endpoints() {
        assert_eq!(similarity_to_score(-1.0), 0.0);
        assert_eq!(similarity_to_score(0.0), 50.0);
        assert_eq!(similarity_to_score(1.0), 100.0);
    }

    #[test]
    fn test_clamp_score_handles_nan_and_range() {
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(-3.0), 0.0);
        assert_eq!(clamp_score(140.0), 100.0);
    }

    #[tokio::test]
    async fn test_no_preferred_topics_scores_zero_relevance() {
        let report = engine(FixedEmbedder::new(vec![1.0, 0.0]), 70.0)
            .score("A short draft.", &profile(&[], ReadingLevel::Beginner))
            .await
            .unwrap();
        assert_eq!(report.components.keyword_relevance, 0.0);
        // 0 * 0.4 + 70 * 0.3 + 90 * 0.3
        assert!((report.relevance_score - 48.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_keyword_relevance_uses_best_topic() {
        let embedder = FixedEmbedder::new(vec![0.0, 1.0])
            .with("draft", vec![1.0, 0.0])
            .with("close", vec![1.0, 0.0])
            .with("opposite", vec![-1.0, 0.0]);
        let report = engine(embedder, 50.0)
            .score("draft", &profile(&["opposite", "close", "orthogonal"], ReadingLevel::Intermediate))
            .await
            .unwrap();
        assert!((report.components.keyword_relevance - 100.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_readability_is_clamped_before_fit() {
        let report = engine(FixedEmbedder::new(vec![1.0]), 130.0)
            .score("draft", &profile(&[], ReadingLevel::Advanced))
            .await
            .unwrap();
        assert_eq!(report.readability_score, 100.0);
        // advanced band [0, 60]; clamped 100 is 40 above → 58
        assert!((report.components.user_profile_fit - 58.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_empty_draft_is_rejected() {
        let err = engine(FixedEmbedder::new(vec![1.0]), 50.0)
            .score("   ", &profile(&["rust"], ReadingLevel::Beginner))
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::EmptyDraft));
    }

    #[tokio::test]
    async fn test_embedding_failure_surfaces() {
        let err = engine(FailingEmbedder, 50.0)
            .score("draft", &profile(&["rust"], ReadingLevel::Beginner))
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_transient_embedding_failure_does_not_fail_scoring() {
        use crate::retry::RetryPolicy;
        use crate::scoring::embeddings::HttpEmbedder;
        use secrecy::Secret;
        use std::time::Duration;
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": [{"embedding": [1.0, 0.0]}]})),
            )
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(
            Secret::new("emb-key".to_string()),
            server.uri(),
            Duration::from_secs(5),
            RetryPolicy::new(3, Duration::from_millis(10)),
        )
        .unwrap();

        let report = engine(embedder, 70.0)
            .score("The cat sat on the mat.", &profile(&["cats"], ReadingLevel::Beginner))
            .await
            .unwrap();
        assert!((report.components.keyword_relevance - 100.0).abs() < 1e-6);
    }

    fn any_level() -> impl Strategy<Value = ReadingLevel> {
        prop_oneof![
            Just(ReadingLevel::Beginner),
            Just(ReadingLevel::Intermediate),
            Just(ReadingLevel::Advanced),
        ]
    }

    proptest! {
        #[test]
        fn prop_fit_is_bounded_and_90_iff_in_band(readability in -200.0f64..300.0, level in any_level()) {
            let fit = user_profile_fit(readability, level);
            let (min, max) = preferred_band(level);
            prop_assert!((10.0..=90.0).contains(&fit));
            prop_assert_eq!(fit == 90.0, (min..=max).contains(&readability));
        }

        #[test]
        fn prop_similarity_score_bounded_and_monotonic(a in -1.0f64..=1.0, b in -1.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let (s_lo, s_hi) = (similarity_to_score(lo), similarity_to_score(hi));
            prop_assert!((0.0..=100.0).contains(&s_lo));
            prop_assert!((0.0..=100.0).contains(&s_hi));
            prop_assert!(s_lo <= s_hi);
        }

        #[test]
        fn prop_weighted_score_is_bounded(k in -50.0f64..150.0, r in -50.0f64..150.0, u in -50.0f64..150.0) {
            let score = ScoreComponents { keyword_relevance: k, readability: r, user_profile_fit: u }
                .weighted(&ScoringWeights::default());
            prop_assert!((0.0..=100.0).contains(&score));
        }
    }
}
