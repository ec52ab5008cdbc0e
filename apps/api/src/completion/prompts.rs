// Prompt templates for each completion task.
// Kept deliberately short: every token here is paid for on every request.

/// Replace `{text}`.
pub const SENTIMENT_PROMPT_TEMPLATE: &str = r#"Analyze sentiment of this blog text. Return JSON only:
{"polarity": float(-1 to 1), "subjectivity": float(0 to 1)}

Text: {text}"#;

/// Replace `{text}`.
pub const TOPIC_EXTRACTION_PROMPT_TEMPLATE: &str = r#"Extract 3-5 key topics from this blog. Return JSON array of strings only:
["topic1", "topic2", ...]

Text: {text}"#;

/// Replace `{text}`.
pub const KEYWORD_GENERATION_PROMPT_TEMPLATE: &str = r#"Generate 5-7 relevant keywords for this blog. Return JSON array only:
["keyword1", "keyword2", ...]

Text: {text}"#;

/// Replace: {reading_level}, {preferred_topics}, {key_topics}, {cursor_context}, {draft_text}
pub const KEYWORD_RECOMMENDATION_PROMPT_TEMPLATE: &str = r#"Given:
- Draft: {draft_text}
- Context: {cursor_context}
- Draft topics: {key_topics}
- User topics: {preferred_topics}
- Reading level: {reading_level}

Generate 8-10 ranked keywords optimized for user preferences. Return JSON array only:
["keyword1", "keyword2", ...]"#;

/// Replace `{draft_text}`.
pub const DRAFT_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze this draft for content quality and structure. Return JSON:
{"quality_score": float(0-1), "structure_notes": "brief notes", "improvement_areas": ["area1", "area2"]}

Draft: {draft_text}"#;
