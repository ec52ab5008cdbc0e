use std::fmt;

use serde::{Deserialize, Serialize};

/// Target reading level chosen by the user. Drives the preferred readability band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl ReadingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingLevel::Beginner => "beginner",
            ReadingLevel::Intermediate => "intermediate",
            ReadingLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ReadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preferences of the person writing the draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub preferred_topics: Vec<String>,
    #[serde(default)]
    pub reading_level: ReadingLevel,
}

impl UserProfile {
    /// Trims topics, drops blanks and removes case-insensitive duplicates (first wins).
    pub fn normalized(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.preferred_topics = self
            .preferred_topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
            .collect();
        self
    }
}
