use serde::Serialize;

/// Tokens consumed by completion calls during one request.
///
/// Only grows: the sole mutator is `record`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TokenUsage(u64);

impl TokenUsage {
    pub fn record(&mut self, tokens: u32) {
        self.0 = self.0.saturating_add(u64::from(tokens));
    }

    pub fn total(&self) -> u64 {
        self.0
    }
}
