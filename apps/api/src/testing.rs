//! In-memory doubles for the external capabilities, shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm_client::{Completion, CompletionOptions, LlmError, TextCompletion};
use crate::scoring::embeddings::{Embedder, EmbeddingError};
use crate::scoring::readability::Readability;

enum Step {
    Reply {
        text: String,
        tokens: u32,
        delay: Option<Duration>,
    },
    Fail(LlmError),
}

/// Replays a fixed script of replies in call order, recording every prompt.
/// Once the script runs out, `fallback` decides the outcome.
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<Step>>,
    prompts: Mutex<Vec<String>>,
    fallback: Box<dyn Fn(&str) -> Result<Completion, LlmError> + Send + Sync>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::with_responder(|_| {
            Err(LlmError::Api {
                status: 500,
                message: "script exhausted".to_string(),
            })
        })
    }

    /// Every call fails with a freshly built error.
    pub fn failing(make_error: impl Fn() -> LlmError + Send + Sync + 'static) -> Self {
        Self::with_responder(move |_| Err(make_error()))
    }

    /// Answers each call by inspecting the prompt. Order-independent, so it
    /// suits concurrent callers.
    pub fn with_responder(
        responder: impl Fn(&str) -> Result<Completion, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            fallback: Box::new(responder),
        }
    }

    pub fn ok(self, text: &str, tokens: u32) -> Self {
        self.push(Step::Reply {
            text: text.to_string(),
            tokens,
            delay: None,
        })
    }

    pub fn delayed(self, delay: Duration, text: &str, tokens: u32) -> Self {
        self.push(Step::Reply {
            text: text.to_string(),
            tokens,
            delay: Some(delay),
        })
    }

    pub fn err(self, error: LlmError) -> Self {
        self.push(Step::Fail(error))
    }

    fn push(self, step: Step) -> Self {
        self.script.lock().unwrap().push_back(step);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextCompletion for ScriptedCompletion {
    async fn complete(
        &self,
        prompt: &str,
        _options: CompletionOptions,
    ) -> Result<Completion, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply {
                text,
                tokens,
                delay,
            }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(Completion {
                    text,
                    tokens_used: tokens,
                })
            }
            Some(Step::Fail(e)) => Err(e),
            None => (self.fallback)(prompt),
        }
    }
}

pub fn reply(text: &str, tokens: u32) -> Result<Completion, LlmError> {
    Ok(Completion {
        text: text.to_string(),
        tokens_used: tokens,
    })
}

/// Returns a preset vector per exact input text, `default` otherwise.
pub struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    default: Vec<f32>,
}

impl FixedEmbedder {
    pub fn new(default: Vec<f32>) -> Self {
        Self {
            vectors: HashMap::new(),
            default,
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::EmptyResponse)
    }
}

/// Readability scorer that ignores its input.
pub struct FixedReadability(pub f64);

impl Readability for FixedReadability {
    fn score(&self, _text: &str) -> f64 {
        self.0
    }
}
