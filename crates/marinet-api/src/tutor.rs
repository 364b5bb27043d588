use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;
use tracing::warn;

/// Failure of the outbound AI call. Always recovered with a fallback reply.
#[derive(Debug, Error)]
pub enum TutorError {
    #[error("AI tutor is not configured")]
    NotConfigured,

    #[error("AI request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("AI service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI service returned no text")]
    EmptyResponse,

    #[error("AI service did not answer within {0:?}")]
    Timeout(Duration),
}

impl TutorError {
    /// Reply shown to the student in place of a generated answer.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            TutorError::Status { .. } => {
                "I'm having trouble connecting to my knowledge base right now. Please try again in a moment."
            }
            TutorError::EmptyResponse => {
                "I'm sorry, I couldn't generate a response at the moment. Could you try rephrasing your question?"
            }
            TutorError::Timeout(_) => {
                "I'm sorry, I'm having trouble processing your request right now. Please try again in a moment."
            }
            TutorError::NotConfigured | TutorError::Request(_) => {
                "Sorry, I encountered an error while processing your request. Please try again later."
            }
        }
    }
}

/// Text generator behind the tutor. Receives only the latest user message.
pub trait ResponseGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, TutorError>>;
}

/// The reply to append to a conversation, plus the upstream error when the
/// content is a fallback.
#[derive(Debug)]
pub struct TutorReply {
    pub content: String,
    pub error: Option<TutorError>,
}

/// Bounded-time access to a `ResponseGenerator`; never fails.
pub struct TutorBridge {
    generator: Arc<dyn ResponseGenerator>,
    timeout: Duration,
}

impl TutorBridge {
    pub fn new(generator: Arc<dyn ResponseGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub async fn reply(&self, prompt: &str) -> TutorReply {
        let result = match tokio::time::timeout(self.timeout, self.generator.generate(prompt)).await {
            Ok(Ok(text)) if text.trim().is_empty() => Err(TutorError::EmptyResponse),
            Ok(result) => result,
            Err(_) => Err(TutorError::Timeout(self.timeout)),
        };

        match result {
            Ok(content) => TutorReply { content, error: None },
            Err(err) => {
                warn!("AI tutor fell back: {}", err);
                TutorReply {
                    content: err.fallback_message().to_string(),
                    error: Some(err),
                }
            }
        }
    }
}
