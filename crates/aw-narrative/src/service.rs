//! The narrative service port.

use async_trait::async_trait;

use crate::error::NarrativeResult;

/// Shape the reply should take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    /// Free text.
    Text,
    /// A single JSON object.
    JsonObject,
}

/// One completion request: a system instruction and a user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Persona or game-master instruction.
    pub system_prompt: String,
    /// The user turn.
    pub user_prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Reply length cap in tokens.
    pub max_tokens: u32,
    /// Requested reply format.
    pub format: ReplyFormat,
}

/// A text-generation backend.
///
/// Implementations return the raw reply text. Interpreting it is the
/// caller's job.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NarrativeService: Send + Sync {
    /// Run one completion.
    async fn complete(&self, request: CompletionRequest) -> NarrativeResult<String>;
}
