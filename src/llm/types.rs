//! Provider-neutral request/response shapes for the suggestion model.

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("invalid LLM config: {0}")]
    Config(String),

    /// `var` names the environment variable that should hold the key.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    #[error("LLM transport failed: {0}")]
    Transport(String),

    #[error("LLM provider returned HTTP {status}")]
    Status { status: u16, body: String },

    #[error("LLM reply could not be decoded: {0}")]
    Decode(String),

    #[error("HTTP client build failed: {0}")]
    HttpClient(String),
}

impl LlmError {
    /// Throttling, server errors and dropped connections may clear up on
    /// their own; everything else will fail the same way again.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

/// The model's reply, flattened to its visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub model: String,
    /// Generation stopped at the token limit, so `text` may be cut short.
    pub truncated: bool,
    pub usage: TokenUsage,
}

/// Seam between the suggestion service and a concrete provider.
#[async_trait::async_trait]
pub trait LlmChat: Send + Sync {
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the provider cannot be reached, rejects
    /// the request, or replies with something unreadable.
    async fn chat(&self, max_tokens: u32, system: &str, messages: &[Message]) -> Result<Completion, LlmError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
