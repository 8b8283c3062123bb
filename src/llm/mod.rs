//! Language model access for gift suggestions.
//!
//! DESIGN
//! ======
//! One pooled `reqwest::Client` is shared by whichever provider
//! `LLM_PROVIDER` selects. A provider only knows how to shape its request
//! and read its reply; sending, status checks and retry live in
//! `transport`. Callers depend on the [`LlmChat`] trait, never on
//! `LlmClient`, so tests substitute canned replies.

mod anthropic;
pub mod config;
mod openai;
mod transport;
pub mod types;

use config::{LlmConfig, ProviderKind, RetryPolicy};
pub use types::LlmChat;
use types::{Completion, LlmError, Message};

enum Provider {
    Anthropic(anthropic::Anthropic),
    OpenAi(openai::OpenAi),
}

pub struct LlmClient {
    http: reqwest::Client,
    provider: Provider,
    model: String,
    retry: RetryPolicy,
}

impl LlmClient {
    /// # Errors
    ///
    /// Returns an error if `LLM_*` settings are missing or malformed, or
    /// the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_config(LlmConfig::from_env()?)
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let provider = match config.provider {
            ProviderKind::Anthropic => Provider::Anthropic(anthropic::Anthropic::new(config.api_key)),
            ProviderKind::OpenAi => Provider::OpenAi(openai::OpenAi::new(config.api_key, &config.openai_base_url)),
        };
        Ok(Self {
            http: transport::build_http(config.timeouts)?,
            provider,
            model: config.model,
            retry: config.retry,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl LlmChat for LlmClient {
    async fn chat(&self, max_tokens: u32, system: &str, messages: &[Message]) -> Result<Completion, LlmError> {
        let request = match &self.provider {
            Provider::Anthropic(p) => p.request(&self.http, &self.model, max_tokens, system, messages),
            Provider::OpenAi(p) => p.request(&self.http, &self.model, max_tokens, system, messages),
        };
        let body = transport::send(request, self.retry).await?;
        match &self.provider {
            Provider::Anthropic(_) => anthropic::parse_completion(&body),
            Provider::OpenAi(_) => openai::parse_completion(&body),
        }
    }
}
