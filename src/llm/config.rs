//! LLM settings from `LLM_*` environment variables.

use std::str::FromStr;
use std::time::Duration;

use super::types::LlmError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Anthropic,
    /// Anything that speaks the chat-completions shape.
    OpenAi,
}

impl ProviderKind {
    #[must_use]
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Anthropic => "claude-sonnet-4-5-20250929",
            Self::OpenAi => "gpt-4o",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            other => Err(LlmError::Config(format!("unknown LLM_PROVIDER: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub request: Duration,
    pub connect: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries, including the first. `1` disables retry.
    pub max_attempts: u32,
    pub backoff: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    pub api_key: String,
    pub model: String,
    pub openai_base_url: String,
    pub timeouts: LlmTimeouts,
    pub retry: RetryPolicy,
}

impl LlmConfig {
    /// The key itself is read from the variable named by `LLM_API_KEY_ENV`,
    /// so deployments can keep their existing `ANTHROPIC_API_KEY` or
    /// `GEMINI_API_KEY`. Other variables: `LLM_PROVIDER` (`anthropic` |
    /// `openai`), `LLM_MODEL`, `LLM_OPENAI_BASE_URL`,
    /// `LLM_REQUEST_TIMEOUT_SECS`, `LLM_CONNECT_TIMEOUT_SECS`,
    /// `LLM_MAX_ATTEMPTS`, `LLM_RETRY_BACKOFF_MS`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing or a value does not parse.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// # Errors
    ///
    /// Same as [`LlmConfig::from_env`].
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, LlmError> {
        let provider = match var("LLM_PROVIDER") {
            Some(raw) => raw.parse()?,
            None => ProviderKind::Anthropic,
        };

        let key_var = var("LLM_API_KEY_ENV").ok_or_else(|| LlmError::MissingApiKey { var: "LLM_API_KEY_ENV".into() })?;
        let api_key = var(&key_var)
            .filter(|key| !key.trim().is_empty())
            .ok_or(LlmError::MissingApiKey { var: key_var })?;

        let number = |key: &str, default: u64| -> Result<u64, LlmError> {
            match var(key) {
                None => Ok(default),
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| LlmError::Config(format!("invalid {key}: {raw}"))),
            }
        };

        let timeouts = LlmTimeouts {
            request: Duration::from_secs(number("LLM_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT.as_secs())?),
            connect: Duration::from_secs(number("LLM_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT.as_secs())?),
        };
        let attempts = number("LLM_MAX_ATTEMPTS", u64::from(DEFAULT_MAX_ATTEMPTS))?;
        let retry = RetryPolicy {
            max_attempts: u32::try_from(attempts.max(1)).unwrap_or(u32::MAX),
            backoff: Duration::from_millis(number("LLM_RETRY_BACKOFF_MS", DEFAULT_RETRY_BACKOFF_MS)?),
        };

        Ok(Self {
            provider,
            api_key,
            model: var("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            openai_base_url: var("LLM_OPENAI_BASE_URL")
                .as_deref()
                .unwrap_or(DEFAULT_OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            timeouts,
            retry,
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
