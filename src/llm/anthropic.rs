//! Anthropic Messages API (`/v1/messages`).

use serde::{Deserialize, Serialize};

use super::types::{Completion, LlmError, Message, TokenUsage};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub(super) struct Anthropic {
    api_key: String,
}

impl Anthropic {
    pub(super) fn new(api_key: String) -> Self {
        Self { api_key }
    }

    pub(super) fn request(
        &self,
        http: &reqwest::Client,
        model: &str,
        max_tokens: u32,
        system: &str,
        messages: &[Message],
    ) -> reqwest::RequestBuilder {
        http.post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&MessagesRequest { model, max_tokens, system, messages })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct MessagesReply {
    content: Vec<Block>,
    model: String,
    #[serde(default)]
    stop_reason: Option<String>,
    usage: Usage,
}

/// Only text is kept. Thinking and any block type added later are dropped.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Block {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

pub(super) fn parse_completion(body: &str) -> Result<Completion, LlmError> {
    let reply: MessagesReply = serde_json::from_str(body).map_err(|e| LlmError::Decode(e.to_string()))?;

    let text = reply
        .content
        .into_iter()
        .filter_map(|block| match block {
            Block::Text { text } => Some(text),
            Block::Other => None,
        })
        .collect();

    Ok(Completion {
        text,
        model: reply.model,
        truncated: reply.stop_reason.as_deref() == Some("max_tokens"),
        usage: TokenUsage { input: reply.usage.input_tokens, output: reply.usage.output_tokens },
    })
}

#[cfg(test)]
#[path = "anthropic_test.rs"]
mod tests;
