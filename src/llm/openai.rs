//! Chat-completions endpoints (`{base}/chat/completions`).
//!
//! OpenAI itself, Gemini's compatibility layer and most local gateways
//! accept this shape, so `LLM_OPENAI_BASE_URL` is the only switch needed.

use serde::{Deserialize, Serialize};

use super::types::{Completion, LlmError, Message, Role, TokenUsage};

pub(super) struct OpenAi {
    api_key: String,
    endpoint: String,
}

impl OpenAi {
    pub(super) fn new(api_key: String, base_url: &str) -> Self {
        Self { api_key, endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')) }
    }

    pub(super) fn request(
        &self,
        http: &reqwest::Client,
        model: &str,
        max_tokens: u32,
        system: &str,
        messages: &[Message],
    ) -> reqwest::RequestBuilder {
        http.post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest { model, max_tokens, messages: with_system(system, messages) })
    }
}

/// The system prompt travels as the first message. Blank prompts are
/// omitted.
fn with_system(system: &str, messages: &[Message]) -> Vec<Message> {
    let system = system.trim();
    let lead = (!system.is_empty()).then(|| Message { role: Role::System, content: system.to_string() });
    lead.into_iter().chain(messages.iter().cloned()).collect()
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct CompletionReply {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

pub(super) fn parse_completion(body: &str) -> Result<Completion, LlmError> {
    let reply: CompletionReply = serde_json::from_str(body).map_err(|e| LlmError::Decode(e.to_string()))?;
    let choice = reply
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Decode("reply has no choices".into()))?;

    let usage = reply.usage.map_or(TokenUsage::default(), |u| TokenUsage {
        input: u.prompt_tokens,
        output: u.completion_tokens,
    });

    Ok(Completion {
        text: choice.message.and_then(|m| m.content).unwrap_or_default(),
        model: reply.model,
        truncated: choice.finish_reason.as_deref() == Some("length"),
        usage,
    })
}

#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;
