//! Gift suggestions: list contents in, `{name, description}` pairs out.
//!
//! DESIGN
//! ======
//! The model is asked for `{"suggestions": [...]}`, but replies drift: code
//! fences, a sentence before the JSON, or a bare array. Parsing accepts all
//! of those. A reply that still does not parse is logged and treated as
//! "no suggestions" rather than an error.
//!
//! The rate limiter is consulted only once a request would actually reach
//! the model, so unknown or empty lists never spend quota.

use std::fmt::Write;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::llm::types::{LlmChat, LlmError, Message};
use crate::models::List;
use crate::rate_limit::{RateLimitError, RateLimiter};

pub const SYSTEM_PROMPT: &str = "I'm putting together a gift list and need suggestions on what to add. \
Make sure the suggestions are related to the list I provide. \
Provide at least one suggestion for every two items in the provided list. \
Provide your suggestions in the form of a JSON array in an object called 'suggestions'. \
Return the following JSON for each suggestion: {\"name\": string, \"description\": string}. \
Respond with JSON only.";

const PROMPT_HEADER: &str =
    "Here is my current list of items. Please give me at least two suggestions (preferably more) to add to the list.\n";

#[derive(Debug, thiserror::Error)]
pub enum SuggestionError {
    #[error("list has no items")]
    EmptyList,
    #[error("LLM not configured")]
    NotConfigured,
    #[error(transparent)]
    RateLimited(#[from] RateLimitError),
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
struct Envelope {
    suggestions: Vec<Suggestion>,
}

/// Describe the list's items for the model.
#[must_use]
pub fn build_prompt(list: &List) -> String {
    let mut prompt = String::from(PROMPT_HEADER);
    for item in &list.items {
        let _ = writeln!(prompt, "Item: {}", item.name);
        if !item.url.is_empty() {
            let _ = writeln!(prompt, "URL: {}", item.url);
        }
        if !item.details.is_empty() {
            let _ = writeln!(prompt, "Details: {}", item.details);
        }
    }
    prompt
}

/// Body of the first fenced code block, or the input when there is none.
fn strip_fences(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after = &text[open + 3..];
    // Skip the info string (`json`) up to the end of the fence line.
    let body_start = after.find('\n').map_or(0, |i| i + 1);
    let body = &after[body_start..];
    body.find("```").map_or(body, |close| &body[..close])
}

fn between(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

fn parse_json(candidate: &str) -> Option<Vec<Suggestion>> {
    let candidate = candidate.trim();
    if let Ok(env) = serde_json::from_str::<Envelope>(candidate) {
        return Some(env.suggestions);
    }
    serde_json::from_str::<Vec<Suggestion>>(candidate).ok()
}

/// Extract suggestions from a model reply. `None` if nothing parses.
#[must_use]
pub fn parse_suggestions(reply: &str) -> Option<Vec<Suggestion>> {
    let body = strip_fences(reply);
    parse_json(body)
        .or_else(|| between(body, '{', '}').and_then(parse_json))
        .or_else(|| between(body, '[', ']').and_then(parse_json))
}

/// Ask the model for additions to `list`.
///
/// # Errors
///
/// Returns [`SuggestionError::EmptyList`] before any call when the list has
/// no items, [`SuggestionError::NotConfigured`] without a model,
/// [`SuggestionError::RateLimited`] when `limiter` refuses the call, and
/// [`SuggestionError::Llm`] if the call fails.
pub async fn get_suggestions(
    llm: Option<&dyn LlmChat>,
    limiter: &RateLimiter,
    list: &List,
    max_tokens: u32,
) -> Result<Vec<Suggestion>, SuggestionError> {
    if list.items.is_empty() {
        return Err(SuggestionError::EmptyList);
    }
    let llm = llm.ok_or(SuggestionError::NotConfigured)?;
    limiter.check_and_record(list.id)?;

    let messages = [Message::user(build_prompt(list))];
    let completion = llm.chat(max_tokens, SYSTEM_PROMPT, &messages).await?;
    let reply = completion.text.as_str();

    match parse_suggestions(reply) {
        Some(suggestions) => {
            info!(
                list_id = %list.id,
                count = suggestions.len(),
                input_tokens = completion.usage.input,
                output_tokens = completion.usage.output,
                truncated = completion.truncated,
                "suggestions generated"
            );
            Ok(suggestions)
        }
        None => {
            warn!(
                list_id = %list.id,
                truncated = completion.truncated,
                reply_len = reply.len(),
                "unparseable suggestion reply"
            );
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
#[path = "suggestions_test.rs"]
mod tests;
