//! Generative gateways: document-to-question extraction and essay grading.
//!
//! Both speak the chat-completions wire format and share the model fallback
//! ladder. Missing credentials disable the gateways instead of failing.

use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

mod extraction;
mod grading;
mod ladder;

pub use extraction::{ExtractionGateway, GenerationCounts, SourceDocument};
pub use grading::{EssayVerdict, GradingGateway};

/// Candidate models tried in preference order when none are configured.
const DEFAULT_MODELS: [&str; 3] = ["gpt-4o-mini", "gpt-4.1-mini", "gpt-4o"];

/// Fixed wait before the single same-model retry on a quota error.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct AiGatewayConfig {
    pub base_url: String,
    pub api_key: String,
    /// Fallback ladder, tried in order until one model succeeds.
    pub models: Vec<String>,
    pub retry_delay: Duration,
}

impl AiGatewayConfig {
    /// Read the gateway configuration from the environment.
    ///
    /// Returns `None` when `STUDY_AI_API_KEY` is unset or blank; callers
    /// treat that as "feature disabled", not as an error.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("STUDY_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("STUDY_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let models = env::var("STUDY_AI_MODELS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|models| !models.is_empty())
            .unwrap_or_else(Self::default_models);
        Some(Self {
            base_url,
            api_key,
            models,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    #[must_use]
    pub fn default_models() -> Vec<String> {
        DEFAULT_MODELS.iter().map(|m| (*m).to_string()).collect()
    }

    /// Override the quota retry delay (tests use `Duration::ZERO`).
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

//
// ─── CHAT COMPLETIONS WIRE FORMAT ──────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// One chat-completion round trip against a specific model.
///
/// Quota exhaustion (HTTP 429) maps to `GatewayError::RateLimited` so the
/// ladder can apply its retry-once policy; every other failure is terminal
/// for this model and moves the ladder on.
pub(crate) async fn chat_complete(
    client: &Client,
    config: &AiGatewayConfig,
    model: &str,
    prompt: &str,
) -> Result<String, GatewayError> {
    let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
    let payload = ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage {
            role: "user",
            content: prompt.to_string(),
        }],
        temperature: 0.2,
    };

    let response = client
        .post(url)
        .bearer_auth(&config.api_key)
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GatewayError::RateLimited {
            model: model.to_string(),
        });
    }
    if !status.is_success() {
        return Err(GatewayError::HttpStatus(status));
    }

    let body: ChatResponse = response.json().await?;
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(GatewayError::EmptyResponse)?;

    Ok(content.trim().to_string())
}

/// Strips a surrounding markdown code fence, if any.
///
/// Chat models frequently wrap the requested JSON in ```json fences even
/// when told not to; the payload inside is what we want to parse.
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_code_fence_handles_fenced_and_bare_payloads() {
        assert_eq!(strip_code_fence("[1, 2]"), "[1, 2]");
        assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("```\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("  [1, 2]  "), "[1, 2]");
    }

    #[test]
    fn default_models_are_non_empty() {
        assert!(!AiGatewayConfig::default_models().is_empty());
    }
}
