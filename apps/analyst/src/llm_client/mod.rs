//! LLM Client — the single point of entry for all Claude API calls made by the analyst.
//!
//! No other module talks to the Anthropic API directly. The client owns the
//! transport policy (request timeout, retry with exponential backoff on 429 and
//! 5xx); callers only ever see the final `Result`.
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all analyst calls. Hardcoded to prevent drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 2048;
const MAX_ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const BACKOFF_BASE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model output is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<LlmError> },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// True when the model answered but its content was unusable,
    /// as opposed to the request itself failing.
    pub fn is_content_error(&self) -> bool {
        matches!(self, LlmError::Parse(_) | LlmError::EmptyContent)
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Concatenates every text block, in order.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Outcome of a single HTTP round trip.
enum Attempt {
    Done(LlmResponse),
    Retry(LlmError),
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    backoff_base: Duration,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Self::with_endpoint(api_key, ANTHROPIC_API_URL.to_string())
    }

    /// Targets a different Messages endpoint (gateway, proxy, local stub).
    pub fn with_endpoint(api_key: String, endpoint: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            endpoint,
            backoff_base: BACKOFF_BASE,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Sends one user message and returns the raw response.
    /// Transport errors, 429 and 5xx are retried; other API errors are not.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let body = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let last = match self.send_once(&body).await? {
                Attempt::Done(response) => {
                    debug!(
                        "LLM call succeeded: input_tokens={}, output_tokens={}",
                        response.usage.input_tokens, response.usage.output_tokens
                    );
                    return Ok(response);
                }
                Attempt::Retry(err) => err,
            };

            if attempt >= MAX_ATTEMPTS {
                return Err(LlmError::Exhausted {
                    attempts: attempt,
                    last: Box::new(last),
                });
            }

            let delay = backoff_delay(self.backoff_base, attempt);
            warn!(
                "LLM call attempt {attempt} failed ({last}), retrying after {}ms",
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn send_once(&self, body: &MessagesRequest<'_>) -> Result<Attempt, LlmError> {
        let response = match self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return Ok(Attempt::Retry(LlmError::Http(e))),
        };

        let status = response.status();
        if status.is_success() {
            return Ok(Attempt::Done(response.json().await?));
        }

        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&raw)
            .map(|e| e.error.message)
            .unwrap_or(raw);
        let err = LlmError::Api {
            status: status.as_u16(),
            message,
        };

        if is_retryable(status) {
            Ok(Attempt::Retry(err))
        } else {
            Err(err)
        }
    }

    /// Calls the LLM and deserializes its text as JSON.
    /// The prompt must ask the model for a bare JSON value.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let response = self.call(prompt, system).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        Ok(serde_json::from_str(extract_json(&text))?)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// base, 2*base, 4*base, ... for attempts 1, 2, 3, ...
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * (1u32 << attempt.saturating_sub(1).min(6))
}

/// Pulls the JSON payload out of model output: strips ``` fences, then trims
/// any prose before the first `{`/`[` and after the matching last `}`/`]`.
fn extract_json(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        text = rest.trim().strip_suffix("```").unwrap_or(rest).trim();
    }

    let start = text.find(&['{', '['][..]);
    let end = text.rfind(&['}', ']'][..]);
    match (start, end) {
        (Some(start), Some(end)) if start <= end => &text[start..=end],
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_with_json_fence() {
        let input = "```json\n{\"phase_id\": \"p1\"}\n```";
        assert_eq!(extract_json(input), "{\"phase_id\": \"p1\"}");
    }

    #[test]
    fn test_extract_json_with_bare_fence() {
        let input = "```\n{\"phase_id\": \"p1\"}\n```";
        assert_eq!(extract_json(input), "{\"phase_id\": \"p1\"}");
    }

    #[test]
    fn test_extract_json_strips_surrounding_prose() {
        let input = "Here is my suggestion:\n{\"phase_id\": \"p1\"}\nHope this helps.";
        assert_eq!(extract_json(input), "{\"phase_id\": \"p1\"}");
    }

    #[test]
    fn test_extract_json_leaves_non_json_alone() {
        assert_eq!(extract_json("  no json here "), "no json here");
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        assert_eq!(backoff_delay(BACKOFF_BASE, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(BACKOFF_BASE, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(BACKOFF_BASE, 3), Duration::from_secs(4));
        assert_eq!(
            backoff_delay(Duration::from_millis(10), 3),
            Duration::from_millis(40)
        );
    }

    #[test]
    fn test_only_rate_limits_and_server_errors_are_retried() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_response_text_joins_text_blocks() {
        let response: LlmResponse = serde_json::from_str(
            r#"{
                "content": [
                    {"type": "text", "text": "{\"a\":"},
                    {"type": "tool_use"},
                    {"type": "text", "text": "1}"}
                ],
                "usage": {"input_tokens": 10, "output_tokens": 4}
            }"#,
        )
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_content_errors_are_distinguished_from_transport() {
        let parse = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        assert!(LlmError::Parse(parse).is_content_error());
        assert!(LlmError::EmptyContent.is_content_error());
        assert!(!LlmError::Api {
            status: 500,
            message: "boom".into()
        }
        .is_content_error());
    }
}
