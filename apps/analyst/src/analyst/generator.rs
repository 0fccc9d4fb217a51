//! Suggestion generation — the language-model capability and the schema its
//! answers are held to.
//!
//! `SuggestionGenerator` is the seam: production uses `LlmSuggestionGenerator`,
//! tests inject a fake. Implementations return the raw JSON value; nothing
//! downstream trusts it until `validate_suggestion` has accepted it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::prompts::analyst_system_prompt;
use super::AnalystError;
use crate::llm_client::{LlmClient, LlmError};

/// A prompt-in, structured-value-out language-model capability.
///
/// Timeouts and retries belong to the implementation; whatever error it
/// finally reports is surfaced unchanged.
#[async_trait]
pub trait SuggestionGenerator: Send + Sync {
    async fn generate_suggestion(&self, prompt: &str) -> Result<Value, LlmError>;
}

/// Claude-backed generator using the shared `LlmClient`.
pub struct LlmSuggestionGenerator(pub LlmClient);

#[async_trait]
impl SuggestionGenerator for LlmSuggestionGenerator {
    async fn generate_suggestion(&self, prompt: &str) -> Result<Value, LlmError> {
        self.0
            .call_json::<Value>(prompt, &analyst_system_prompt())
            .await
    }
}

/// The only shape accepted from the model: exactly three non-empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatedSuggestion {
    pub phase_id: String,
    pub suggestion_text: String,
    pub reasoning: String,
}

/// Checks a raw model answer against the suggestion schema.
/// Rejects non-objects, missing, unknown, non-string, and blank fields.
pub fn validate_suggestion(raw: Value) -> Result<ValidatedSuggestion, AnalystError> {
    if !raw.is_object() {
        return Err(AnalystError::MalformedSuggestion(format!(
            "expected a JSON object, got {}",
            json_kind(&raw)
        )));
    }

    let suggestion: ValidatedSuggestion = serde_json::from_value(raw)
        .map_err(|e| AnalystError::MalformedSuggestion(e.to_string()))?;

    for (field, value) in [
        ("phase_id", &suggestion.phase_id),
        ("suggestion_text", &suggestion.suggestion_text),
        ("reasoning", &suggestion.reasoning),
    ] {
        if value.trim().is_empty() {
            return Err(AnalystError::MalformedSuggestion(format!(
                "field `{field}` must not be empty"
            )));
        }
    }

    Ok(suggestion)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    fn well_formed() -> Value {
        json!({
            "phase_id": "phase_2",
            "suggestion_text": "Add retry with backoff",
            "reasoning": "Observed repeated transient failures"
        })
    }

    #[test]
    fn test_well_formed_suggestion_is_accepted() {
        let suggestion = validate_suggestion(well_formed()).unwrap();
        assert_eq!(suggestion.phase_id, "phase_2");
        assert_eq!(suggestion.suggestion_text, "Add retry with backoff");
        assert_eq!(suggestion.reasoning, "Observed repeated transient failures");
    }

    #[test]
    fn test_missing_reasoning_is_malformed() {
        let mut raw = well_formed();
        raw.as_object_mut().unwrap().remove("reasoning");
        let err = validate_suggestion(raw).unwrap_err();
        assert!(matches!(err, AnalystError::MalformedSuggestion(msg) if msg.contains("reasoning")));
    }

    #[test]
    fn test_unknown_field_is_malformed() {
        let mut raw = well_formed();
        raw["confidence"] = json!(0.9);
        assert!(matches!(
            validate_suggestion(raw),
            Err(AnalystError::MalformedSuggestion(_))
        ));
    }

    #[test]
    fn test_mistyped_field_is_malformed() {
        let mut raw = well_formed();
        raw["phase_id"] = json!(2);
        assert!(matches!(
            validate_suggestion(raw),
            Err(AnalystError::MalformedSuggestion(_))
        ));
    }

    #[test]
    fn test_blank_field_is_malformed() {
        let mut raw = well_formed();
        raw["suggestion_text"] = json!("   ");
        let err = validate_suggestion(raw).unwrap_err();
        assert!(
            matches!(err, AnalystError::MalformedSuggestion(msg) if msg.contains("suggestion_text"))
        );
    }

    #[test]
    fn test_non_object_is_malformed() {
        let err = validate_suggestion(json!(["phase_2"])).unwrap_err();
        assert!(matches!(err, AnalystError::MalformedSuggestion(msg) if msg.contains("an array")));
    }

    /// Serves a fixed Messages API answer on a loopback port and counts hits.
    async fn stub_messages_api(status: StatusCode, body: Value) -> (LlmClient, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/v1/messages",
                post(move |State(hits): State<Arc<AtomicUsize>>| {
                    let body = body.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        (status, Json(body))
                    }
                }),
            )
            .with_state(Arc::clone(&hits));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = LlmClient::with_endpoint(
            "test-key".to_string(),
            format!("http://{addr}/v1/messages"),
        )
        .unwrap()
        .with_backoff_base(Duration::from_millis(5));
        (client, hits)
    }

    fn text_response(text: &str) -> Value {
        json!({
            "content": [{"type": "text", "text": text}],
            "usage": {"input_tokens": 120, "output_tokens": 40}
        })
    }

    #[tokio::test]
    async fn test_llm_generator_returns_fenced_json_answer() {
        let answer = format!("```json\n{}\n```", well_formed());
        let (client, hits) = stub_messages_api(StatusCode::OK, text_response(&answer)).await;

        let raw = LlmSuggestionGenerator(client)
            .generate_suggestion("prompt")
            .await
            .unwrap();

        assert_eq!(raw, well_formed());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_llm_generator_client_error_is_not_retried() {
        let (client, hits) = stub_messages_api(
            StatusCode::BAD_REQUEST,
            json!({"type": "error", "error": {"type": "invalid_request_error", "message": "max_tokens too large"}}),
        )
        .await;

        let err = LlmSuggestionGenerator(client)
            .generate_suggestion("prompt")
            .await
            .unwrap_err();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(matches!(
            AnalystError::from(err),
            AnalystError::SuggestionGeneration(LlmError::Api { status: 400, ref message })
                if message == "max_tokens too large"
        ));
    }

    #[tokio::test]
    async fn test_llm_generator_gives_up_after_repeated_overload() {
        let (client, hits) = stub_messages_api(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}),
        )
        .await;

        let err = LlmSuggestionGenerator(client)
            .generate_suggestion("prompt")
            .await
            .unwrap_err();

        assert_eq!(hits.load(Ordering::SeqCst), 3);
        match AnalystError::from(err) {
            AnalystError::SuggestionGeneration(LlmError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, LlmError::Api { status: 503, .. }));
            }
            other => panic!("expected exhausted retries, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_llm_generator_prose_answer_is_malformed() {
        let (client, hits) = stub_messages_api(
            StatusCode::OK,
            text_response("I would add a retry with backoff to phase 2."),
        )
        .await;

        let err = LlmSuggestionGenerator(client)
            .generate_suggestion("prompt")
            .await
            .unwrap_err();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(matches!(
            AnalystError::from(err),
            AnalystError::MalformedSuggestion(msg) if msg.starts_with("Model output is not valid JSON")
        ));
    }
}
