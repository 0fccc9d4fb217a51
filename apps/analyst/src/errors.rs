use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analyst::AnalystError;
use crate::store::StoreError;

/// Service-level error type.
/// Implements `IntoResponse` so handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Analyst(#[from] AnalystError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Analyst(AnalystError::PromptFormat(msg)) => {
                (StatusCode::BAD_REQUEST, "PROMPT_FORMAT_ERROR", msg.clone())
            }
            AppError::Analyst(AnalystError::MalformedSuggestion(msg)) => {
                tracing::warn!("Malformed suggestion from LLM: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "MALFORMED_SUGGESTION",
                    "The language model returned an unusable suggestion".to_string(),
                )
            }
            AppError::Analyst(AnalystError::SuggestionGeneration(e)) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "The language model could not be reached".to_string(),
                )
            }
            AppError::Analyst(AnalystError::Persistence(e)) | AppError::Store(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
