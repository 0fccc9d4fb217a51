//! Axum route handlers for the Process Analyst API.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{ProcessSuggestion, SuggestionStatus, Task, TriggeringEvent};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub triggering_event: TriggeringEvent,
    #[serde(default)]
    pub tasks: Vec<Task>,
    pub project_context: String,
}

#[derive(Debug, Deserialize)]
pub struct ListSuggestionsQuery {
    pub status: Option<SuggestionStatus>,
}

/// POST /api/v1/process-analysis
///
/// Runs one analysis and returns the suggestion it recorded.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<(StatusCode, Json<ProcessSuggestion>), AppError> {
    if request.project_context.trim().is_empty() {
        return Err(AppError::Validation(
            "project_context cannot be empty".to_string(),
        ));
    }

    let suggestion = state
        .analyst
        .analyze_and_suggest(
            &request.triggering_event,
            &request.tasks,
            &request.project_context,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(suggestion)))
}

/// GET /api/v1/process-suggestions?status=pending
///
/// Lists recorded suggestions, newest first.
pub async fn handle_list_suggestions(
    State(state): State<AppState>,
    Query(query): Query<ListSuggestionsQuery>,
) -> Result<Json<Vec<ProcessSuggestion>>, AppError> {
    let suggestions = state.suggestions.list(query.status).await?;
    Ok(Json(suggestions))
}
