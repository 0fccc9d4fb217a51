//! Process Analyst — turns a workflow-inefficiency event into a recorded
//! suggestion for changing one phase's instructions.
//!
//! Flow: build_analyst_prompt → generator.generate_suggestion →
//!       validate_suggestion → record_suggestion.
//!
//! Each invocation is independent: it owns its prompt, its fresh suggestion id
//! and its transaction. Nothing is retried here; every failure goes back to the
//! caller, and no failure leaves a record behind.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::llm_client::LlmError;
use crate::models::{ProcessSuggestion, Task, TriggeringEvent};
use crate::store::{StoreError, SuggestionStore};

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod recorder;

pub use generator::{LlmSuggestionGenerator, SuggestionGenerator};

use generator::validate_suggestion;
use prompts::build_analyst_prompt;
use recorder::record_suggestion;

#[derive(Debug, Error)]
pub enum AnalystError {
    #[error("Prompt could not be rendered: {0}")]
    PromptFormat(String),

    #[error("Suggestion generation failed: {0}")]
    SuggestionGeneration(#[source] LlmError),

    #[error("Malformed suggestion: {0}")]
    MalformedSuggestion(String),

    #[error("Failed to persist suggestion: {0}")]
    Persistence(#[from] StoreError),
}

impl AnalystError {
    /// The last stage the invocation reached before failing.
    pub fn stage(&self) -> Stage {
        match self {
            AnalystError::PromptFormat(_) => Stage::Started,
            AnalystError::SuggestionGeneration(_) => Stage::Prompted,
            AnalystError::MalformedSuggestion(_) => Stage::Generated,
            AnalystError::Persistence(_) => Stage::Validated,
        }
    }
}

impl From<LlmError> for AnalystError {
    fn from(err: LlmError) -> Self {
        // The model answered, but not with JSON: that is a bad answer, not a failed call.
        if err.is_content_error() {
            AnalystError::MalformedSuggestion(err.to_string())
        } else {
            AnalystError::SuggestionGeneration(err)
        }
    }
}

/// Progress of a single invocation. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Started,
    Prompted,
    Generated,
    Validated,
    Persisted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Started => "started",
            Stage::Prompted => "prompted",
            Stage::Generated => "generated",
            Stage::Validated => "validated",
            Stage::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Analyzes workflow events and records one suggestion per successful run.
/// The generator and the store are injected; the analyst holds no other state.
#[derive(Clone)]
pub struct ProcessAnalyst {
    generator: Arc<dyn SuggestionGenerator>,
    store: Arc<dyn SuggestionStore>,
}

impl ProcessAnalyst {
    pub fn new(generator: Arc<dyn SuggestionGenerator>, store: Arc<dyn SuggestionStore>) -> Self {
        Self { generator, store }
    }

    /// Runs prompt → generate → validate → persist for one event.
    ///
    /// On success exactly one new `ProcessSuggestion` has been committed and is
    /// returned. On failure nothing has been persisted.
    pub async fn analyze_and_suggest(
        &self,
        triggering_event: &TriggeringEvent,
        tasks: &[Task],
        project_context: &str,
    ) -> Result<ProcessSuggestion, AnalystError> {
        info!(
            "Process analyst triggered by: {} ({} tasks)",
            triggering_event.kind(),
            tasks.len()
        );

        let result = self.run(triggering_event, tasks, project_context).await;
        if let Err(err) = &result {
            warn!(
                stage = %err.stage(),
                kind = triggering_event.kind(),
                "Process analysis failed: {err}"
            );
        }
        result
    }

    async fn run(
        &self,
        triggering_event: &TriggeringEvent,
        tasks: &[Task],
        project_context: &str,
    ) -> Result<ProcessSuggestion, AnalystError> {
        let prompt = build_analyst_prompt(triggering_event, tasks, project_context)?;
        debug!(stage = %Stage::Prompted, "Rendered analyst prompt ({} bytes)", prompt.len());

        let raw = self.generator.generate_suggestion(&prompt).await?;
        debug!(stage = %Stage::Generated, "Received suggestion from generator");

        let suggestion = validate_suggestion(raw)?;
        debug!(stage = %Stage::Validated, "Suggestion targets phase {}", suggestion.phase_id);

        let record =
            record_suggestion(self.store.as_ref(), suggestion, triggering_event.clone()).await?;

        info!(
            stage = %Stage::Persisted,
            "Generated and saved suggestion {} for phase {}",
            record.id, record.phase_id
        );
        Ok(record)
    }
}
