//! Suggestion recorder — turns a validated suggestion into a durable record.

use tracing::debug;

use super::generator::ValidatedSuggestion;
use super::AnalystError;
use crate::models::{ProcessSuggestion, TriggeringEvent};
use crate::store::SuggestionStore;

/// Writes one new suggestion inside a single transaction.
///
/// The transaction handle is dropped on every early return, which discards
/// anything staged; only a successful `commit` makes the record visible.
pub async fn record_suggestion(
    store: &dyn SuggestionStore,
    suggestion: ValidatedSuggestion,
    triggering_event: TriggeringEvent,
) -> Result<ProcessSuggestion, AnalystError> {
    let ValidatedSuggestion {
        phase_id,
        suggestion_text,
        reasoning,
    } = suggestion;
    let record = ProcessSuggestion::new(phase_id, suggestion_text, reasoning, triggering_event);

    let mut tx = store.open().await?;
    tx.add(&record).await?;
    tx.commit().await?;

    debug!("Committed process suggestion {}", record.id);
    Ok(record)
}
