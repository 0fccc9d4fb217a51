use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::TriggeringEvent;

/// Review status of a recorded suggestion.
/// The analyst only ever creates `Pending`; the other states are set by reviewers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Approved => "approved",
            SuggestionStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuggestionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SuggestionStatus::Pending),
            "approved" => Ok(SuggestionStatus::Approved),
            "rejected" => Ok(SuggestionStatus::Rejected),
            other => Err(format!("unknown suggestion status '{other}'")),
        }
    }
}

/// A proposed change to one phase's instructions, with the reasoning behind it
/// and the event that prompted it.
///
/// Created once per successful analysis. Never updated or deleted by the analyst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSuggestion {
    pub id: Uuid,
    pub phase_id: String,
    pub suggestion_text: String,
    pub reasoning: String,
    pub triggering_event: TriggeringEvent,
    pub status: SuggestionStatus,
    pub created_at: DateTime<Utc>,
}

impl ProcessSuggestion {
    /// Builds a new pending suggestion with a fresh id.
    pub fn new(
        phase_id: String,
        suggestion_text: String,
        reasoning: String,
        triggering_event: TriggeringEvent,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase_id,
            suggestion_text,
            reasoning,
            triggering_event,
            status: SuggestionStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
