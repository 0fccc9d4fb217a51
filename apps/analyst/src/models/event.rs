//! Triggering events — the inefficiency signals that start a process analysis.
//!
//! Events are a closed set of tagged variants. The serialized form is a JSON
//! object whose `type` field carries the discriminant, e.g.
//! `{"type": "repeated_failure", "step": "build", "occurrences": 3}`.
//! Unknown kinds and missing payload fields are rejected at deserialization,
//! long before a prompt is rendered.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggeringEvent {
    /// The same pipeline step failed several times in a row.
    RepeatedFailure {
        step: String,
        occurrences: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_error: Option<String>,
    },
    /// A task made no observable progress for too long.
    StalledTask { task_id: Uuid, idle_minutes: u64 },
    /// A task was reopened and reworked more often than expected.
    ExcessiveRework { task_id: Uuid, iterations: u32 },
    /// A validator rejected work produced by a phase.
    ValidationRejected {
        phase_id: String,
        rejections: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feedback: Option<String>,
    },
}

impl TriggeringEvent {
    /// The `type` discriminant, used for logging and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            TriggeringEvent::RepeatedFailure { .. } => "repeated_failure",
            TriggeringEvent::StalledTask { .. } => "stalled_task",
            TriggeringEvent::ExcessiveRework { .. } => "excessive_rework",
            TriggeringEvent::ValidationRejected { .. } => "validation_rejected",
        }
    }
}
