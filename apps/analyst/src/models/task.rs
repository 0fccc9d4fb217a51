use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pipeline task as seen by the analyst. Read-only here; only
/// `enriched_description` is rendered into the prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    pub enriched_description: String,
}

impl Task {
    pub fn new(enriched_description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: String::new(),
            enriched_description: enriched_description.into(),
        }
    }
}
