use std::sync::Arc;

use crate::analyst::{ProcessAnalyst, SuggestionGenerator};
use crate::store::SuggestionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub analyst: ProcessAnalyst,
    /// Same store the analyst writes to; handlers only read from it.
    pub suggestions: Arc<dyn SuggestionStore>,
}

impl AppState {
    pub fn new(
        generator: Arc<dyn SuggestionGenerator>,
        store: Arc<dyn SuggestionStore>,
    ) -> Self {
        Self {
            analyst: ProcessAnalyst::new(generator, Arc::clone(&store)),
            suggestions: store,
        }
    }
}
