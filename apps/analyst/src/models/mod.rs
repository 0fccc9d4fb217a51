pub mod event;
pub mod suggestion;
pub mod task;

pub use event::TriggeringEvent;
pub use suggestion::{ProcessSuggestion, SuggestionStatus};
pub use task::Task;
