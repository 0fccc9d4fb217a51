//! Suggestion store — scoped-transaction access to recorded process suggestions.
//!
//! The analyst never reaches for a global connection. A `SuggestionStore` is
//! injected at construction, and each write goes through a transaction handle
//! obtained from `open()`:
//!
//! ```text
//! let mut tx = store.open().await?;
//! tx.add(&suggestion).await?;
//! tx.commit().await?;
//! ```
//!
//! A handle that is dropped without `commit()` discards everything added to it.
//! That covers early returns, errors, and a cancelled future alike.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ProcessSuggestion, SuggestionStatus};

pub mod memory;
pub mod postgres;

pub use memory::InMemorySuggestionStore;
pub use postgres::PgSuggestionStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to encode suggestion: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Corrupt suggestion row {id}: {reason}")]
    Decode { id: uuid::Uuid, reason: String },

    #[error("Conflicting record: {0}")]
    Conflict(String),
}

/// Factory for transaction handles, plus read access to committed suggestions.
#[async_trait]
pub trait SuggestionStore: Send + Sync {
    /// Opens a new transaction handle.
    async fn open(&self) -> Result<Box<dyn SuggestionTransaction>, StoreError>;

    /// Lists committed suggestions, newest first, optionally filtered by status.
    async fn list(
        &self,
        status: Option<SuggestionStatus>,
    ) -> Result<Vec<ProcessSuggestion>, StoreError>;
}

/// An open unit of work. Dropping it without `commit` rolls it back.
#[async_trait]
pub trait SuggestionTransaction: Send {
    async fn add(&mut self, suggestion: &ProcessSuggestion) -> Result<(), StoreError>;

    /// Makes every added record visible at once, or none of them.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
