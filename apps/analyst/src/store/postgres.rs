//! PostgreSQL-backed suggestion store.
//!
//! Expects the `process_suggestions` table to already exist:
//!
//! ```sql
//! CREATE TABLE process_suggestions (
//!     id               UUID PRIMARY KEY,
//!     phase_id         TEXT NOT NULL,
//!     suggestion_text  TEXT NOT NULL,
//!     reasoning        TEXT NOT NULL,
//!     triggering_event JSONB NOT NULL,
//!     status           TEXT NOT NULL DEFAULT 'pending',
//!     created_at       TIMESTAMPTZ NOT NULL DEFAULT now()
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::{StoreError, SuggestionStore, SuggestionTransaction};
use crate::models::{ProcessSuggestion, SuggestionStatus};

#[derive(Debug, Clone, FromRow)]
pub struct ProcessSuggestionRow {
    pub id: Uuid,
    pub phase_id: String,
    pub suggestion_text: String,
    pub reasoning: String,
    pub triggering_event: Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ProcessSuggestionRow> for ProcessSuggestion {
    type Error = StoreError;

    fn try_from(row: ProcessSuggestionRow) -> Result<Self, Self::Error> {
        let triggering_event =
            serde_json::from_value(row.triggering_event).map_err(|e| StoreError::Decode {
                id: row.id,
                reason: format!("triggering_event: {e}"),
            })?;
        let status = row
            .status
            .parse::<SuggestionStatus>()
            .map_err(|reason| StoreError::Decode { id: row.id, reason })?;

        Ok(ProcessSuggestion {
            id: row.id,
            phase_id: row.phase_id,
            suggestion_text: row.suggestion_text,
            reasoning: row.reasoning,
            triggering_event,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgSuggestionStore {
    pool: PgPool,
}

impl PgSuggestionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SuggestionStore for PgSuggestionStore {
    async fn open(&self) -> Result<Box<dyn SuggestionTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSuggestionTransaction { tx }))
    }

    async fn list(
        &self,
        status: Option<SuggestionStatus>,
    ) -> Result<Vec<ProcessSuggestion>, StoreError> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, ProcessSuggestionRow>(
                    "SELECT * FROM process_suggestions WHERE status = $1 ORDER BY created_at DESC",
                )
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ProcessSuggestionRow>(
                    "SELECT * FROM process_suggestions ORDER BY created_at DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(ProcessSuggestion::try_from).collect()
    }
}

/// Wraps a sqlx transaction; sqlx rolls it back when dropped uncommitted.
struct PgSuggestionTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SuggestionTransaction for PgSuggestionTransaction {
    async fn add(&mut self, suggestion: &ProcessSuggestion) -> Result<(), StoreError> {
        let event_value = serde_json::to_value(&suggestion.triggering_event)?;

        sqlx::query(
            r#"
            INSERT INTO process_suggestions
                (id, phase_id, suggestion_text, reasoning, triggering_event, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(suggestion.id)
        .bind(&suggestion.phase_id)
        .bind(&suggestion.suggestion_text)
        .bind(&suggestion.reasoning)
        .bind(&event_value)
        .bind(suggestion.status.as_str())
        .bind(suggestion.created_at)
        .execute(&mut *self.tx)
        .await?;

        debug!("Staged process suggestion {}", suggestion.id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
