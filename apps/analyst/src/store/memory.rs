//! In-process suggestion store. Used when no `DATABASE_URL` is configured,
//! and as the default store in tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{StoreError, SuggestionStore, SuggestionTransaction};
use crate::models::{ProcessSuggestion, SuggestionStatus};

#[derive(Clone, Default)]
pub struct InMemorySuggestionStore {
    committed: Arc<Mutex<Vec<ProcessSuggestion>>>,
}

impl InMemorySuggestionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SuggestionStore for InMemorySuggestionStore {
    async fn open(&self) -> Result<Box<dyn SuggestionTransaction>, StoreError> {
        Ok(Box::new(InMemoryTransaction {
            staged: Vec::new(),
            committed: Arc::clone(&self.committed),
        }))
    }

    async fn list(
        &self,
        status: Option<SuggestionStatus>,
    ) -> Result<Vec<ProcessSuggestion>, StoreError> {
        let committed = self.committed.lock().await;
        // Commit order is insertion order, so reversing yields newest first.
        Ok(committed
            .iter()
            .rev()
            .filter(|s| status.map_or(true, |wanted| s.status == wanted))
            .cloned()
            .collect())
    }
}

/// Staged records live only in this handle until `commit`.
struct InMemoryTransaction {
    staged: Vec<ProcessSuggestion>,
    committed: Arc<Mutex<Vec<ProcessSuggestion>>>,
}

#[async_trait]
impl SuggestionTransaction for InMemoryTransaction {
    async fn add(&mut self, suggestion: &ProcessSuggestion) -> Result<(), StoreError> {
        self.staged.push(suggestion.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryTransaction { staged, committed } = *self;
        let mut committed = committed.lock().await;
        if let Some(dup) = staged
            .iter()
            .find(|s| committed.iter().any(|c| c.id == s.id))
        {
            return Err(StoreError::Conflict(format!(
                "duplicate suggestion id {}",
                dup.id
            )));
        }
        committed.extend(staged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TriggeringEvent;

    fn suggestion(phase: &str) -> ProcessSuggestion {
        ProcessSuggestion::new(
            phase.to_string(),
            "Split the phase into two".to_string(),
            "Tasks keep stalling midway".to_string(),
            TriggeringEvent::StalledTask {
                task_id: uuid::Uuid::new_v4(),
                idle_minutes: 120,
            },
        )
    }

    #[tokio::test]
    async fn test_committed_record_is_listed() {
        let store = InMemorySuggestionStore::new();
        let record = suggestion("phase_1");

        let mut tx = store.open().await.unwrap();
        tx.add(&record).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.list(None).await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_dropped_transaction_leaves_nothing_behind() {
        let store = InMemorySuggestionStore::new();
        {
            let mut tx = store.open().await.unwrap();
            tx.add(&suggestion("phase_1")).await.unwrap();
        }
        assert!(store.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_uncommitted_record_is_invisible_to_readers() {
        let store = InMemorySuggestionStore::new();
        let mut tx = store.open().await.unwrap();
        tx.add(&suggestion("phase_1")).await.unwrap();

        assert!(store.list(None).await.unwrap().is_empty());

        tx.commit().await.unwrap();
        assert_eq!(store.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_filters_by_status() {
        let store = InMemorySuggestionStore::new();
        let first = suggestion("phase_1");
        let mut second = suggestion("phase_2");
        second.status = SuggestionStatus::Approved;

        for record in [&first, &second] {
            let mut tx = store.open().await.unwrap();
            tx.add(record).await.unwrap();
            tx.commit().await.unwrap();
        }

        let all = store.list(None).await.unwrap();
        assert_eq!(all[0].phase_id, "phase_2");
        assert_eq!(all[1].phase_id, "phase_1");

        let pending = store.list(Some(SuggestionStatus::Pending)).await.unwrap();
        assert_eq!(pending, vec![first]);
    }

    #[tokio::test]
    async fn test_duplicate_id_commit_is_rejected_atomically() {
        let store = InMemorySuggestionStore::new();
        let record = suggestion("phase_1");

        let mut tx = store.open().await.unwrap();
        tx.add(&record).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.open().await.unwrap();
        tx.add(&suggestion("phase_2")).await.unwrap();
        tx.add(&record).await.unwrap();
        assert!(tx.commit().await.is_err());

        assert_eq!(store.list(None).await.unwrap().len(), 1);
    }
}
