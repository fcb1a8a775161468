//! In-memory task registry
//!
//! Process-lifetime store of analysis task records, shared between HTTP
//! handlers and background analysis tasks. All synchronization lives behind
//! this interface; no other component touches task state directly. There is
//! no deletion or expiry; growth is bounded by process lifetime and
//! submission volume, which the ephemeral scope accepts.

use std::collections::HashMap;
use std::sync::Arc;

use reqflow_common::{Error, Result};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::TaskRecord;

/// Concurrent key-value store of task records.
///
/// Cloning shares the underlying table; the registry is injected wherever
/// task state is needed rather than living in a global.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<Uuid, TaskRecord>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly created record and return its id.
    ///
    /// Ids are random v4 UUIDs minted at record construction, so they are
    /// collision-free for the process lifetime and carry no ordering.
    pub async fn create(&self, record: TaskRecord) -> Uuid {
        let id = record.id;
        self.tasks.write().await.insert(id, record);
        id
    }

    /// Apply `update` to one record under the table write lock.
    ///
    /// Concurrent readers observe the record either before or after the
    /// update, never partway through.
    pub async fn mutate<F>(&self, id: Uuid, update: F) -> Result<()>
    where
        F: FnOnce(&mut TaskRecord),
    {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&id) {
            Some(record) => {
                update(record);
                Ok(())
            }
            None => Err(Error::NotFound(format!("task {}", id))),
        }
    }

    /// Snapshot of one record, if present
    pub async fn get(&self, id: Uuid) -> Option<TaskRecord> {
        self.tasks.read().await.get(&id).cloned()
    }

    /// Number of records tracked
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use reqflow_common::genome::RequirementGenome;

    #[tokio::test]
    async fn created_record_is_immediately_visible() {
        let registry = TaskRegistry::new();
        let id = registry.create(TaskRecord::new(RequirementGenome::default())).await;

        let record = registry.get(id).await.expect("record should exist");
        assert_eq!(record.id, id);
        assert_eq!(record.status, TaskStatus::Analyzing);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let registry = TaskRegistry::new();
        assert!(registry.get(Uuid::new_v4()).await.is_none());

        let err = registry.mutate(Uuid::new_v4(), |_| {}).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn mutation_is_visible_to_subsequent_reads() {
        let registry = TaskRegistry::new();
        let id = registry.create(TaskRecord::new(RequirementGenome::default())).await;

        registry
            .mutate(id, |record| record.mark_failed("boom".to_string()))
            .await
            .unwrap();

        let record = registry.get(id).await.unwrap();
        assert_eq!(record.status, TaskStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn reads_without_mutation_are_identical() {
        let registry = TaskRegistry::new();
        let id = registry.create(TaskRecord::new(RequirementGenome::default())).await;

        let first = registry.get(id).await.unwrap();
        let second = registry.get(id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn concurrent_readers_see_whole_records() {
        use tokio::task::JoinSet;

        let registry = TaskRegistry::new();
        let id = registry.create(TaskRecord::new(RequirementGenome::default())).await;

        let mut join_set = JoinSet::new();
        for _ in 0..8 {
            let registry = registry.clone();
            join_set.spawn(async move {
                for _ in 0..50 {
                    let record = registry.get(id).await.unwrap();
                    // A settled failure always carries its cause
                    if record.status == TaskStatus::Failed {
                        assert!(record.error.is_some());
                    }
                }
            });
        }

        let writer = registry.clone();
        join_set.spawn(async move {
            writer
                .mutate(id, |record| record.mark_failed("late failure".to_string()))
                .await
                .unwrap();
        });

        while let Some(result) = join_set.join_next().await {
            result.expect("task panicked");
        }
    }
}
