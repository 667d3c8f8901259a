use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::{DomainEvent, EventStoreRepository, RepositoryError, RepositoryResult};

use super::within;

#[derive(Default)]
struct Log {
    /// `(sequence, event)`, sequence starting at 1
    events: Vec<(i64, DomainEvent)>,
    versions: HashMap<Uuid, i64>,
}

/// Append-only event log; each append bumps its aggregate's version.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    log: Arc<RwLock<Log>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn event_count(&self) -> usize {
        self.log.read().await.events.len()
    }

    async fn select(&self, keep: impl Fn(i64, &DomainEvent) -> bool) -> Vec<DomainEvent> {
        self.log
            .read()
            .await
            .events
            .iter()
            .filter(|(seq, event)| keep(*seq, event))
            .map(|(_, event)| event.clone())
            .collect()
    }
}

#[async_trait]
impl EventStoreRepository for InMemoryEventStore {
    async fn save_event(&self, event: &DomainEvent) -> RepositoryResult<()> {
        let mut log = self.log.write().await;
        if log.events.iter().any(|(_, e)| e.id == event.id) {
            return Err(RepositoryError::Duplicate { field: "id" });
        }
        let sequence = log.events.len() as i64 + 1;
        log.events.push((sequence, event.clone()));
        *log.versions.entry(event.aggregate_id).or_insert(0) += 1;
        Ok(())
    }

    async fn get_events_by_aggregate_id(
        &self,
        aggregate_id: Uuid,
    ) -> RepositoryResult<Vec<DomainEvent>> {
        Ok(self.select(|_, e| e.aggregate_id == aggregate_id).await)
    }

    async fn get_events_by_type(&self, event_type: &str) -> RepositoryResult<Vec<DomainEvent>> {
        Ok(self.select(|_, e| e.event_type() == event_type).await)
    }

    async fn get_events_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<DomainEvent>> {
        Ok(self.select(|_, e| within(e.timestamp, start, end)).await)
    }

    async fn get_event_version(&self, aggregate_id: Uuid) -> RepositoryResult<i64> {
        Ok(self
            .log
            .read()
            .await
            .versions
            .get(&aggregate_id)
            .copied()
            .unwrap_or(0))
    }

    async fn update_event_version(&self, aggregate_id: Uuid, version: i64) -> RepositoryResult<()> {
        if version < 0 {
            return Err(RepositoryError::InvalidQuery(format!(
                "event version cannot be negative: {version}"
            )));
        }
        self.log.write().await.versions.insert(aggregate_id, version);
        Ok(())
    }

    async fn get_all_events(&self) -> RepositoryResult<Vec<DomainEvent>> {
        Ok(self.select(|_, _| true).await)
    }

    async fn get_events_after_sequence(&self, sequence: i64) -> RepositoryResult<Vec<DomainEvent>> {
        Ok(self.select(|seq, _| seq > sequence).await)
    }
}
