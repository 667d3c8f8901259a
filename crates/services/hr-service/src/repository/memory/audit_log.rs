use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::{
    AuditLog, AuditLogFilter, AuditLogRepository, AuditLogSort, Page, Pagination,
    RepositoryError, RepositoryResult,
};

use super::within;

/// Append-only audit trail kept in insertion order.
#[derive(Clone, Default)]
pub struct InMemoryAuditLogRepository {
    logs: Arc<RwLock<Vec<AuditLog>>>,
}

impl InMemoryAuditLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.logs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.logs.read().await.is_empty()
    }

    async fn select(&self, keep: impl Fn(&AuditLog) -> bool) -> Vec<AuditLog> {
        self.logs
            .read()
            .await
            .iter()
            .filter(|log| keep(log))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn create(&self, log: &AuditLog) -> RepositoryResult<()> {
        let mut logs = self.logs.write().await;
        if logs.iter().any(|l| l.id() == log.id()) {
            return Err(RepositoryError::Duplicate { field: "id" });
        }
        logs.push(log.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<AuditLog>> {
        let logs = self.logs.read().await;
        Ok(logs.iter().find(|l| l.id() == id).cloned())
    }

    async fn find_by_employee_id(&self, employee_id: Uuid) -> RepositoryResult<Vec<AuditLog>> {
        Ok(self.select(|l| l.employee_id() == employee_id).await)
    }

    async fn find_by_operation(&self, operation: &str) -> RepositoryResult<Vec<AuditLog>> {
        Ok(self.select(|l| l.operation() == operation).await)
    }

    async fn find_by_user_id(&self, user_id: &str) -> RepositoryResult<Vec<AuditLog>> {
        Ok(self.select(|l| l.user_id() == user_id).await)
    }

    async fn find_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<AuditLog>> {
        Ok(self.select(|l| within(l.timestamp(), start, end)).await)
    }

    async fn find(
        &self,
        filter: &AuditLogFilter,
        sort: AuditLogSort,
        pagination: &Pagination,
    ) -> RepositoryResult<Page<AuditLog>> {
        let mut matching = self.select(|l| filter.matches(l)).await;
        matching.sort_by(|a, b| sort.compare(a, b));
        Page::paginate(matching, pagination, |l| l.id().to_string())
    }

    async fn count(&self, filter: &AuditLogFilter) -> RepositoryResult<u64> {
        let logs = self.logs.read().await;
        Ok(logs.iter().filter(|l| filter.matches(l)).count() as u64)
    }

    async fn get_operations_summary(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<BTreeMap<String, u64>> {
        let logs = self.logs.read().await;
        let mut summary = BTreeMap::new();
        for log in logs.iter().filter(|l| within(l.timestamp(), start, end)) {
            *summary.entry(log.operation().to_string()).or_insert(0) += 1;
        }
        Ok(summary)
    }

    async fn get_user_activity(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<AuditLog>> {
        let mut activity = self
            .select(|l| l.user_id() == user_id && within(l.timestamp(), start, end))
            .await;
        activity.sort_by_key(|l| l.timestamp());
        Ok(activity)
    }

    async fn create_many(&self, logs: &[AuditLog]) -> RepositoryResult<()> {
        let mut stored = self.logs.write().await;
        for (i, log) in logs.iter().enumerate() {
            if stored.iter().chain(&logs[..i]).any(|l| l.id() == log.id()) {
                return Err(RepositoryError::Duplicate { field: "id" });
            }
        }
        stored.extend_from_slice(logs);
        Ok(())
    }

    async fn delete_old_logs(&self, older_than: DateTime<Utc>) -> RepositoryResult<u64> {
        let mut logs = self.logs.write().await;
        let before = logs.len();
        logs.retain(|l| l.timestamp() >= older_than);
        Ok((before - logs.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::{Snapshot, OP_EMPLOYEE_CREATE, OP_EMPLOYEE_UPDATE};

    fn log(employee_id: Uuid, operation: &str, actor: &str) -> AuditLog {
        AuditLog::new(
            employee_id,
            operation,
            actor,
            Snapshot::new(),
            Snapshot::from([("salary".to_string(), 1000.0.into())]),
            "10.0.0.1",
            "tests",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_queries_and_summary() {
        let repo = InMemoryAuditLogRepository::new();
        let subject = Uuid::new_v4();
        repo.create_many(&[
            log(subject, OP_EMPLOYEE_CREATE, "alice"),
            log(subject, OP_EMPLOYEE_UPDATE, "bob"),
            log(Uuid::new_v4(), OP_EMPLOYEE_UPDATE, "alice"),
        ])
        .await
        .unwrap();

        assert_eq!(repo.find_by_employee_id(subject).await.unwrap().len(), 2);
        assert_eq!(repo.find_by_user_id("alice").await.unwrap().len(), 2);

        let now = Utc::now();
        let summary = repo
            .get_operations_summary(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(summary.get(OP_EMPLOYEE_UPDATE), Some(&2));
        assert_eq!(summary.get(OP_EMPLOYEE_CREATE), Some(&1));

        let filter = AuditLogFilter {
            operations: vec![OP_EMPLOYEE_CREATE.to_string()],
            ..AuditLogFilter::default()
        };
        let page = repo
            .find(&filter, AuditLogSort::default(), &Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_delete_old_logs_counts_removed() {
        let repo = InMemoryAuditLogRepository::new();
        repo.create(&log(Uuid::new_v4(), OP_EMPLOYEE_CREATE, "alice"))
            .await
            .unwrap();
        let removed = repo
            .delete_old_logs(Utc::now() - Duration::days(1))
            .await
            .unwrap();
        assert_eq!(removed, 0);
        let removed = repo
            .delete_old_logs(Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let repo = InMemoryAuditLogRepository::new();
        let entry = log(Uuid::new_v4(), OP_EMPLOYEE_CREATE, "alice");
        repo.create(&entry).await.unwrap();
        assert_eq!(
            repo.create(&entry).await.unwrap_err(),
            RepositoryError::Duplicate { field: "id" }
        );
    }
}
