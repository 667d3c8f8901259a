//! Persistence ports.
//!
//! The domain depends on these traits only; adapters live with the services.
//! Implementations must be safe for concurrent use and are the final arbiter
//! of uniqueness: a write that collides on a unique field returns
//! [`RepositoryError::Duplicate`](crate::RepositoryError::Duplicate).

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::audit_log::AuditLog;
use crate::employee::Employee;
use crate::error::RepositoryResult;
use crate::events::DomainEvent;
use crate::query::{
    AuditLogFilter, AuditLogSort, EmployeeFilter, EmployeeSort, Page, Pagination, UserFilter,
    UserSort,
};
use crate::role::UserRole;
use crate::status::EmployeeStatus;
use crate::user::User;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn create(&self, employee: &Employee) -> RepositoryResult<()>;

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Employee>>;

    /// Replace the stored record. `NotFound` if it does not exist.
    async fn update(&self, employee: &Employee) -> RepositoryResult<()>;

    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Employee>>;

    /// Direct reports of `manager_id`
    async fn find_by_manager_id(&self, manager_id: Uuid) -> RepositoryResult<Vec<Employee>>;

    async fn find_by_department(&self, department: &str) -> RepositoryResult<Vec<Employee>>;

    async fn find_by_status(&self, status: EmployeeStatus) -> RepositoryResult<Vec<Employee>>;

    async fn list(
        &self,
        filter: &EmployeeFilter,
        sort: EmployeeSort,
        pagination: &Pagination,
    ) -> RepositoryResult<Page<Employee>>;

    async fn count(&self, filter: &EmployeeFilter) -> RepositoryResult<u64>;

    async fn exists_by_email(&self, email: &str) -> RepositoryResult<bool>;

    async fn exists_by_id(&self, id: Uuid) -> RepositoryResult<bool>;

    /// All-or-nothing insert.
    async fn create_many(&self, employees: &[Employee]) -> RepositoryResult<()>;

    async fn update_many(&self, employees: &[Employee]) -> RepositoryResult<()>;

    async fn delete_many(&self, ids: &[Uuid]) -> RepositoryResult<()>;
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> RepositoryResult<()>;

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>>;

    async fn update(&self, user: &User) -> RepositoryResult<()>;

    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    async fn find_by_role(&self, role: UserRole) -> RepositoryResult<Vec<User>>;

    async fn find_by_active_status(&self, is_active: bool) -> RepositoryResult<Vec<User>>;

    async fn list(
        &self,
        filter: &UserFilter,
        sort: UserSort,
        pagination: &Pagination,
    ) -> RepositoryResult<Page<User>>;

    async fn count(&self, filter: &UserFilter) -> RepositoryResult<u64>;

    async fn exists_by_username(&self, username: &str) -> RepositoryResult<bool>;

    async fn exists_by_email(&self, email: &str) -> RepositoryResult<bool>;

    async fn exists_by_id(&self, id: Uuid) -> RepositoryResult<bool>;

    async fn update_last_login(&self, id: Uuid, at: DateTime<Utc>) -> RepositoryResult<()>;

    /// Users with no login since `since`, including those who never logged in.
    async fn get_inactive_users(&self, since: DateTime<Utc>) -> RepositoryResult<Vec<User>>;

    async fn create_many(&self, users: &[User]) -> RepositoryResult<()>;
}

/// Append-only audit trail.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn create(&self, log: &AuditLog) -> RepositoryResult<()>;

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<AuditLog>>;

    async fn find_by_employee_id(&self, employee_id: Uuid) -> RepositoryResult<Vec<AuditLog>>;

    async fn find_by_operation(&self, operation: &str) -> RepositoryResult<Vec<AuditLog>>;

    async fn find_by_user_id(&self, user_id: &str) -> RepositoryResult<Vec<AuditLog>>;

    async fn find_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<AuditLog>>;

    async fn find(
        &self,
        filter: &AuditLogFilter,
        sort: AuditLogSort,
        pagination: &Pagination,
    ) -> RepositoryResult<Page<AuditLog>>;

    async fn count(&self, filter: &AuditLogFilter) -> RepositoryResult<u64>;

    /// Entry count per operation within the range
    async fn get_operations_summary(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<BTreeMap<String, u64>>;

    /// Entries recorded with `user_id` as the actor, oldest first
    async fn get_user_activity(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<AuditLog>>;

    async fn create_many(&self, logs: &[AuditLog]) -> RepositoryResult<()>;

    /// Retention cleanup; returns the number of removed entries.
    async fn delete_old_logs(&self, older_than: DateTime<Utc>) -> RepositoryResult<u64>;
}

/// Append-only event log with per-aggregate version tracking.
///
/// Sequence numbers are assigned on append, starting at 1.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EventStoreRepository: Send + Sync {
    async fn save_event(&self, event: &DomainEvent) -> RepositoryResult<()>;

    async fn get_events_by_aggregate_id(
        &self,
        aggregate_id: Uuid,
    ) -> RepositoryResult<Vec<DomainEvent>>;

    async fn get_events_by_type(&self, event_type: &str) -> RepositoryResult<Vec<DomainEvent>>;

    async fn get_events_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<DomainEvent>>;

    /// Zero for an aggregate with no events
    async fn get_event_version(&self, aggregate_id: Uuid) -> RepositoryResult<i64>;

    async fn update_event_version(&self, aggregate_id: Uuid, version: i64) -> RepositoryResult<()>;

    async fn get_all_events(&self) -> RepositoryResult<Vec<DomainEvent>>;

    async fn get_events_after_sequence(&self, sequence: i64) -> RepositoryResult<Vec<DomainEvent>>;
}
