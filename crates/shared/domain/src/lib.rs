//! Domain layer - HR aggregates, rules and ports.
//!
//! Pure domain logic: no transport, storage or runtime dependencies beyond
//! the async repository traits services program against.

pub mod address;
pub mod audit_log;
pub mod constants;
pub mod dispatcher;
pub mod employee;
pub mod error;
pub mod events;
pub mod password;
pub mod query;
pub mod repository;
pub mod role;
pub mod status;
pub mod user;
pub mod validation;
pub mod value;

pub use address::Address;
pub use audit_log::{AuditLog, FieldChange};
pub use constants::*;
pub use dispatcher::{DispatchError, EventDispatcher, EventHandler, HandlerError};
pub use employee::{Employee, EmployeeUpdate, NewEmployee};
pub use error::{DomainError, DomainResult, RepositoryError, RepositoryResult};
pub use events::{DomainEvent, EventKind, PasswordChangeMethod, SalaryChangeType};
pub use password::Password;
pub use query::{
    AuditLogFilter, AuditLogSort, AuditLogSortField, EmployeeFilter, EmployeeSort,
    EmployeeSortField, Page, PageCursors, Pagination, SortDirection, UserFilter, UserSort,
    UserSortField,
};
pub use repository::{
    AuditLogRepository, EmployeeRepository, EventStoreRepository, UserRepository,
};
pub use role::{Permission, UserRole};
pub use status::EmployeeStatus;
pub use user::{User, UserUpdate};
pub use value::{FieldValue, Snapshot};

#[cfg(any(test, feature = "test-utils"))]
pub use dispatcher::MockEventHandler;
#[cfg(any(test, feature = "test-utils"))]
pub use repository::{
    MockAuditLogRepository, MockEmployeeRepository, MockEventStoreRepository, MockUserRepository,
};
