//! In-memory adapters backed by `tokio::sync::RwLock`.
//!
//! Cloning an adapter shares its storage. Uniqueness is enforced under the
//! write lock, so concurrent writers cannot both claim the same value.

mod audit_log;
mod employee;
mod event_store;
mod user;

pub use audit_log::InMemoryAuditLogRepository;
pub use employee::InMemoryEmployeeRepository;
pub use event_store::InMemoryEventStore;
pub use user::InMemoryUserRepository;

use chrono::{DateTime, Utc};

fn within(at: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    at >= start && at <= end
}
