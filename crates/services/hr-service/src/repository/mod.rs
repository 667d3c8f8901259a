//! Repository adapters for the domain ports.

pub mod memory;

pub use memory::{
    InMemoryAuditLogRepository, InMemoryEmployeeRepository, InMemoryEventStore,
    InMemoryUserRepository,
};
