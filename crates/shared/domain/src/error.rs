//! Domain-level errors.
//!
//! These errors represent business rule violations and domain logic failures.
//! They are independent of infrastructure concerns (HTTP, gRPC, database).

use thiserror::Error;

use crate::status::EmployeeStatus;

/// Domain-specific errors for business rule violations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Validation failed for a field or input
    #[error("{0}")]
    Validation(String),

    #[error("invalid employee status: {0}")]
    InvalidStatus(String),

    #[error("invalid user role: {0}")]
    InvalidRole(String),

    /// Terminated employees cannot change status
    #[error("invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: EmployeeStatus,
        to: EmployeeStatus,
    },

    /// Mutation refused because the employee is terminated
    #[error("cannot update {0} for terminated employees")]
    EmployeeTerminated(&'static str),

    #[error("employee cannot be their own manager")]
    SelfManagement,

    /// Password does not meet strength requirements
    #[error("password is too weak: {0}")]
    WeakPassword(String),

    #[error("current password is incorrect")]
    IncorrectPassword,

    #[error("user is already active")]
    UserAlreadyActive,

    #[error("user is already inactive")]
    UserAlreadyInactive,

    /// Hashing backend failure
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl DomainError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    /// Create a weak password error
    pub fn weak_password(msg: impl Into<String>) -> Self {
        DomainError::WeakPassword(msg.into())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Errors raised by persistence adapters behind the repository ports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    /// A unique constraint rejected the write
    #[error("duplicate value for unique field '{field}'")]
    Duplicate { field: &'static str },

    /// Malformed filter, sort or pagination input
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("repository backend error: {0}")]
    Backend(String),
}

impl RepositoryError {
    pub fn backend(msg: impl Into<String>) -> Self {
        RepositoryError::Backend(msg.into())
    }
}

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;
