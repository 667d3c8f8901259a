//! Service-level errors.

use common::AppError;
use domain::{DomainError, RepositoryError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("employee not found")]
    EmployeeNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("email already exists")]
    EmailAlreadyExists,

    #[error("username already exists")]
    UsernameAlreadyExists,

    #[error("manager not found")]
    ManagerNotFound,

    #[error("cannot delete employee with direct reports")]
    EmployeeHasDirectReports,

    /// Unknown user or wrong password; the two are indistinguishable
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user account is not active")]
    UserNotActive,

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{context}: {source}")]
    Repository {
        context: &'static str,
        #[source]
        source: RepositoryError,
    },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Wrap a repository failure with the step that raised it.
    pub fn repository(context: &'static str) -> impl FnOnce(RepositoryError) -> Self {
        move |source| ServiceError::Repository { context, source }
    }

    /// Like [`repository`](Self::repository), but a unique-constraint
    /// violation on a write becomes the matching conflict error.
    pub fn write(context: &'static str) -> impl FnOnce(RepositoryError) -> Self {
        move |source| match source {
            RepositoryError::Duplicate { field: "email" } => ServiceError::EmailAlreadyExists,
            RepositoryError::Duplicate { field: "username" } => ServiceError::UsernameAlreadyExists,
            source => ServiceError::Repository { context, source },
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::EmployeeNotFound => AppError::NotFound("Employee".to_string()),
            ServiceError::UserNotFound => AppError::NotFound("User".to_string()),
            ServiceError::EmailAlreadyExists => AppError::conflict("Email"),
            ServiceError::UsernameAlreadyExists => AppError::conflict("Username"),
            ServiceError::ManagerNotFound | ServiceError::EmployeeHasDirectReports => {
                AppError::PreconditionFailed(err.to_string())
            }
            ServiceError::InvalidCredentials => AppError::InvalidCredentials,
            ServiceError::UserNotActive => AppError::Forbidden(err.to_string()),
            ServiceError::Cancelled => AppError::Cancelled,
            ServiceError::Domain(e) => e.into(),
            ServiceError::Repository { context, source } => match source {
                RepositoryError::InvalidQuery(msg) => AppError::BadRequest(msg),
                source => AppError::internal(format!("{context}: {source}")),
            },
        }
    }
}
