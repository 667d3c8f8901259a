//! Domain events emitted after successful state changes.
//!
//! An event is a [`DomainEvent`] envelope (identity, aggregate, timestamp,
//! schema version) around an [`EventKind`] carrying the typed payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit_log::AuditLog;
use crate::constants::EVENT_SCHEMA_VERSION;
use crate::employee::Employee;
use crate::role::UserRole;
use crate::status::EmployeeStatus;
use crate::user::User;
use crate::value::Snapshot;

/// Event type names on the wire.
pub mod event_types {
    pub const EMPLOYEE_CREATED: &str = "employee.created";
    pub const EMPLOYEE_UPDATED: &str = "employee.updated";
    pub const EMPLOYEE_DELETED: &str = "employee.deleted";
    pub const EMPLOYEE_STATUS_CHANGED: &str = "employee.status_changed";
    pub const EMPLOYEE_SALARY_CHANGED: &str = "employee.salary_changed";
    pub const USER_CREATED: &str = "user.created";
    pub const USER_LOGGED_IN: &str = "user.logged_in";
    pub const USER_PASSWORD_CHANGED: &str = "user.password_changed";
    pub const USER_ACTIVATED: &str = "user.activated";
    pub const USER_DEACTIVATED: &str = "user.deactivated";
    pub const AUDIT_LOG_CREATED: &str = "audit_log.created";

    pub const ALL: [&str; 11] = [
        EMPLOYEE_CREATED,
        EMPLOYEE_UPDATED,
        EMPLOYEE_DELETED,
        EMPLOYEE_STATUS_CHANGED,
        EMPLOYEE_SALARY_CHANGED,
        USER_CREATED,
        USER_LOGGED_IN,
        USER_PASSWORD_CHANGED,
        USER_ACTIVATED,
        USER_DEACTIVATED,
        AUDIT_LOG_CREATED,
    ];
}

/// Events that can occur in the HR domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EventKind {
    #[serde(rename = "employee.created")]
    EmployeeCreated(EmployeeCreatedData),

    #[serde(rename = "employee.updated")]
    EmployeeUpdated(EmployeeUpdatedData),

    #[serde(rename = "employee.deleted")]
    EmployeeDeleted(EmployeeDeletedData),

    #[serde(rename = "employee.status_changed")]
    EmployeeStatusChanged(EmployeeStatusChangedData),

    #[serde(rename = "employee.salary_changed")]
    EmployeeSalaryChanged(EmployeeSalaryChangedData),

    #[serde(rename = "user.created")]
    UserCreated(UserCreatedData),

    #[serde(rename = "user.logged_in")]
    UserLoggedIn(UserLoggedInData),

    #[serde(rename = "user.password_changed")]
    UserPasswordChanged(UserPasswordChangedData),

    #[serde(rename = "user.activated")]
    UserActivated(UserAccountData),

    #[serde(rename = "user.deactivated")]
    UserDeactivated(UserAccountData),

    #[serde(rename = "audit_log.created")]
    AuditLogCreated(AuditLogCreatedData),
}

impl EventKind {
    pub fn event_type(&self) -> &'static str {
        use event_types::*;

        match self {
            EventKind::EmployeeCreated(_) => EMPLOYEE_CREATED,
            EventKind::EmployeeUpdated(_) => EMPLOYEE_UPDATED,
            EventKind::EmployeeDeleted(_) => EMPLOYEE_DELETED,
            EventKind::EmployeeStatusChanged(_) => EMPLOYEE_STATUS_CHANGED,
            EventKind::EmployeeSalaryChanged(_) => EMPLOYEE_SALARY_CHANGED,
            EventKind::UserCreated(_) => USER_CREATED,
            EventKind::UserLoggedIn(_) => USER_LOGGED_IN,
            EventKind::UserPasswordChanged(_) => USER_PASSWORD_CHANGED,
            EventKind::UserActivated(_) => USER_ACTIVATED,
            EventKind::UserDeactivated(_) => USER_DEACTIVATED,
            EventKind::AuditLogCreated(_) => AUDIT_LOG_CREATED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCreatedData {
    pub employee_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
    pub position: String,
    pub salary: f64,
    pub status: EmployeeStatus,
    pub has_manager: bool,
    pub has_address: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdatedData {
    pub employee_id: Uuid,
    pub changed_fields: Vec<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
    pub position: String,
    pub salary: f64,
    pub status: EmployeeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDeletedData {
    pub employee_id: Uuid,
    /// Snapshot taken just before deletion
    pub old_data: Snapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeStatusChangedData {
    pub employee_id: Uuid,
    pub old_status: EmployeeStatus,
    pub new_status: EmployeeStatus,
    pub changed_by: String,
}

/// Direction of a salary change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalaryChangeType {
    Increase,
    Decrease,
    Same,
}

impl SalaryChangeType {
    pub fn between(old: f64, new: f64) -> Self {
        if new > old {
            SalaryChangeType::Increase
        } else if new < old {
            SalaryChangeType::Decrease
        } else {
            SalaryChangeType::Same
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSalaryChangedData {
    pub employee_id: Uuid,
    pub old_salary: f64,
    pub new_salary: f64,
    pub change_type: SalaryChangeType,
    pub change_amount: f64,
    /// `None` when the old salary was zero
    pub change_percent: Option<f64>,
    pub changed_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreatedData {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLoggedInData {
    pub user_id: Uuid,
    pub username: String,
    pub ip_address: String,
    pub user_agent: String,
}

/// How a password was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordChangeMethod {
    Change,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPasswordChangedData {
    pub user_id: Uuid,
    pub username: String,
    /// `"self"` or the administrator's id
    pub changed_by: String,
    pub method: PasswordChangeMethod,
}

/// Payload for account activation and deactivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccountData {
    pub user_id: Uuid,
    pub username: String,
    pub changed_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogCreatedData {
    pub audit_log_id: Uuid,
    pub employee_id: Uuid,
    pub operation: String,
    pub user_id: String,
    pub ip_address: String,
    pub is_creation: bool,
    pub is_deletion: bool,
    pub is_update: bool,
    pub changed_fields: Vec<String>,
}

/// Event envelope. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    pub id: Uuid,
    pub aggregate_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Payload schema version
    pub version: u32,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl DomainEvent {
    pub fn new(aggregate_id: Uuid, kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            aggregate_id,
            timestamp: Utc::now(),
            version: EVENT_SCHEMA_VERSION,
            kind,
        }
    }

    /// Dot-namespaced type, e.g. `employee.created`.
    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    /// Untyped view of the payload.
    pub fn data(&self) -> Snapshot {
        match &self.kind {
            EventKind::EmployeeCreated(d) => payload_snapshot(d),
            EventKind::EmployeeUpdated(d) => payload_snapshot(d),
            EventKind::EmployeeDeleted(d) => payload_snapshot(d),
            EventKind::EmployeeStatusChanged(d) => payload_snapshot(d),
            EventKind::EmployeeSalaryChanged(d) => payload_snapshot(d),
            EventKind::UserCreated(d) => payload_snapshot(d),
            EventKind::UserLoggedIn(d) => payload_snapshot(d),
            EventKind::UserPasswordChanged(d) => payload_snapshot(d),
            EventKind::UserActivated(d) | EventKind::UserDeactivated(d) => payload_snapshot(d),
            EventKind::AuditLogCreated(d) => payload_snapshot(d),
        }
    }

    pub fn employee_created(employee: &Employee) -> Self {
        Self::new(
            employee.id(),
            EventKind::EmployeeCreated(EmployeeCreatedData {
                employee_id: employee.id(),
                first_name: employee.first_name().to_string(),
                last_name: employee.last_name().to_string(),
                email: employee.email().to_string(),
                department: employee.department().to_string(),
                position: employee.position().to_string(),
                salary: employee.salary(),
                status: employee.status(),
                has_manager: employee.has_manager(),
                has_address: employee.address().is_some(),
            }),
        )
    }

    pub fn employee_updated(employee: &Employee, changed_fields: Vec<String>) -> Self {
        Self::new(
            employee.id(),
            EventKind::EmployeeUpdated(EmployeeUpdatedData {
                employee_id: employee.id(),
                changed_fields,
                first_name: employee.first_name().to_string(),
                last_name: employee.last_name().to_string(),
                email: employee.email().to_string(),
                department: employee.department().to_string(),
                position: employee.position().to_string(),
                salary: employee.salary(),
                status: employee.status(),
            }),
        )
    }

    pub fn employee_deleted(employee_id: Uuid, old_data: Snapshot) -> Self {
        Self::new(
            employee_id,
            EventKind::EmployeeDeleted(EmployeeDeletedData {
                employee_id,
                old_data,
            }),
        )
    }

    pub fn employee_status_changed(
        employee_id: Uuid,
        old_status: EmployeeStatus,
        new_status: EmployeeStatus,
        changed_by: &str,
    ) -> Self {
        Self::new(
            employee_id,
            EventKind::EmployeeStatusChanged(EmployeeStatusChangedData {
                employee_id,
                old_status,
                new_status,
                changed_by: changed_by.to_string(),
            }),
        )
    }

    pub fn employee_salary_changed(
        employee_id: Uuid,
        old_salary: f64,
        new_salary: f64,
        changed_by: &str,
    ) -> Self {
        let change_percent =
            (old_salary != 0.0).then(|| (new_salary - old_salary) / old_salary * 100.0);
        Self::new(
            employee_id,
            EventKind::EmployeeSalaryChanged(EmployeeSalaryChangedData {
                employee_id,
                old_salary,
                new_salary,
                change_type: SalaryChangeType::between(old_salary, new_salary),
                change_amount: new_salary - old_salary,
                change_percent,
                changed_by: changed_by.to_string(),
            }),
        )
    }

    pub fn user_created(user: &User, created_by: &str) -> Self {
        Self::new(
            user.id(),
            EventKind::UserCreated(UserCreatedData {
                user_id: user.id(),
                username: user.username().to_string(),
                email: user.email().to_string(),
                role: user.role(),
                created_by: created_by.to_string(),
            }),
        )
    }

    pub fn user_logged_in(user: &User, ip_address: &str, user_agent: &str) -> Self {
        Self::new(
            user.id(),
            EventKind::UserLoggedIn(UserLoggedInData {
                user_id: user.id(),
                username: user.username().to_string(),
                ip_address: ip_address.to_string(),
                user_agent: user_agent.to_string(),
            }),
        )
    }

    pub fn user_password_changed(
        user: &User,
        changed_by: &str,
        method: PasswordChangeMethod,
    ) -> Self {
        Self::new(
            user.id(),
            EventKind::UserPasswordChanged(UserPasswordChangedData {
                user_id: user.id(),
                username: user.username().to_string(),
                changed_by: changed_by.to_string(),
                method,
            }),
        )
    }

    pub fn user_activated(user: &User, changed_by: &str) -> Self {
        Self::new(user.id(), EventKind::UserActivated(account_data(user, changed_by)))
    }

    pub fn user_deactivated(user: &User, changed_by: &str) -> Self {
        Self::new(user.id(), EventKind::UserDeactivated(account_data(user, changed_by)))
    }

    pub fn audit_log_created(log: &AuditLog) -> Self {
        Self::new(
            log.id(),
            EventKind::AuditLogCreated(AuditLogCreatedData {
                audit_log_id: log.id(),
                employee_id: log.employee_id(),
                operation: log.operation().to_string(),
                user_id: log.user_id().to_string(),
                ip_address: log.ip_address().to_string(),
                is_creation: log.is_creation(),
                is_deletion: log.is_deletion(),
                is_update: log.is_update(),
                changed_fields: log.get_changed_fields(),
            }),
        )
    }
}

fn account_data(user: &User, changed_by: &str) -> UserAccountData {
    UserAccountData {
        user_id: user.id(),
        username: user.username().to_string(),
        changed_by: changed_by.to_string(),
    }
}

fn payload_snapshot<T: Serialize>(payload: &T) -> Snapshot {
    serde_json::to_value(payload)
        .and_then(serde_json::from_value)
        .unwrap_or_default()
}
