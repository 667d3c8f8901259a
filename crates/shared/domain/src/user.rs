//! User aggregate.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::constants::ONLINE_WINDOW_MINUTES;
use crate::error::{DomainError, DomainResult};
use crate::password::Password;
use crate::role::{Permission, UserRole};
use crate::validation::{validate_email, validate_username};
use crate::value::{FieldValue, Snapshot};

/// Partial profile update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// System user. The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: Uuid,
    username: String,
    email: String,
    #[serde(skip_serializing)]
    password: Password,
    role: UserRole,
    is_active: bool,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Validate username and email, then check strength and hash the password.
    pub fn new(username: &str, email: &str, password: &str, role: UserRole) -> DomainResult<Self> {
        validate_username(username)?;
        validate_email(email)?;
        let password = Password::new(password)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password,
            role,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &Password {
        &self.password
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        self.last_login
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Active account and matching password.
    pub fn authenticate(&self, password: &str) -> bool {
        self.is_active && self.password.verify(password)
    }

    /// Password check that ignores the active flag.
    pub fn verify_password(&self, password: &str) -> bool {
        self.password.verify(password)
    }

    pub fn update_last_login(&mut self) {
        self.update_last_login_at(Utc::now());
    }

    /// Record a login that happened at `at`; `updated_at` never moves back.
    pub fn update_last_login_at(&mut self, at: DateTime<Utc>) {
        self.last_login = Some(at);
        self.updated_at = at.max(self.updated_at);
    }

    pub fn activate(&mut self) -> DomainResult<()> {
        if self.is_active {
            return Err(DomainError::UserAlreadyActive);
        }
        self.is_active = true;
        self.touch();
        Ok(())
    }

    pub fn deactivate(&mut self) -> DomainResult<()> {
        if !self.is_active {
            return Err(DomainError::UserAlreadyInactive);
        }
        self.is_active = false;
        self.touch();
        Ok(())
    }

    pub fn change_password(&mut self, current: &str, new: &str) -> DomainResult<()> {
        if !self.authenticate(current) {
            return Err(DomainError::IncorrectPassword);
        }
        self.password = Password::new(new)?;
        self.touch();
        Ok(())
    }

    /// Administrative reset: no current-password check, strength still enforced.
    pub fn reset_password(&mut self, new: &str) -> DomainResult<()> {
        self.password = Password::new(new)?;
        self.touch();
        Ok(())
    }

    pub fn update_role(&mut self, role: UserRole) {
        self.role = role;
        self.touch();
    }

    pub fn update_email(&mut self, email: &str) -> DomainResult<()> {
        validate_email(email)
            .map_err(|e| DomainError::validation(format!("invalid email: {e}")))?;
        self.email = email.to_string();
        self.touch();
        Ok(())
    }

    /// Apply a partial profile update atomically.
    ///
    /// Returns the names of fields whose value actually changed.
    pub fn apply_update(&mut self, update: UserUpdate) -> DomainResult<Vec<String>> {
        let mut changed = Vec::new();

        if let Some(username) = &update.username {
            validate_username(username)?;
            if *username != self.username {
                changed.push("username");
            }
        }
        if let Some(email) = &update.email {
            validate_email(email)?;
            if *email != self.email {
                changed.push("email");
            }
        }
        if let Some(role) = update.role {
            if role != self.role {
                changed.push("role");
            }
        }

        if let Some(username) = update.username {
            self.username = username;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        self.touch();
        Ok(changed.into_iter().map(String::from).collect())
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(*p))
    }

    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(*p))
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_manager(&self) -> bool {
        self.role == UserRole::Manager
    }

    pub fn is_viewer(&self) -> bool {
        self.role == UserRole::Viewer
    }

    pub fn can_access_salary(&self) -> bool {
        self.role.can_access_salary()
    }

    pub fn can_manage_users(&self) -> bool {
        self.role.can_manage_users()
    }

    pub fn can_delete_employees(&self) -> bool {
        self.role.can_delete_employees()
    }

    pub fn can_view_audit_logs(&self) -> bool {
        self.role.can_view_audit_logs()
    }

    /// Logged in within the last 30 minutes.
    pub fn is_online(&self) -> bool {
        self.is_online_at(Utc::now())
    }

    pub fn is_online_at(&self, now: DateTime<Utc>) -> bool {
        self.last_login
            .is_some_and(|at| now - at < Duration::minutes(ONLINE_WINDOW_MINUTES))
    }

    pub fn last_seen_string(&self) -> String {
        self.last_seen_string_at(Utc::now())
    }

    pub fn last_seen_string_at(&self, now: DateTime<Utc>) -> String {
        let Some(last_login) = self.last_login else {
            return "Never".to_string();
        };

        let elapsed = now - last_login;
        if elapsed < Duration::minutes(1) {
            "Just now".to_string()
        } else if elapsed < Duration::hours(1) {
            let n = elapsed.num_minutes();
            format!("{n} minute{} ago", plural(n))
        } else if elapsed < Duration::days(1) {
            let n = elapsed.num_hours();
            format!("{n} hour{} ago", plural(n))
        } else if elapsed < Duration::days(7) {
            let n = elapsed.num_days();
            format!("{n} day{} ago", plural(n))
        } else {
            last_login.format("%b %-d, %Y").to_string()
        }
    }

    /// Whole days since the account was created.
    pub fn account_age_days(&self) -> i64 {
        (Utc::now() - self.created_at).num_days()
    }

    /// Audit snapshot; never includes the password hash.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from([
            ("id".to_string(), FieldValue::from(self.id)),
            ("username".to_string(), self.username.as_str().into()),
            ("email".to_string(), self.email.as_str().into()),
            ("role".to_string(), self.role.as_str().into()),
            ("isActive".to_string(), self.is_active.into()),
            ("lastLogin".to_string(), self.last_login.into()),
        ])
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
