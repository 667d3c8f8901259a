//! Immutable audit trail entries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::validation::{validate_ip_address, validate_operation, validate_user_agent};
use crate::value::{FieldValue, Snapshot};

/// One audited operation: who did what to which record, with before and
/// after snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    id: Uuid,
    employee_id: Uuid,
    operation: String,
    user_id: String,
    timestamp: DateTime<Utc>,
    old_values: Snapshot,
    new_values: Snapshot,
    ip_address: String,
    user_agent: String,
}

/// Old and new value of a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub old: Option<FieldValue>,
    pub new: Option<FieldValue>,
    pub changed: bool,
}

impl AuditLog {
    /// Build and validate an entry. An empty snapshot stands for "none".
    ///
    /// # Errors
    /// Validation error when the subject id is nil, the actor is empty,
    /// the operation or IP address are malformed, or both snapshots are empty.
    pub fn new(
        employee_id: Uuid,
        operation: &str,
        user_id: &str,
        old_values: Snapshot,
        new_values: Snapshot,
        ip_address: &str,
        user_agent: &str,
    ) -> DomainResult<Self> {
        let log = Self {
            id: Uuid::new_v4(),
            employee_id,
            operation: operation.to_string(),
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
            old_values,
            new_values,
            ip_address: ip_address.to_string(),
            user_agent: user_agent.to_string(),
        };
        log.validate()?;
        Ok(log)
    }

    fn validate(&self) -> DomainResult<()> {
        if self.employee_id.is_nil() {
            return Err(DomainError::validation("employee ID cannot be empty"));
        }
        validate_operation(&self.operation)?;
        if self.user_id.is_empty() {
            return Err(DomainError::validation("user ID cannot be empty"));
        }
        validate_ip_address(&self.ip_address)
            .map_err(|e| DomainError::validation(format!("invalid IP address: {e}")))?;
        validate_user_agent(&self.user_agent)?;
        if self.old_values.is_empty() && self.new_values.is_empty() {
            return Err(DomainError::validation(
                "at least one of old values or new values must be provided",
            ));
        }
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn employee_id(&self) -> Uuid {
        self.employee_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn old_values(&self) -> &Snapshot {
        &self.old_values
    }

    pub fn new_values(&self) -> &Snapshot {
        &self.new_values
    }

    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn is_creation(&self) -> bool {
        self.old_values.is_empty() && !self.new_values.is_empty()
    }

    pub fn is_deletion(&self) -> bool {
        self.new_values.is_empty() && !self.old_values.is_empty()
    }

    pub fn is_update(&self) -> bool {
        !self.old_values.is_empty() && !self.new_values.is_empty()
    }

    /// Keys present on both sides with different values, plus keys that
    /// only appear in the new snapshot. On an update, keys that only appear
    /// in the old snapshot (a cleared field) count too. Sorted by key.
    pub fn get_changed_fields(&self) -> Vec<String> {
        let mut changed: Vec<String> = self
            .new_values
            .iter()
            .filter(|(field, new)| match self.old_values.get(*field) {
                Some(old) => old != *new,
                None => true,
            })
            .map(|(field, _)| field.clone())
            .collect();
        if self.is_update() {
            changed.extend(
                self.old_values
                    .keys()
                    .filter(|field| !self.new_values.contains_key(*field))
                    .cloned(),
            );
        }
        changed.sort();
        changed
    }

    /// `None` when the field appears in neither snapshot.
    pub fn get_field_change(&self, field: &str) -> Option<FieldChange> {
        let old = self.old_values.get(field);
        let new = self.new_values.get(field);
        let changed = match (old, new) {
            (None, None) => return None,
            (Some(old), Some(new)) => old != new,
            _ => true,
        };
        Some(FieldChange {
            old: old.cloned(),
            new: new.cloned(),
            changed,
        })
    }

    /// Human summary, e.g. `Updated: salary` or `Created: a, b, and c and 4 more`.
    pub fn change_summary(&self) -> String {
        if self.old_values.is_empty() {
            return format!("Created: {}", fields_summary(self.new_values.keys(), "no fields"));
        }
        if self.new_values.is_empty() {
            return format!("Deleted: {}", fields_summary(self.old_values.keys(), "no fields"));
        }
        let changed = self.get_changed_fields();
        format!("Updated: {}", fields_summary(changed.iter(), "no changes"))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn fields_summary<'a>(fields: impl Iterator<Item = &'a String>, empty: &str) -> String {
    let fields: Vec<&str> = fields.map(String::as_str).collect();
    if fields.is_empty() {
        return empty.to_string();
    }
    if fields.len() <= 3 {
        return join_fields(&fields);
    }
    format!("{} and {} more", join_fields(&fields[..3]), fields.len() - 3)
}

fn join_fields(fields: &[&str]) -> String {
    match fields {
        [] => String::new(),
        [one] => one.to_string(),
        [a, b] => format!("{a} and {b}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}
