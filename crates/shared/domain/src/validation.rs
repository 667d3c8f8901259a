//! Field validators shared by the aggregates.
//!
//! Each validator returns the first violation it finds as a
//! [`DomainError::Validation`]. Lengths are counted in characters.

use chrono::{DateTime, Months, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidateIp;

use crate::constants::*;
use crate::error::{DomainError, DomainResult};

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\s\-+()]+$").expect("valid phone regex"));

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("valid username regex"));

fn check_length(value: &str, field: &str, min: usize, max: usize) -> DomainResult<()> {
    let len = value.chars().count();
    if len < min {
        return Err(DomainError::validation(format!(
            "{field} must be at least {min} characters long"
        )));
    }
    if len > max {
        return Err(DomainError::validation(format!(
            "{field} cannot exceed {max} characters"
        )));
    }
    Ok(())
}

fn check_required(value: &str, field: &str) -> DomainResult<()> {
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn check_chars(value: &str, field: &str, allowed: impl Fn(char) -> bool) -> DomainResult<()> {
    if value.chars().all(allowed) {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "{field} contains invalid characters"
        )))
    }
}

/// First/last name: letters, whitespace, hyphen, apostrophe.
pub fn validate_name(name: &str, field: &str) -> DomainResult<()> {
    check_required(name, field)?;
    check_length(name, field, MIN_NAME_LENGTH, MAX_NAME_LENGTH)?;
    check_chars(name, field, |c| {
        c.is_alphabetic() || c.is_whitespace() || c == '-' || c == '\''
    })
}

pub fn validate_email(email: &str) -> DomainResult<()> {
    check_required(email, "email")?;
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(DomainError::validation(format!(
            "email cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err(DomainError::validation("email format is invalid"));
    }
    Ok(())
}

/// Optional phone; empty means "no phone".
pub fn validate_phone(phone: &str) -> DomainResult<()> {
    if phone.is_empty() {
        return Ok(());
    }
    if phone.chars().count() > MAX_PHONE_LENGTH {
        return Err(DomainError::validation(format!(
            "phone cannot exceed {MAX_PHONE_LENGTH} characters"
        )));
    }
    if !PHONE_REGEX.is_match(phone) {
        return Err(DomainError::validation("phone format is invalid"));
    }
    Ok(())
}

pub fn validate_department(department: &str) -> DomainResult<()> {
    check_required(department, "department")?;
    check_length(
        department,
        "department",
        MIN_DEPARTMENT_LENGTH,
        MAX_DEPARTMENT_LENGTH,
    )?;
    check_chars(department, "department", |c| {
        c.is_alphabetic() || c.is_whitespace() || c == '&'
    })
}

pub fn validate_position(position: &str) -> DomainResult<()> {
    check_required(position, "position")?;
    check_length(position, "position", MIN_POSITION_LENGTH, MAX_POSITION_LENGTH)?;
    check_chars(position, "position", |c| {
        c.is_alphabetic() || c.is_whitespace() || c == '-' || c == '/'
    })
}

/// Hire date must lie within the last fifty years and not in the future.
pub fn validate_hire_date(hire_date: DateTime<Utc>, now: DateTime<Utc>) -> DomainResult<()> {
    if hire_date > now {
        return Err(DomainError::validation("hire date cannot be in the future"));
    }
    let earliest = now
        .checked_sub_months(Months::new(MAX_HIRE_DATE_YEARS_BACK * 12))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    if hire_date < earliest {
        return Err(DomainError::validation(format!(
            "hire date cannot be more than {MAX_HIRE_DATE_YEARS_BACK} years in the past"
        )));
    }
    Ok(())
}

pub fn validate_salary(salary: f64) -> DomainResult<()> {
    if salary.is_nan() {
        return Err(DomainError::validation("salary must be a number"));
    }
    if salary < 0.0 {
        return Err(DomainError::validation("salary cannot be negative"));
    }
    if salary == 0.0 {
        return Err(DomainError::validation("salary is required"));
    }
    if salary > MAX_SALARY {
        return Err(DomainError::validation("salary cannot exceed $1,000,000"));
    }
    Ok(())
}

/// Alphanumeric plus underscore, never leading or trailing underscore.
pub fn validate_username(username: &str) -> DomainResult<()> {
    check_required(username, "username")?;
    check_length(username, "username", MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH)?;
    if !USERNAME_REGEX.is_match(username) {
        return Err(DomainError::validation(
            "username can only contain letters, numbers, and underscores",
        ));
    }
    if username.starts_with('_') || username.ends_with('_') {
        return Err(DomainError::validation(
            "username cannot start or end with underscore",
        ));
    }
    Ok(())
}

/// Audit operation names: letters, digits, underscore and colon.
pub fn validate_operation(operation: &str) -> DomainResult<()> {
    if operation.is_empty() {
        return Err(DomainError::validation("operation cannot be empty"));
    }
    if operation.len() > MAX_OPERATION_LENGTH {
        return Err(DomainError::validation(format!(
            "operation cannot exceed {MAX_OPERATION_LENGTH} characters"
        )));
    }
    check_chars(operation, "operation", |c| {
        c.is_ascii_alphanumeric() || c == '_' || c == ':'
    })
}

pub fn validate_ip_address(ip: &str) -> DomainResult<()> {
    if ip.is_empty() {
        return Err(DomainError::validation("IP address cannot be empty"));
    }
    if ip.len() > MAX_IP_ADDRESS_LENGTH {
        return Err(DomainError::validation("IP address is too long"));
    }
    if !ip.validate_ip() {
        return Err(DomainError::validation("IP address format is invalid"));
    }
    Ok(())
}

pub fn validate_user_agent(user_agent: &str) -> DomainResult<()> {
    if user_agent.chars().count() > MAX_USER_AGENT_LENGTH {
        return Err(DomainError::validation(format!(
            "user agent cannot exceed {MAX_USER_AGENT_LENGTH} characters"
        )));
    }
    Ok(())
}
