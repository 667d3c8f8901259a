//! Employment status and its transition rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Employment status of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmployeeStatus {
    Active,
    Terminated,
    OnLeave,
}

impl EmployeeStatus {
    /// Every status, freshly allocated on each call.
    pub fn all() -> Vec<EmployeeStatus> {
        vec![
            EmployeeStatus::Active,
            EmployeeStatus::Terminated,
            EmployeeStatus::OnLeave,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "ACTIVE",
            EmployeeStatus::Terminated => "TERMINATED",
            EmployeeStatus::OnLeave => "ON_LEAVE",
        }
    }

    /// TERMINATED is terminal; every other status may move anywhere,
    /// including to itself.
    pub fn can_change_to(&self, _target: EmployeeStatus) -> bool {
        !matches!(self, EmployeeStatus::Terminated)
    }

    pub fn validate_transition(&self, target: EmployeeStatus) -> DomainResult<()> {
        if self.can_change_to(target) {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// Parse the wire form (`ACTIVE`, `TERMINATED`, `ON_LEAVE`).
    pub fn parse(value: &str) -> DomainResult<Self> {
        match value {
            "ACTIVE" => Ok(EmployeeStatus::Active),
            "TERMINATED" => Ok(EmployeeStatus::Terminated),
            "ON_LEAVE" => Ok(EmployeeStatus::OnLeave),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

impl FromStr for EmployeeStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_wire_form() {
        assert_eq!(EmployeeStatus::Active.to_string(), "ACTIVE");
        assert_eq!(EmployeeStatus::Terminated.to_string(), "TERMINATED");
        assert_eq!(EmployeeStatus::OnLeave.to_string(), "ON_LEAVE");
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!("ON_LEAVE".parse::<EmployeeStatus>().unwrap(), EmployeeStatus::OnLeave);
        assert!(EmployeeStatus::parse("").is_err());
        assert!(EmployeeStatus::parse("UNKNOWN").is_err());
        assert!(EmployeeStatus::parse("active").is_err());
    }

    #[test]
    fn test_terminated_is_terminal() {
        for target in EmployeeStatus::all() {
            assert!(!EmployeeStatus::Terminated.can_change_to(target));
            assert!(EmployeeStatus::Terminated.validate_transition(target).is_err());
        }
    }

    #[test]
    fn test_non_terminal_statuses_allow_any_target() {
        for from in [EmployeeStatus::Active, EmployeeStatus::OnLeave] {
            for to in EmployeeStatus::all() {
                assert!(from.can_change_to(to), "{from} -> {to} should be allowed");
            }
        }
    }

    #[test]
    fn test_serde_uses_screaming_case() {
        let json = serde_json::to_string(&EmployeeStatus::OnLeave).unwrap();
        assert_eq!(json, "\"ON_LEAVE\"");
    }
}
