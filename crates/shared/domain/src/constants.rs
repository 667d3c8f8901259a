//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Employee Validation
// =============================================================================

/// Minimum length of first/last names
pub const MIN_NAME_LENGTH: usize = 2;

/// Maximum length of first/last names
pub const MAX_NAME_LENGTH: usize = 50;

/// Maximum email length (employees and users)
pub const MAX_EMAIL_LENGTH: usize = 100;

/// Maximum phone number length
pub const MAX_PHONE_LENGTH: usize = 20;

pub const MIN_DEPARTMENT_LENGTH: usize = 2;
pub const MAX_DEPARTMENT_LENGTH: usize = 50;

pub const MIN_POSITION_LENGTH: usize = 2;
pub const MAX_POSITION_LENGTH: usize = 50;

/// Upper bound (inclusive) for an employee salary
pub const MAX_SALARY: f64 = 1_000_000.0;

/// How far back a hire date may reach
pub const MAX_HIRE_DATE_YEARS_BACK: u32 = 50;

/// Year length used for tenure calculations
pub const DAYS_PER_YEAR: f64 = 365.25;

// =============================================================================
// Address Validation
// =============================================================================

pub const MIN_STREET_LENGTH: usize = 5;
pub const MAX_STREET_LENGTH: usize = 200;
pub const MIN_CITY_LENGTH: usize = 2;
pub const MAX_CITY_LENGTH: usize = 100;
pub const MIN_STATE_LENGTH: usize = 2;
pub const MAX_STATE_LENGTH: usize = 50;
pub const MIN_COUNTRY_LENGTH: usize = 2;
pub const MAX_COUNTRY_LENGTH: usize = 100;

// =============================================================================
// User Validation
// =============================================================================

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length requirement
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// A user counts as online when the last login is within this window
pub const ONLINE_WINDOW_MINUTES: i64 = 30;

// =============================================================================
// Audit Log
// =============================================================================

pub const MAX_OPERATION_LENGTH: usize = 50;

/// Longest textual IPv6 form
pub const MAX_IP_ADDRESS_LENGTH: usize = 45;

pub const MAX_USER_AGENT_LENGTH: usize = 500;

/// Audited operations
pub const OP_EMPLOYEE_CREATE: &str = "employee:create";
pub const OP_EMPLOYEE_UPDATE: &str = "employee:update";
pub const OP_EMPLOYEE_DELETE: &str = "employee:delete";
pub const OP_EMPLOYEE_CHANGE_STATUS: &str = "employee:change_status";
pub const OP_EMPLOYEE_UPDATE_SALARY: &str = "employee:update_salary";
pub const OP_USER_CREATE: &str = "user:create";
pub const OP_USER_UPDATE: &str = "user:update";
pub const OP_USER_LOGIN: &str = "user:login";
pub const OP_USER_PASSWORD_CHANGE: &str = "user:password_change";
pub const OP_USER_PASSWORD_RESET: &str = "user:password_reset";
pub const OP_USER_ACTIVATE: &str = "user:activate";
pub const OP_USER_DEACTIVATE: &str = "user:deactivate";
pub const OP_SYSTEM_ACTION: &str = "system:action";

// =============================================================================
// Domain Events
// =============================================================================

/// Schema version stamped on every event envelope
pub const EVENT_SCHEMA_VERSION: u32 = 1;

// =============================================================================
// Pagination
// =============================================================================

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Maximum allowed items per page to prevent excessive queries
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default starting page number (1-indexed)
pub const DEFAULT_PAGE_NUMBER: u32 = 1;
