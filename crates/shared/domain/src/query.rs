//! Filtering, sorting and pagination types shared by the repository ports.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit_log::AuditLog;
use crate::constants::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::employee::Employee;
use crate::error::{RepositoryError, RepositoryResult};
use crate::role::UserRole;
use crate::status::EmployeeStatus;
use crate::user::User;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

// =============================================================================
// Employees
// =============================================================================

/// Conjunctive employee filter; `None` fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeFilter {
    pub department: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub manager_id: Option<Uuid>,
    /// Case-insensitive match on name, email, department or position
    pub search: Option<String>,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
    pub hire_date_from: Option<DateTime<Utc>>,
    pub hire_date_to: Option<DateTime<Utc>>,
}

impl EmployeeFilter {
    pub fn matches(&self, employee: &Employee) -> bool {
        if let Some(department) = &self.department {
            if !employee.department().eq_ignore_ascii_case(department) {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != employee.status()) {
            return false;
        }
        if self.manager_id.is_some() && self.manager_id != employee.manager_id() {
            return false;
        }
        if let Some(term) = &self.search {
            let haystack = [
                employee.full_name(),
                employee.email().to_string(),
                employee.department().to_string(),
                employee.position().to_string(),
            ];
            if !contains_ignore_case(&haystack, term) {
                return false;
            }
        }
        if self.min_salary.is_some_and(|min| employee.salary() < min) {
            return false;
        }
        if self.max_salary.is_some_and(|max| employee.salary() > max) {
            return false;
        }
        if self.hire_date_from.is_some_and(|from| employee.hire_date() < from) {
            return false;
        }
        if self.hire_date_to.is_some_and(|to| employee.hire_date() > to) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeSortField {
    Id,
    /// Last name, then first name
    #[default]
    Name,
    Email,
    Department,
    Position,
    HireDate,
    Salary,
    Status,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmployeeSort {
    pub field: EmployeeSortField,
    pub direction: SortDirection,
}

impl EmployeeSort {
    pub fn by(field: EmployeeSortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn compare(&self, a: &Employee, b: &Employee) -> Ordering {
        let ordering = match self.field {
            EmployeeSortField::Id => a.id().cmp(&b.id()),
            EmployeeSortField::Name => name_key(a).cmp(&name_key(b)),
            EmployeeSortField::Email => a.email().to_lowercase().cmp(&b.email().to_lowercase()),
            EmployeeSortField::Department => a.department().cmp(b.department()),
            EmployeeSortField::Position => a.position().cmp(b.position()),
            EmployeeSortField::HireDate => a.hire_date().cmp(&b.hire_date()),
            EmployeeSortField::Salary => a.salary().total_cmp(&b.salary()),
            EmployeeSortField::Status => a.status().as_str().cmp(b.status().as_str()),
            EmployeeSortField::CreatedAt => a.created_at().cmp(&b.created_at()),
        };
        self.direction.apply(ordering.then_with(|| a.id().cmp(&b.id())))
    }
}

fn name_key(employee: &Employee) -> (String, String) {
    (
        employee.last_name().to_lowercase(),
        employee.first_name().to_lowercase(),
    )
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    /// Case-insensitive match on username or email
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub last_login_from: Option<DateTime<Utc>>,
    pub last_login_to: Option<DateTime<Utc>>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        if self.role.is_some_and(|r| r != user.role()) {
            return false;
        }
        if self.is_active.is_some_and(|a| a != user.is_active()) {
            return false;
        }
        if let Some(term) = &self.search {
            let haystack = [user.username().to_string(), user.email().to_string()];
            if !contains_ignore_case(&haystack, term) {
                return false;
            }
        }
        if self.created_from.is_some_and(|from| user.created_at() < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| user.created_at() > to) {
            return false;
        }
        // a user who never logged in never matches a last-login bound
        if let Some(from) = self.last_login_from {
            if user.last_login().map_or(true, |at| at < from) {
                return false;
            }
        }
        if let Some(to) = self.last_login_to {
            if user.last_login().map_or(true, |at| at > to) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSortField {
    Id,
    #[default]
    Username,
    Email,
    Role,
    IsActive,
    CreatedAt,
    LastLogin,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserSort {
    pub field: UserSortField,
    pub direction: SortDirection,
}

impl UserSort {
    pub fn by(field: UserSortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn compare(&self, a: &User, b: &User) -> Ordering {
        let ordering = match self.field {
            UserSortField::Id => a.id().cmp(&b.id()),
            UserSortField::Username => a
                .username()
                .to_lowercase()
                .cmp(&b.username().to_lowercase()),
            UserSortField::Email => a.email().to_lowercase().cmp(&b.email().to_lowercase()),
            UserSortField::Role => a.role().as_str().cmp(b.role().as_str()),
            UserSortField::IsActive => a.is_active().cmp(&b.is_active()),
            UserSortField::CreatedAt => a.created_at().cmp(&b.created_at()),
            UserSortField::LastLogin => a.last_login().cmp(&b.last_login()),
        };
        self.direction.apply(ordering.then_with(|| a.id().cmp(&b.id())))
    }
}

// =============================================================================
// Audit logs
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditLogFilter {
    pub employee_id: Option<Uuid>,
    pub operation: Option<String>,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub from_time: Option<DateTime<Utc>>,
    pub to_time: Option<DateTime<Utc>>,
    /// Any of these operations; empty means no constraint
    pub operations: Vec<String>,
}

impl AuditLogFilter {
    pub fn matches(&self, log: &AuditLog) -> bool {
        if self.employee_id.is_some_and(|id| id != log.employee_id()) {
            return false;
        }
        if self.operation.as_deref().is_some_and(|op| op != log.operation()) {
            return false;
        }
        if self.user_id.as_deref().is_some_and(|u| u != log.user_id()) {
            return false;
        }
        if self.ip_address.as_deref().is_some_and(|ip| ip != log.ip_address()) {
            return false;
        }
        if self.from_time.is_some_and(|from| log.timestamp() < from) {
            return false;
        }
        if self.to_time.is_some_and(|to| log.timestamp() > to) {
            return false;
        }
        if !self.operations.is_empty() && !self.operations.iter().any(|op| op == log.operation()) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLogSortField {
    Id,
    #[default]
    Timestamp,
    Operation,
    UserId,
    EmployeeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditLogSort {
    pub field: AuditLogSortField,
    pub direction: SortDirection,
}

impl Default for AuditLogSort {
    /// Newest first.
    fn default() -> Self {
        Self {
            field: AuditLogSortField::Timestamp,
            direction: SortDirection::Desc,
        }
    }
}

impl AuditLogSort {
    pub fn compare(&self, a: &AuditLog, b: &AuditLog) -> Ordering {
        let ordering = match self.field {
            AuditLogSortField::Id => a.id().cmp(&b.id()),
            AuditLogSortField::Timestamp => a.timestamp().cmp(&b.timestamp()),
            AuditLogSortField::Operation => a.operation().cmp(b.operation()),
            AuditLogSortField::UserId => a.user_id().cmp(b.user_id()),
            AuditLogSortField::EmployeeId => a.employee_id().cmp(&b.employee_id()),
        };
        self.direction.apply(ordering.then_with(|| a.id().cmp(&b.id())))
    }
}

fn contains_ignore_case(haystack: &[String], term: &str) -> bool {
    let term = term.trim().to_lowercase();
    term.is_empty() || haystack.iter().any(|s| s.to_lowercase().contains(&term))
}

// =============================================================================
// Pagination
// =============================================================================

/// Page/offset pagination or, when `cursor` is set, keyset pagination that
/// starts right after the item the cursor names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawPagination")]
pub struct Pagination {
    page: u32,
    page_size: u32,
    cursor: Option<String>,
}

/// Wire shape of [`Pagination`]; decoding goes through the clamping constructors.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPagination {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    page_size: u32,
    #[serde(default)]
    cursor: Option<String>,
}

impl From<RawPagination> for Pagination {
    fn from(raw: RawPagination) -> Self {
        match raw.cursor {
            Some(cursor) => Self::with_cursor(raw.page_size, cursor),
            None => Self::new(raw.page, raw.page_size),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    /// Page numbers start at 1; a zero page size means the default.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: clamp_page_size(page_size),
            cursor: None,
        }
    }

    pub fn with_cursor(page_size: u32, cursor: impl Into<String>) -> Self {
        Self {
            page: DEFAULT_PAGE_NUMBER,
            page_size: clamp_page_size(page_size),
            cursor: Some(cursor.into()),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn is_cursor_based(&self) -> bool {
        self.cursor.is_some()
    }

    /// Zero for cursor pagination.
    pub fn offset(&self) -> usize {
        if self.is_cursor_based() {
            return 0;
        }
        (self.page as usize).saturating_sub(1) * self.page_size as usize
    }
}

fn clamp_page_size(page_size: u32) -> u32 {
    if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size.min(MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCursors {
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub has_next: bool,
    pub has_prev: bool,
    pub cursors: Option<PageCursors>,
}

impl<T> Page<T> {
    /// Slice an already filtered and sorted result set.
    ///
    /// `cursor_of` yields the opaque cursor for an item; the same function
    /// must be used to resolve an incoming cursor.
    ///
    /// # Errors
    /// `InvalidQuery` when the cursor does not name any item.
    pub fn paginate(
        sorted: Vec<T>,
        pagination: &Pagination,
        cursor_of: impl Fn(&T) -> String,
    ) -> RepositoryResult<Self> {
        let total = sorted.len();
        let size = pagination.page_size() as usize;

        let start = match pagination.cursor() {
            Some(cursor) => {
                let position = sorted
                    .iter()
                    .position(|item| cursor_of(item) == cursor)
                    .ok_or_else(|| {
                        RepositoryError::InvalidQuery(format!("unknown cursor '{cursor}'"))
                    })?;
                position + 1
            }
            None => pagination.offset().min(total),
        };

        let items: Vec<T> = sorted.into_iter().skip(start).take(size).collect();
        let end = start + items.len();
        let cursors = (!items.is_empty()).then(|| PageCursors {
            start_cursor: items.first().map(&cursor_of),
            end_cursor: items.last().map(&cursor_of),
        });

        Ok(Self {
            items,
            total: total as u64,
            page: pagination.page(),
            page_size: pagination.page_size(),
            has_next: end < total,
            has_prev: start > 0,
            cursors,
        })
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            has_next: self.has_next,
            has_prev: self.has_prev,
            cursors: self.cursors,
        }
    }
}
