//! Employee aggregate.
//!
//! Every constructor and mutator validates before touching state, so an
//! `Employee` observed outside this module always satisfies its field rules.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::address::Address;
use crate::constants::DAYS_PER_YEAR;
use crate::error::{DomainError, DomainResult};
use crate::status::EmployeeStatus;
use crate::validation::{
    validate_department, validate_email, validate_hire_date, validate_name, validate_phone,
    validate_position, validate_salary,
};
use crate::value::{FieldValue, Snapshot};

/// Input for [`Employee::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub position: String,
    pub hire_date: DateTime<Utc>,
    pub salary: f64,
    pub manager_id: Option<Uuid>,
    pub address: Option<Address>,
}

/// Partial update; `None` leaves a field untouched.
///
/// `manager_id` and `address` are doubly optional: `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub salary: Option<f64>,
    pub manager_id: Option<Option<Uuid>>,
    pub address: Option<Option<Address>>,
}

impl EmployeeUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    department: String,
    position: String,
    hire_date: DateTime<Utc>,
    salary: f64,
    status: EmployeeStatus,
    manager_id: Option<Uuid>,
    address: Option<Address>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Employee {
    /// Create an ACTIVE employee, validating every field.
    pub fn new(input: NewEmployee) -> DomainResult<Self> {
        Self::new_at(input, Utc::now())
    }

    pub fn new_at(input: NewEmployee, now: DateTime<Utc>) -> DomainResult<Self> {
        let employee = Self {
            id: Uuid::new_v4(),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            phone: input.phone,
            department: input.department,
            position: input.position,
            hire_date: input.hire_date,
            salary: input.salary,
            status: EmployeeStatus::Active,
            manager_id: input.manager_id,
            address: input.address.filter(|a| !a.is_empty()),
            created_at: now,
            updated_at: now,
        };
        employee.validate_at(now)?;
        Ok(employee)
    }

    /// Re-run every field validator against `now`.
    pub fn validate_at(&self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.id.is_nil() {
            return Err(DomainError::validation("employee ID cannot be empty"));
        }
        validate_name(&self.first_name, "first name")?;
        validate_name(&self.last_name, "last name")?;
        validate_email(&self.email)?;
        validate_phone(&self.phone)?;
        validate_department(&self.department)?;
        validate_position(&self.position)?;
        validate_hire_date(self.hire_date, now)?;
        validate_salary(self.salary)?;
        if let Some(address) = &self.address {
            address.validate().map_err(prefix_address)?;
        }
        if self.manager_id == Some(self.id) {
            return Err(DomainError::SelfManagement);
        }
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn hire_date(&self) -> DateTime<Utc> {
        self.hire_date
    }

    pub fn salary(&self) -> f64 {
        self.salary
    }

    pub fn status(&self) -> EmployeeStatus {
        self.status
    }

    pub fn manager_id(&self) -> Option<Uuid> {
        self.manager_id
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }

    pub fn is_terminated(&self) -> bool {
        self.status == EmployeeStatus::Terminated
    }

    pub fn is_on_leave(&self) -> bool {
        self.status == EmployeeStatus::OnLeave
    }

    pub fn has_manager(&self) -> bool {
        self.manager_id.is_some()
    }

    /// True when `manager_id` is this employee's current manager.
    pub fn can_be_managed_by(&self, manager_id: Uuid) -> bool {
        self.manager_id == Some(manager_id)
    }

    pub fn change_status(&mut self, new_status: EmployeeStatus) -> DomainResult<()> {
        self.status.validate_transition(new_status)?;
        self.status = new_status;
        self.touch();
        Ok(())
    }

    pub fn update_salary(&mut self, new_salary: f64) -> DomainResult<()> {
        validate_salary(new_salary)?;
        self.ensure_not_terminated("salary")?;
        self.salary = new_salary;
        self.touch();
        Ok(())
    }

    pub fn update_contact_info(&mut self, email: &str, phone: &str) -> DomainResult<()> {
        validate_email(email)?;
        validate_phone(phone)?;
        self.email = email.to_string();
        self.phone = phone.to_string();
        self.touch();
        Ok(())
    }

    pub fn update_position(&mut self, position: &str, department: &str) -> DomainResult<()> {
        validate_position(position)?;
        validate_department(department)?;
        self.ensure_not_terminated("position")?;
        self.position = position.to_string();
        self.department = department.to_string();
        self.touch();
        Ok(())
    }

    /// An empty address clears it.
    pub fn update_address(&mut self, address: Option<Address>) -> DomainResult<()> {
        if let Some(address) = &address {
            address.validate().map_err(prefix_address)?;
        }
        self.address = address.filter(|a| !a.is_empty());
        self.touch();
        Ok(())
    }

    /// Existence of the manager is checked by the caller.
    pub fn set_manager(&mut self, manager_id: Option<Uuid>) -> DomainResult<()> {
        if manager_id == Some(self.id) {
            return Err(DomainError::SelfManagement);
        }
        self.manager_id = manager_id;
        self.touch();
        Ok(())
    }

    /// Apply a partial update atomically: either every supplied field is
    /// valid and applied, or the employee is left untouched.
    ///
    /// Returns the camelCase names of fields whose value actually changed.
    pub fn apply_update(&mut self, update: EmployeeUpdate) -> DomainResult<Vec<String>> {
        let mut next = self.clone();
        let mut changed = Vec::new();

        if let Some(first_name) = update.first_name {
            validate_name(&first_name, "first name")?;
            if next.first_name != first_name {
                next.first_name = first_name;
                changed.push("firstName");
            }
        }
        if let Some(last_name) = update.last_name {
            validate_name(&last_name, "last name")?;
            if next.last_name != last_name {
                next.last_name = last_name;
                changed.push("lastName");
            }
        }
        if let Some(email) = update.email {
            validate_email(&email)?;
            if next.email != email {
                next.email = email;
                changed.push("email");
            }
        }
        if let Some(phone) = update.phone {
            validate_phone(&phone)?;
            if next.phone != phone {
                next.phone = phone;
                changed.push("phone");
            }
        }
        if let Some(department) = update.department {
            validate_department(&department)?;
            if next.department != department {
                self.ensure_not_terminated("position")?;
                next.department = department;
                changed.push("department");
            }
        }
        if let Some(position) = update.position {
            validate_position(&position)?;
            if next.position != position {
                self.ensure_not_terminated("position")?;
                next.position = position;
                changed.push("position");
            }
        }
        if let Some(salary) = update.salary {
            validate_salary(salary)?;
            if FieldValue::from(next.salary) != FieldValue::from(salary) {
                self.ensure_not_terminated("salary")?;
                next.salary = salary;
                changed.push("salary");
            }
        }
        if let Some(manager_id) = update.manager_id {
            if manager_id == Some(next.id) {
                return Err(DomainError::SelfManagement);
            }
            if next.manager_id != manager_id {
                next.manager_id = manager_id;
                changed.push("managerId");
            }
        }
        if let Some(address) = update.address {
            if let Some(address) = &address {
                address.validate().map_err(prefix_address)?;
            }
            let address = address.filter(|a| !a.is_empty());
            if next.address != address {
                next.address = address;
                changed.push("address");
            }
        }

        next.touch();
        *self = next;
        Ok(changed.into_iter().map(String::from).collect())
    }

    /// Fractional years since hire, using 365.25-day years.
    pub fn years_of_service(&self) -> f64 {
        self.years_of_service_at(Utc::now())
    }

    pub fn years_of_service_at(&self, now: DateTime<Utc>) -> f64 {
        let seconds = (now - self.hire_date).num_seconds() as f64;
        seconds / (DAYS_PER_YEAR * 24.0 * 3600.0)
    }

    /// "N months" under a year, otherwise years to one decimal.
    pub fn tenure_string(&self) -> String {
        self.tenure_string_at(Utc::now())
    }

    pub fn tenure_string_at(&self, now: DateTime<Utc>) -> String {
        let years = self.years_of_service_at(now);
        if years < 1.0 {
            let months = (years * 12.0) as i64;
            format!("{months} month{}", plural(months))
        } else {
            let rounded = format!("{years:.1}");
            let suffix = if rounded == "1.0" { "" } else { "s" };
            format!("{rounded} year{suffix}")
        }
    }

    /// Field values used for audit diffs.
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::from([
            ("id".to_string(), FieldValue::from(self.id)),
            ("firstName".to_string(), self.first_name.as_str().into()),
            ("lastName".to_string(), self.last_name.as_str().into()),
            ("email".to_string(), self.email.as_str().into()),
            ("phone".to_string(), self.phone.as_str().into()),
            ("department".to_string(), self.department.as_str().into()),
            ("position".to_string(), self.position.as_str().into()),
            ("hireDate".to_string(), self.hire_date.into()),
            ("salary".to_string(), self.salary.into()),
            ("status".to_string(), self.status.as_str().into()),
            ("updatedAt".to_string(), self.updated_at.into()),
        ]);
        if let Some(manager_id) = self.manager_id {
            snapshot.insert("managerId".to_string(), manager_id.into());
        }
        if let Some(address) = &self.address {
            snapshot.insert("address".to_string(), address.snapshot().into());
        }
        snapshot
    }

    fn ensure_not_terminated(&self, what: &'static str) -> DomainResult<()> {
        if self.is_terminated() {
            return Err(DomainError::EmployeeTerminated(what));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

fn prefix_address(err: DomainError) -> DomainError {
    match err {
        DomainError::Validation(msg) => DomainError::validation(format!("invalid address: {msg}")),
        other => other,
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
