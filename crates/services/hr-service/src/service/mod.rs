//! Service layer for HR business logic.

mod employee_service;
mod side_effects;
mod user_service;

pub use employee_service::{EmployeeManager, EmployeeService};
pub use side_effects::SideEffects;
pub use user_service::{NewUser, UserManager, UserService, CHANGED_BY_SELF};
