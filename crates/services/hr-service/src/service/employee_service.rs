//! Employee service - orchestrates employee lifecycle operations.
//!
//! Each mutation commits through the repository first. Audit logging and
//! event publication follow and only ever add advisories to the outcome.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use domain::{
    DomainEvent, Employee, EmployeeFilter, EmployeeRepository, EmployeeSort, EmployeeSortField,
    EmployeeStatus, EmployeeUpdate, NewEmployee, Page, Pagination, Snapshot, SortDirection,
    OP_EMPLOYEE_CHANGE_STATUS, OP_EMPLOYEE_CREATE, OP_EMPLOYEE_DELETE, OP_EMPLOYEE_UPDATE,
    OP_EMPLOYEE_UPDATE_SALARY,
};

use crate::context::RequestContext;
use crate::error::{ServiceError, ServiceResult};
use crate::outcome::Outcome;
use crate::service::SideEffects;

/// Employee service trait for dependency injection.
#[async_trait]
pub trait EmployeeService: Send + Sync {
    /// Create an employee; the email must be unused and the manager, if any, must exist
    async fn create_employee(
        &self,
        ctx: &RequestContext,
        input: NewEmployee,
    ) -> ServiceResult<Outcome<Employee>>;

    /// Apply a partial update; only supplied fields change
    async fn update_employee(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        update: EmployeeUpdate,
    ) -> ServiceResult<Outcome<Employee>>;

    /// Delete an employee nobody reports to
    async fn delete_employee(&self, ctx: &RequestContext, id: Uuid) -> ServiceResult<Outcome<()>>;

    async fn change_employee_status(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        status: EmployeeStatus,
    ) -> ServiceResult<Outcome<Employee>>;

    async fn update_employee_salary(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        salary: f64,
    ) -> ServiceResult<Outcome<Employee>>;

    async fn get_employee_by_id(&self, ctx: &RequestContext, id: Uuid) -> ServiceResult<Employee>;

    async fn list_employees(
        &self,
        ctx: &RequestContext,
        filter: EmployeeFilter,
        sort: EmployeeSort,
        pagination: Pagination,
    ) -> ServiceResult<Page<Employee>>;

    /// Free-text search, always ordered by name ascending
    async fn search_employees(
        &self,
        ctx: &RequestContext,
        term: &str,
        department: Option<String>,
        status: Option<EmployeeStatus>,
        pagination: Pagination,
    ) -> ServiceResult<Page<Employee>>;
}

/// Concrete implementation of EmployeeService.
pub struct EmployeeManager {
    repo: Arc<dyn EmployeeRepository>,
    effects: SideEffects,
}

impl EmployeeManager {
    pub fn new(repo: Arc<dyn EmployeeRepository>, effects: SideEffects) -> Self {
        Self { repo, effects }
    }

    async fn load(&self, ctx: &RequestContext, id: Uuid) -> ServiceResult<Employee> {
        ctx.ensure_active()?;
        self.repo
            .get_by_id(id)
            .await
            .map_err(ServiceError::repository("failed to get employee"))?
            .ok_or(ServiceError::EmployeeNotFound)
    }

    async fn ensure_manager_exists(
        &self,
        ctx: &RequestContext,
        manager_id: Uuid,
    ) -> ServiceResult<()> {
        ctx.ensure_active()?;
        let exists = self
            .repo
            .exists_by_id(manager_id)
            .await
            .map_err(ServiceError::repository("failed to check manager existence"))?;
        if !exists {
            return Err(ServiceError::ManagerNotFound);
        }
        Ok(())
    }

    async fn save(&self, ctx: &RequestContext, employee: &Employee) -> ServiceResult<()> {
        ctx.ensure_active()?;
        self.repo
            .update(employee)
            .await
            .map_err(|e| match e {
                domain::RepositoryError::NotFound => ServiceError::EmployeeNotFound,
                e => ServiceError::write("failed to update employee")(e),
            })
    }
}

#[async_trait]
impl EmployeeService for EmployeeManager {
    #[tracing::instrument(skip(self, ctx, input), fields(actor = %ctx.actor, email = %input.email))]
    async fn create_employee(
        &self,
        ctx: &RequestContext,
        input: NewEmployee,
    ) -> ServiceResult<Outcome<Employee>> {
        ctx.ensure_active()?;
        let taken = self
            .repo
            .exists_by_email(&input.email)
            .await
            .map_err(ServiceError::repository("failed to check email existence"))?;
        if taken {
            return Err(ServiceError::EmailAlreadyExists);
        }

        if let Some(manager_id) = input.manager_id {
            self.ensure_manager_exists(ctx, manager_id).await?;
        }

        let employee = Employee::new(input)?;

        ctx.ensure_active()?;
        self.repo
            .create(&employee)
            .await
            .map_err(ServiceError::write("failed to create employee"))?;
        tracing::info!(employee_id = %employee.id(), "employee created");

        let mut warnings = Vec::new();
        self.effects
            .record_audit(
                ctx,
                employee.id(),
                OP_EMPLOYEE_CREATE,
                Snapshot::new(),
                employee.snapshot(),
                &mut warnings,
            )
            .await;
        self.effects
            .publish(ctx, DomainEvent::employee_created(&employee), &mut warnings)
            .await;

        Ok(Outcome::new(employee, warnings))
    }

    #[tracing::instrument(skip(self, ctx, update), fields(actor = %ctx.actor, employee_id = %id))]
    async fn update_employee(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        update: EmployeeUpdate,
    ) -> ServiceResult<Outcome<Employee>> {
        let mut employee = self.load(ctx, id).await?;
        let old_values = employee.snapshot();

        if let Some(email) = update.email.as_deref().filter(|e| *e != employee.email()) {
            ctx.ensure_active()?;
            let holder = self
                .repo
                .find_by_email(email)
                .await
                .map_err(ServiceError::repository("failed to check email existence"))?;
            if holder.is_some_and(|other| other.id() != id) {
                return Err(ServiceError::EmailAlreadyExists);
            }
        }

        if let Some(Some(manager_id)) = update.manager_id {
            if employee.manager_id() != Some(manager_id) && manager_id != id {
                self.ensure_manager_exists(ctx, manager_id).await?;
            }
        }

        let changed_fields = employee.apply_update(update)?;
        self.save(ctx, &employee).await?;
        tracing::info!(changed = ?changed_fields, "employee updated");

        let mut warnings = Vec::new();
        self.effects
            .record_audit(
                ctx,
                id,
                OP_EMPLOYEE_UPDATE,
                old_values,
                employee.snapshot(),
                &mut warnings,
            )
            .await;
        self.effects
            .publish(
                ctx,
                DomainEvent::employee_updated(&employee, changed_fields),
                &mut warnings,
            )
            .await;

        Ok(Outcome::new(employee, warnings))
    }

    #[tracing::instrument(skip(self, ctx), fields(actor = %ctx.actor, employee_id = %id))]
    async fn delete_employee(&self, ctx: &RequestContext, id: Uuid) -> ServiceResult<Outcome<()>> {
        let employee = self.load(ctx, id).await?;

        ctx.ensure_active()?;
        let reports = self
            .repo
            .find_by_manager_id(id)
            .await
            .map_err(ServiceError::repository("failed to check direct reports"))?;
        if reports.iter().any(|r| r.id() != id) {
            return Err(ServiceError::EmployeeHasDirectReports);
        }

        ctx.ensure_active()?;
        self.repo.delete(id).await.map_err(|e| match e {
            domain::RepositoryError::NotFound => ServiceError::EmployeeNotFound,
            e => ServiceError::repository("failed to delete employee")(e),
        })?;
        tracing::info!("employee deleted");

        let old_values = employee.snapshot();
        let mut warnings = Vec::new();
        self.effects
            .record_audit(
                ctx,
                id,
                OP_EMPLOYEE_DELETE,
                old_values.clone(),
                Snapshot::new(),
                &mut warnings,
            )
            .await;
        self.effects
            .publish(ctx, DomainEvent::employee_deleted(id, old_values), &mut warnings)
            .await;

        Ok(Outcome::new((), warnings))
    }

    #[tracing::instrument(skip(self, ctx), fields(actor = %ctx.actor, employee_id = %id))]
    async fn change_employee_status(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        status: EmployeeStatus,
    ) -> ServiceResult<Outcome<Employee>> {
        let mut employee = self.load(ctx, id).await?;
        let old_status = employee.status();

        employee.change_status(status)?;
        self.save(ctx, &employee).await?;
        tracing::info!(%old_status, new_status = %status, "employee status changed");

        let mut warnings = Vec::new();
        self.effects
            .record_audit(
                ctx,
                id,
                OP_EMPLOYEE_CHANGE_STATUS,
                Snapshot::from([("status".to_string(), old_status.as_str().into())]),
                Snapshot::from([("status".to_string(), status.as_str().into())]),
                &mut warnings,
            )
            .await;
        self.effects
            .publish(
                ctx,
                DomainEvent::employee_status_changed(id, old_status, status, &ctx.actor),
                &mut warnings,
            )
            .await;

        Ok(Outcome::new(employee, warnings))
    }

    #[tracing::instrument(skip(self, ctx), fields(actor = %ctx.actor, employee_id = %id))]
    async fn update_employee_salary(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        salary: f64,
    ) -> ServiceResult<Outcome<Employee>> {
        let mut employee = self.load(ctx, id).await?;
        let old_salary = employee.salary();

        employee.update_salary(salary)?;
        self.save(ctx, &employee).await?;
        tracing::info!(old_salary, new_salary = salary, "employee salary updated");

        let mut warnings = Vec::new();
        self.effects
            .record_audit(
                ctx,
                id,
                OP_EMPLOYEE_UPDATE_SALARY,
                Snapshot::from([("salary".to_string(), old_salary.into())]),
                Snapshot::from([("salary".to_string(), salary.into())]),
                &mut warnings,
            )
            .await;
        self.effects
            .publish(
                ctx,
                DomainEvent::employee_salary_changed(id, old_salary, salary, &ctx.actor),
                &mut warnings,
            )
            .await;

        Ok(Outcome::new(employee, warnings))
    }

    async fn get_employee_by_id(&self, ctx: &RequestContext, id: Uuid) -> ServiceResult<Employee> {
        self.load(ctx, id).await
    }

    #[tracing::instrument(skip(self, ctx, filter))]
    async fn list_employees(
        &self,
        ctx: &RequestContext,
        filter: EmployeeFilter,
        sort: EmployeeSort,
        pagination: Pagination,
    ) -> ServiceResult<Page<Employee>> {
        ctx.ensure_active()?;
        self.repo
            .list(&filter, sort, &pagination)
            .await
            .map_err(ServiceError::repository("failed to list employees"))
    }

    #[tracing::instrument(skip(self, ctx))]
    async fn search_employees(
        &self,
        ctx: &RequestContext,
        term: &str,
        department: Option<String>,
        status: Option<EmployeeStatus>,
        pagination: Pagination,
    ) -> ServiceResult<Page<Employee>> {
        let filter = EmployeeFilter {
            search: Some(term.to_string()),
            department,
            status,
            ..EmployeeFilter::default()
        };
        let sort = EmployeeSort::by(EmployeeSortField::Name, SortDirection::Asc);
        self.list_employees(ctx, filter, sort, pagination).await
    }
}
