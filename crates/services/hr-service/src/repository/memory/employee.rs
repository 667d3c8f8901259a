use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::{
    Employee, EmployeeFilter, EmployeeRepository, EmployeeSort, EmployeeStatus, Page, Pagination,
    RepositoryError, RepositoryResult,
};

/// Employees keyed by id; emails are unique, compared case-insensitively.
#[derive(Clone, Default)]
pub struct InMemoryEmployeeRepository {
    employees: Arc<RwLock<HashMap<Uuid, Employee>>>,
}

impl InMemoryEmployeeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.employees.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.employees.read().await.is_empty()
    }
}

fn email_taken(store: &HashMap<Uuid, Employee>, email: &str, except: Uuid) -> bool {
    store
        .values()
        .any(|e| e.id() != except && e.email().eq_ignore_ascii_case(email))
}

fn sorted(
    store: &HashMap<Uuid, Employee>,
    filter: &EmployeeFilter,
    sort: EmployeeSort,
) -> Vec<Employee> {
    let mut matching: Vec<Employee> = store
        .values()
        .filter(|e| filter.matches(e))
        .cloned()
        .collect();
    matching.sort_by(|a, b| sort.compare(a, b));
    matching
}

#[async_trait]
impl EmployeeRepository for InMemoryEmployeeRepository {
    async fn create(&self, employee: &Employee) -> RepositoryResult<()> {
        let mut store = self.employees.write().await;
        if store.contains_key(&employee.id()) {
            return Err(RepositoryError::Duplicate { field: "id" });
        }
        if email_taken(&store, employee.email(), employee.id()) {
            return Err(RepositoryError::Duplicate { field: "email" });
        }
        store.insert(employee.id(), employee.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Employee>> {
        Ok(self.employees.read().await.get(&id).cloned())
    }

    async fn update(&self, employee: &Employee) -> RepositoryResult<()> {
        let mut store = self.employees.write().await;
        if !store.contains_key(&employee.id()) {
            return Err(RepositoryError::NotFound);
        }
        if email_taken(&store, employee.email(), employee.id()) {
            return Err(RepositoryError::Duplicate { field: "email" });
        }
        store.insert(employee.id(), employee.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        self.employees
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Employee>> {
        let store = self.employees.read().await;
        Ok(store
            .values()
            .find(|e| e.email().eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_manager_id(&self, manager_id: Uuid) -> RepositoryResult<Vec<Employee>> {
        let filter = EmployeeFilter {
            manager_id: Some(manager_id),
            ..EmployeeFilter::default()
        };
        Ok(sorted(&*self.employees.read().await, &filter, EmployeeSort::default()))
    }

    async fn find_by_department(&self, department: &str) -> RepositoryResult<Vec<Employee>> {
        let filter = EmployeeFilter {
            department: Some(department.to_string()),
            ..EmployeeFilter::default()
        };
        Ok(sorted(&*self.employees.read().await, &filter, EmployeeSort::default()))
    }

    async fn find_by_status(&self, status: EmployeeStatus) -> RepositoryResult<Vec<Employee>> {
        let filter = EmployeeFilter {
            status: Some(status),
            ..EmployeeFilter::default()
        };
        Ok(sorted(&*self.employees.read().await, &filter, EmployeeSort::default()))
    }

    async fn list(
        &self,
        filter: &EmployeeFilter,
        sort: EmployeeSort,
        pagination: &Pagination,
    ) -> RepositoryResult<Page<Employee>> {
        let matching = sorted(&*self.employees.read().await, filter, sort);
        Page::paginate(matching, pagination, |e| e.id().to_string())
    }

    async fn count(&self, filter: &EmployeeFilter) -> RepositoryResult<u64> {
        let store = self.employees.read().await;
        Ok(store.values().filter(|e| filter.matches(e)).count() as u64)
    }

    async fn exists_by_email(&self, email: &str) -> RepositoryResult<bool> {
        let store = self.employees.read().await;
        Ok(store.values().any(|e| e.email().eq_ignore_ascii_case(email)))
    }

    async fn exists_by_id(&self, id: Uuid) -> RepositoryResult<bool> {
        Ok(self.employees.read().await.contains_key(&id))
    }

    async fn create_many(&self, employees: &[Employee]) -> RepositoryResult<()> {
        let mut store = self.employees.write().await;
        for (i, employee) in employees.iter().enumerate() {
            if store.contains_key(&employee.id())
                || employees[..i].iter().any(|e| e.id() == employee.id())
            {
                return Err(RepositoryError::Duplicate { field: "id" });
            }
            if email_taken(&store, employee.email(), employee.id())
                || employees[..i]
                    .iter()
                    .any(|e| e.email().eq_ignore_ascii_case(employee.email()))
            {
                return Err(RepositoryError::Duplicate { field: "email" });
            }
        }
        for employee in employees {
            store.insert(employee.id(), employee.clone());
        }
        Ok(())
    }

    async fn update_many(&self, employees: &[Employee]) -> RepositoryResult<()> {
        let mut store = self.employees.write().await;
        let mut next = store.clone();
        for employee in employees {
            if !next.contains_key(&employee.id()) {
                return Err(RepositoryError::NotFound);
            }
            next.insert(employee.id(), employee.clone());
        }
        for employee in employees {
            if email_taken(&next, employee.email(), employee.id()) {
                return Err(RepositoryError::Duplicate { field: "email" });
            }
        }
        *store = next;
        Ok(())
    }

    async fn delete_many(&self, ids: &[Uuid]) -> RepositoryResult<()> {
        let mut store = self.employees.write().await;
        if ids.iter().any(|id| !store.contains_key(id)) {
            return Err(RepositoryError::NotFound);
        }
        for id in ids {
            store.remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use domain::{EmployeeSortField, NewEmployee, SortDirection};

    fn employee(first: &str, last: &str, email: &str, salary: f64) -> Employee {
        Employee::new(NewEmployee {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            phone: String::new(),
            department: "Engineering".to_string(),
            position: "Engineer".to_string(),
            hire_date: Utc::now() - Duration::days(30),
            salary,
            manager_id: None,
            address: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_email_uniqueness_is_case_insensitive() {
        let repo = InMemoryEmployeeRepository::new();
        repo.create(&employee("Ada", "Lovelace", "ada@example.com", 1000.0))
            .await
            .unwrap();
        let err = repo
            .create(&employee("Ada", "Byron", "ADA@example.com", 1000.0))
            .await
            .unwrap_err();
        assert_eq!(err, RepositoryError::Duplicate { field: "email" });
        assert!(repo.exists_by_email("Ada@Example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_sorts_filters_and_paginates() {
        let repo = InMemoryEmployeeRepository::new();
        let staff = vec![
            employee("Cy", "Young", "cy@example.com", 40_000.0),
            employee("Al", "Brown", "al@example.com", 90_000.0),
            employee("Bo", "Adams", "bo@example.com", 60_000.0),
        ];
        repo.create_many(&staff).await.unwrap();

        let sort = EmployeeSort::by(EmployeeSortField::Salary, SortDirection::Desc);
        let page = repo
            .list(&EmployeeFilter::default(), sort, &Pagination::new(1, 2))
            .await
            .unwrap();
        let emails: Vec<&str> = page.items.iter().map(|e| e.email()).collect();
        assert_eq!(emails, vec!["al@example.com", "bo@example.com"]);
        assert_eq!(page.total, 3);
        assert!(page.has_next);
        assert!(!page.has_prev);

        let cursor = page.cursors.unwrap().end_cursor.unwrap();
        let next = repo
            .list(
                &EmployeeFilter::default(),
                sort,
                &Pagination::with_cursor(2, cursor),
            )
            .await
            .unwrap();
        assert_eq!(next.items.len(), 1);
        assert_eq!(next.items[0].email(), "cy@example.com");
        assert!(!next.has_next);

        let rich = EmployeeFilter {
            min_salary: Some(50_000.0),
            ..EmployeeFilter::default()
        };
        assert_eq!(repo.count(&rich).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unknown_cursor_is_invalid_query() {
        let repo = InMemoryEmployeeRepository::new();
        repo.create(&employee("Ada", "Lovelace", "ada@example.com", 1000.0))
            .await
            .unwrap();
        let err = repo
            .list(
                &EmployeeFilter::default(),
                EmployeeSort::default(),
                &Pagination::with_cursor(10, "nope"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_bulk_writes_are_all_or_nothing() {
        let repo = InMemoryEmployeeRepository::new();
        let batch = vec![
            employee("Ada", "Lovelace", "ada@example.com", 1000.0),
            employee("Ada", "Byron", "ada@example.com", 1000.0),
        ];
        assert!(repo.create_many(&batch).await.is_err());
        assert!(repo.is_empty().await);

        let kept = employee("Bo", "Adams", "bo@example.com", 1000.0);
        repo.create(&kept).await.unwrap();
        let err = repo
            .delete_many(&[kept.id(), Uuid::new_v4()])
            .await
            .unwrap_err();
        assert_eq!(err, RepositoryError::NotFound);
        assert_eq!(repo.len().await, 1);
    }
}
