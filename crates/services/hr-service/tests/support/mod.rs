//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use domain::{AuditLogRepository, EventDispatcher, NewEmployee};
use hr_service_lib::context::RequestContext;
use hr_service_lib::service::{EmployeeManager, SideEffects, UserManager};
use hr_service_lib::InMemoryStores;

pub const ADMIN_IP: &str = "192.168.10.5";

pub fn admin_ctx() -> RequestContext {
    RequestContext::new("admin-1", ADMIN_IP, "integration-tests")
}

pub fn new_employee(email: &str) -> NewEmployee {
    NewEmployee {
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        email: email.to_string(),
        phone: "+1 555 0199".to_string(),
        department: "Engineering".to_string(),
        position: "Engineer".to_string(),
        hire_date: Utc::now() - Duration::days(3 * 365),
        salary: 50_000.0,
        manager_id: None,
        address: None,
    }
}

/// Services over fresh in-memory stores.
pub struct Harness {
    pub stores: InMemoryStores,
    pub employees: EmployeeManager,
    pub users: UserManager,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_dispatcher(EventDispatcher::new())
    }

    pub fn with_dispatcher(dispatcher: EventDispatcher) -> Self {
        let stores = InMemoryStores::default();
        let audit: Arc<dyn AuditLogRepository> = Arc::new(stores.audit_logs.clone());
        Self::build(stores, audit, dispatcher)
    }

    /// Same stores, but audit writes go to `audit`.
    pub fn with_audit(audit: Arc<dyn AuditLogRepository>) -> Self {
        Self::build(InMemoryStores::default(), audit, EventDispatcher::new())
    }

    fn build(
        stores: InMemoryStores,
        audit: Arc<dyn AuditLogRepository>,
        dispatcher: EventDispatcher,
    ) -> Self {
        let effects = SideEffects::new(
            audit,
            Arc::new(stores.events.clone()),
            Arc::new(dispatcher),
        );
        Self {
            employees: EmployeeManager::new(Arc::new(stores.employees.clone()), effects.clone()),
            users: UserManager::new(Arc::new(stores.users.clone()), effects),
            stores,
        }
    }
}
