//! Employee service integration tests against the in-memory adapters.

mod support;

use std::sync::Arc;

use domain::events::event_types::{
    AUDIT_LOG_CREATED, EMPLOYEE_CREATED, EMPLOYEE_DELETED, EMPLOYEE_SALARY_CHANGED,
    EMPLOYEE_UPDATED,
};
use domain::{
    Address, AuditLogRepository, DomainError, EmployeeFilter, EmployeeRepository, EmployeeSort,
    EmployeeStatus, EmployeeUpdate, EventDispatcher, EventKind, EventStoreRepository,
    HandlerError, MockAuditLogRepository, MockEventHandler, Pagination, RepositoryError,
    SalaryChangeType, OP_EMPLOYEE_CREATE, OP_EMPLOYEE_DELETE, OP_EMPLOYEE_UPDATE,
};
use hr_service_lib::error::ServiceError;
use hr_service_lib::service::EmployeeService;
use hr_service_lib::AdvisoryKind;
use uuid::Uuid;

use support::{admin_ctx, new_employee, Harness};

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_then_duplicate_email_fails() {
    let h = Harness::new();
    let ctx = admin_ctx();

    let first = h
        .employees
        .create_employee(&ctx, new_employee("a@x.com"))
        .await
        .unwrap();
    assert!(first.is_clean());

    let err = h
        .employees
        .create_employee(&ctx, new_employee("a@x.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::EmailAlreadyExists));
    assert_eq!(h.stores.employees.len().await, 1);
}

#[tokio::test]
async fn test_create_records_audit_and_event() {
    let h = Harness::new();
    let employee = h
        .employees
        .create_employee(&admin_ctx(), new_employee("grace@example.com"))
        .await
        .unwrap()
        .into_inner();

    let logs = h
        .stores
        .audit_logs
        .find_by_employee_id(employee.id())
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].operation(), OP_EMPLOYEE_CREATE);
    assert!(logs[0].is_creation());
    assert_eq!(logs[0].user_id(), "admin-1");
    assert_eq!(logs[0].ip_address(), support::ADMIN_IP);

    let created = h
        .stores
        .events
        .get_events_by_type(EMPLOYEE_CREATED)
        .await
        .unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].aggregate_id, employee.id());
    assert_eq!(
        h.stores
            .events
            .get_events_by_type(AUDIT_LOG_CREATED)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_audit_failure_does_not_block_creation() {
    let mut audit = MockAuditLogRepository::new();
    audit
        .expect_create()
        .returning(|_| Err(RepositoryError::backend("audit database unreachable")));
    let h = Harness::with_audit(Arc::new(audit));

    let outcome = h
        .employees
        .create_employee(&admin_ctx(), new_employee("grace@example.com"))
        .await
        .expect("create must succeed when the audit write fails");

    assert!(outcome.has_warning(AdvisoryKind::AuditLog));
    let stored = h
        .stores
        .employees
        .get_by_id(outcome.value.id())
        .await
        .unwrap();
    assert_eq!(stored.as_ref(), Some(&outcome.value));
    assert_eq!(
        h.stores
            .events
            .get_events_by_type(EMPLOYEE_CREATED)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_dispatch_failure_is_advisory() {
    let mut handler = MockEventHandler::new();
    handler.expect_can_handle().return_const(true);
    handler
        .expect_handle()
        .returning(|_| Err(HandlerError::new("search index offline")));
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register_handler(EMPLOYEE_CREATED, Arc::new(handler));
    let h = Harness::with_dispatcher(dispatcher);

    let outcome = h
        .employees
        .create_employee(&admin_ctx(), new_employee("grace@example.com"))
        .await
        .unwrap();

    assert!(outcome.has_warning(AdvisoryKind::Dispatch));
    assert!(!outcome.has_warning(AdvisoryKind::AuditLog));
    assert_eq!(h.stores.employees.len().await, 1);
}

#[tokio::test]
async fn test_create_with_unknown_manager_fails() {
    let h = Harness::new();
    let mut input = new_employee("grace@example.com");
    input.manager_id = Some(Uuid::new_v4());

    let err = h
        .employees
        .create_employee(&admin_ctx(), input)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ManagerNotFound));
    assert!(h.stores.employees.is_empty().await);
}

#[tokio::test]
async fn test_salary_boundaries() {
    let h = Harness::new();
    let ctx = admin_ctx();

    let mut zero = new_employee("zero@example.com");
    zero.salary = 0.0;
    let err = h.employees.create_employee(&ctx, zero).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::Validation(ref msg)) if msg == "salary is required"
    ));

    let mut max = new_employee("max@example.com");
    max.salary = 1_000_000.0;
    assert!(h.employees.create_employee(&ctx, max).await.is_ok());

    let mut over = new_employee("over@example.com");
    over.salary = 1_000_001.0;
    assert!(matches!(
        h.employees.create_employee(&ctx, over).await,
        Err(ServiceError::Domain(DomainError::Validation(_)))
    ));
}

#[tokio::test]
async fn test_concurrent_creates_with_same_email_yield_one_employee() {
    let h = Arc::new(Harness::new());
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let h = Arc::clone(&h);
        tasks.push(tokio::spawn(async move {
            h.employees
                .create_employee(&admin_ctx(), new_employee("race@example.com"))
                .await
        }));
    }

    let mut created = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(ServiceError::EmailAlreadyExists) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(h.stores.employees.len().await, 1);
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_audit_diff_lists_only_changed_fields() {
    let h = Harness::new();
    let ctx = admin_ctx();
    let employee = h
        .employees
        .create_employee(&ctx, new_employee("grace@example.com"))
        .await
        .unwrap()
        .into_inner();

    let update = EmployeeUpdate {
        salary: Some(60_000.0),
        ..EmployeeUpdate::default()
    };
    let updated = h
        .employees
        .update_employee(&ctx, employee.id(), update)
        .await
        .unwrap()
        .into_inner();
    assert_eq!(updated.salary(), 60_000.0);

    let logs = h
        .stores
        .audit_logs
        .find_by_operation(OP_EMPLOYEE_UPDATE)
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    let changed = logs[0].get_changed_fields();
    assert!(changed.contains(&"salary".to_string()));
    assert!(!changed.contains(&"status".to_string()));
    assert!(!changed.contains(&"email".to_string()));

    let events = h
        .stores
        .events
        .get_events_by_type(EMPLOYEE_UPDATED)
        .await
        .unwrap();
    match &events[0].kind {
        EventKind::EmployeeUpdated(data) => assert_eq!(data.changed_fields, vec!["salary"]),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_update_email_uniqueness_excludes_self() {
    let h = Harness::new();
    let ctx = admin_ctx();
    let grace = h
        .employees
        .create_employee(&ctx, new_employee("grace@example.com"))
        .await
        .unwrap()
        .into_inner();
    h.employees
        .create_employee(&ctx, new_employee("alan@example.com"))
        .await
        .unwrap();

    let same = EmployeeUpdate {
        email: Some("grace@example.com".to_string()),
        phone: Some("+1 555 0200".to_string()),
        ..EmployeeUpdate::default()
    };
    assert!(h.employees.update_employee(&ctx, grace.id(), same).await.is_ok());

    let taken = EmployeeUpdate {
        email: Some("alan@example.com".to_string()),
        ..EmployeeUpdate::default()
    };
    let err = h
        .employees
        .update_employee(&ctx, grace.id(), taken)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::EmailAlreadyExists));
}

#[tokio::test]
async fn test_self_manager_is_rejected() {
    let h = Harness::new();
    let ctx = admin_ctx();
    let grace = h
        .employees
        .create_employee(&ctx, new_employee("grace@example.com"))
        .await
        .unwrap()
        .into_inner();

    let mut local = grace.clone();
    assert_eq!(
        local.set_manager(Some(grace.id())),
        Err(DomainError::SelfManagement)
    );

    let update = EmployeeUpdate {
        manager_id: Some(Some(grace.id())),
        ..EmployeeUpdate::default()
    };
    let err = h
        .employees
        .update_employee(&ctx, grace.id(), update)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::SelfManagement)));
}

#[tokio::test]
async fn test_invalid_update_leaves_record_untouched() {
    let h = Harness::new();
    let ctx = admin_ctx();
    let grace = h
        .employees
        .create_employee(&ctx, new_employee("grace@example.com"))
        .await
        .unwrap()
        .into_inner();

    let update = EmployeeUpdate {
        first_name: Some("Amazing".to_string()),
        address: Some(Some(Address {
            street: "1 Main Street".to_string(),
            ..Address::default()
        })),
        ..EmployeeUpdate::default()
    };
    assert!(h
        .employees
        .update_employee(&ctx, grace.id(), update)
        .await
        .is_err());

    let stored = h.employees.get_employee_by_id(&ctx, grace.id()).await.unwrap();
    assert_eq!(stored.first_name(), "Grace");
}

#[tokio::test]
async fn test_clearing_manager_and_address_is_audited() {
    let h = Harness::new();
    let ctx = admin_ctx();
    let boss = h
        .employees
        .create_employee(&ctx, new_employee("boss@example.com"))
        .await
        .unwrap()
        .into_inner();
    let mut input = new_employee("report@example.com");
    input.manager_id = Some(boss.id());
    input.address = Some(
        Address::new("123 Main Street", "Springfield", "IL", "62701", "USA").unwrap(),
    );
    let report = h
        .employees
        .create_employee(&ctx, input)
        .await
        .unwrap()
        .into_inner();

    let clear = EmployeeUpdate {
        manager_id: Some(None),
        address: Some(None),
        ..EmployeeUpdate::default()
    };
    let updated = h
        .employees
        .update_employee(&ctx, report.id(), clear)
        .await
        .unwrap()
        .into_inner();
    assert_eq!(updated.manager_id(), None);
    assert!(updated.address().is_none());

    let logs = h
        .stores
        .audit_logs
        .find_by_operation(OP_EMPLOYEE_UPDATE)
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    let changed = logs[0].get_changed_fields();
    assert!(changed.contains(&"managerId".to_string()));
    assert!(changed.contains(&"address".to_string()));
    assert!(logs[0].change_summary().contains("managerId"));
    assert!(logs[0].get_field_change("managerId").unwrap().changed);
}

#[tokio::test]
async fn test_update_missing_employee() {
    let h = Harness::new();
    let err = h
        .employees
        .update_employee(&admin_ctx(), Uuid::new_v4(), EmployeeUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::EmployeeNotFound));
}

// =============================================================================
// Status & salary
// =============================================================================

#[tokio::test]
async fn test_terminated_then_reactivate_is_rejected() {
    let h = Harness::new();
    let ctx = admin_ctx();
    let id = h
        .employees
        .create_employee(&ctx, new_employee("grace@example.com"))
        .await
        .unwrap()
        .into_inner()
        .id();

    h.employees
        .change_employee_status(&ctx, id, EmployeeStatus::Active)
        .await
        .unwrap();
    h.employees
        .change_employee_status(&ctx, id, EmployeeStatus::Terminated)
        .await
        .unwrap();

    let err = h
        .employees
        .change_employee_status(&ctx, id, EmployeeStatus::Active)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::InvalidStatusTransition { .. })
    ));

    assert!(h
        .employees
        .update_employee_salary(&ctx, id, 70_000.0)
        .await
        .is_err());
    let reposition = EmployeeUpdate {
        position: Some("Director".to_string()),
        ..EmployeeUpdate::default()
    };
    assert!(matches!(
        h.employees.update_employee(&ctx, id, reposition).await,
        Err(ServiceError::Domain(DomainError::EmployeeTerminated(_)))
    ));

    let stored = h.employees.get_employee_by_id(&ctx, id).await.unwrap();
    assert!(stored.is_terminated());
    assert_eq!(stored.salary(), 50_000.0);
}

#[tokio::test]
async fn test_salary_change_event_carries_delta() {
    let h = Harness::new();
    let ctx = admin_ctx();
    let id = h
        .employees
        .create_employee(&ctx, new_employee("grace@example.com"))
        .await
        .unwrap()
        .into_inner()
        .id();

    h.employees
        .update_employee_salary(&ctx, id, 55_000.0)
        .await
        .unwrap();

    let events = h
        .stores
        .events
        .get_events_by_type(EMPLOYEE_SALARY_CHANGED)
        .await
        .unwrap();
    match &events[0].kind {
        EventKind::EmployeeSalaryChanged(data) => {
            assert_eq!(data.change_type, SalaryChangeType::Increase);
            assert_eq!(data.change_amount, 5_000.0);
            assert_eq!(data.change_percent, Some(10.0));
            assert_eq!(data.changed_by, "admin-1");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_with_direct_reports_fails_until_reassigned() {
    let h = Harness::new();
    let ctx = admin_ctx();
    let boss = h
        .employees
        .create_employee(&ctx, new_employee("boss@example.com"))
        .await
        .unwrap()
        .into_inner();
    let mut input = new_employee("report@example.com");
    input.manager_id = Some(boss.id());
    let report = h
        .employees
        .create_employee(&ctx, input)
        .await
        .unwrap()
        .into_inner();

    let err = h.employees.delete_employee(&ctx, boss.id()).await.unwrap_err();
    assert!(matches!(err, ServiceError::EmployeeHasDirectReports));

    let detach = EmployeeUpdate {
        manager_id: Some(None),
        ..EmployeeUpdate::default()
    };
    h.employees
        .update_employee(&ctx, report.id(), detach)
        .await
        .unwrap();
    let outcome = h.employees.delete_employee(&ctx, boss.id()).await.unwrap();
    assert!(outcome.is_clean());

    assert!(matches!(
        h.employees.get_employee_by_id(&ctx, boss.id()).await,
        Err(ServiceError::EmployeeNotFound)
    ));
    let logs = h
        .stores
        .audit_logs
        .find_by_operation(OP_EMPLOYEE_DELETE)
        .await
        .unwrap();
    assert!(logs[0].is_deletion());

    let deleted = h
        .stores
        .events
        .get_events_by_type(EMPLOYEE_DELETED)
        .await
        .unwrap();
    match &deleted[0].kind {
        EventKind::EmployeeDeleted(data) => {
            assert_eq!(
                data.old_data.get("email").and_then(|v| v.as_str()),
                Some("boss@example.com")
            );
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

// =============================================================================
// Queries & cancellation
// =============================================================================

#[tokio::test]
async fn test_search_sorts_by_name() {
    let h = Harness::new();
    let ctx = admin_ctx();
    for (first, last, email) in [
        ("Zed", "Young", "zed@example.com"),
        ("Ann", "Young", "ann@example.com"),
        ("Bob", "Adams", "bob@example.com"),
    ] {
        let mut input = new_employee(email);
        input.first_name = first.to_string();
        input.last_name = last.to_string();
        h.employees.create_employee(&ctx, input).await.unwrap();
    }

    let page = h
        .employees
        .search_employees(&ctx, "example.com", None, None, Pagination::default())
        .await
        .unwrap();
    let names: Vec<String> = page.items.iter().map(|e| e.full_name()).collect();
    assert_eq!(names, vec!["Bob Adams", "Ann Young", "Zed Young"]);

    let active = h
        .employees
        .list_employees(
            &ctx,
            EmployeeFilter {
                status: Some(EmployeeStatus::Active),
                ..EmployeeFilter::default()
            },
            EmployeeSort::default(),
            Pagination::new(2, 2),
        )
        .await
        .unwrap();
    assert_eq!(active.total, 3);
    assert_eq!(active.items.len(), 1);
    assert!(active.has_prev);
}

#[tokio::test]
async fn test_cancelled_request_performs_no_writes() {
    let h = Harness::new();
    let ctx = admin_ctx();
    ctx.cancel();

    let err = h
        .employees
        .create_employee(&ctx, new_employee("grace@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Cancelled));
    assert!(h.stores.employees.is_empty().await);
    assert!(h.stores.audit_logs.is_empty().await);
    assert_eq!(h.stores.events.event_count().await, 0);
}
