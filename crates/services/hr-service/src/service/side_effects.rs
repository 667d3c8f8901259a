//! Best-effort audit and event publication shared by the services.
//!
//! Nothing here fails the caller's operation: every failure becomes an
//! [`Advisory`] and a warning in the log.

use std::sync::Arc;

use domain::{
    AuditLog, AuditLogRepository, DomainEvent, EventDispatcher, EventStoreRepository, Snapshot,
};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::outcome::{Advisory, AdvisoryKind};

const SKIPPED_CANCELLED: &str = "skipped: request cancelled";

/// Audit log, event store and dispatcher behind one handle.
#[derive(Clone)]
pub struct SideEffects {
    audit_logs: Arc<dyn AuditLogRepository>,
    event_store: Arc<dyn EventStoreRepository>,
    dispatcher: Arc<EventDispatcher>,
}

impl SideEffects {
    pub fn new(
        audit_logs: Arc<dyn AuditLogRepository>,
        event_store: Arc<dyn EventStoreRepository>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            audit_logs,
            event_store,
            dispatcher,
        }
    }

    pub fn audit_logs(&self) -> &Arc<dyn AuditLogRepository> {
        &self.audit_logs
    }

    /// Write an audit entry for `subject_id`, attributed to the context's
    /// actor, then publish `audit_log.created` for it.
    pub(crate) async fn record_audit(
        &self,
        ctx: &RequestContext,
        subject_id: Uuid,
        operation: &str,
        old_values: Snapshot,
        new_values: Snapshot,
        warnings: &mut Vec<Advisory>,
    ) {
        if ctx.is_cancelled() {
            warnings.push(Advisory::new(AdvisoryKind::AuditLog, SKIPPED_CANCELLED));
            return;
        }

        let log = match AuditLog::new(
            subject_id,
            operation,
            &ctx.actor,
            old_values,
            new_values,
            &ctx.ip_address,
            &ctx.user_agent,
        ) {
            Ok(log) => log,
            Err(e) => {
                tracing::warn!(
                    operation,
                    aggregate_id = %subject_id,
                    error = %e,
                    "failed to build audit log"
                );
                warnings.push(Advisory::new(
                    AdvisoryKind::AuditLog,
                    format!("failed to build audit log: {e}"),
                ));
                return;
            }
        };

        if let Err(e) = self.audit_logs.create(&log).await {
            tracing::warn!(
                operation,
                aggregate_id = %subject_id,
                error = %e,
                "failed to create audit log"
            );
            warnings.push(Advisory::new(
                AdvisoryKind::AuditLog,
                format!("failed to create audit log: {e}"),
            ));
            return;
        }

        self.publish(ctx, DomainEvent::audit_log_created(&log), warnings)
            .await;
    }

    /// Append `event` to the store, then hand it to the dispatcher. The two
    /// steps fail independently.
    pub(crate) async fn publish(
        &self,
        ctx: &RequestContext,
        event: DomainEvent,
        warnings: &mut Vec<Advisory>,
    ) {
        let operation = event.event_type();
        let aggregate_id = event.aggregate_id;

        if ctx.is_cancelled() {
            warnings.push(Advisory::new(AdvisoryKind::EventStore, SKIPPED_CANCELLED));
            warnings.push(Advisory::new(AdvisoryKind::Dispatch, SKIPPED_CANCELLED));
            return;
        }
        if let Err(e) = self.event_store.save_event(&event).await {
            tracing::warn!(operation, %aggregate_id, error = %e, "failed to save event");
            warnings.push(Advisory::new(
                AdvisoryKind::EventStore,
                format!("failed to save event: {e}"),
            ));
        }

        if ctx.is_cancelled() {
            warnings.push(Advisory::new(AdvisoryKind::Dispatch, SKIPPED_CANCELLED));
            return;
        }
        if let Err(e) = self.dispatcher.dispatch(&event).await {
            tracing::warn!(operation, %aggregate_id, error = %e, "failed to dispatch event");
            warnings.push(Advisory::new(
                AdvisoryKind::Dispatch,
                format!("failed to dispatch event: {e}"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{
        HandlerError, MockAuditLogRepository, MockEventHandler, MockEventStoreRepository,
        RepositoryError, OP_EMPLOYEE_DELETE,
    };
    use domain::events::event_types::{AUDIT_LOG_CREATED, EMPLOYEE_DELETED};

    fn ctx() -> RequestContext {
        RequestContext::new("admin-1", "192.168.1.10", "tests")
    }

    fn deleted_snapshot() -> Snapshot {
        Snapshot::from([("email".to_string(), "gone@example.com".into())])
    }

    #[tokio::test]
    async fn test_audit_failure_becomes_advisory() {
        let mut audit = MockAuditLogRepository::new();
        audit
            .expect_create()
            .times(1)
            .returning(|_| Err(RepositoryError::backend("audit store down")));
        let mut store = MockEventStoreRepository::new();
        store.expect_save_event().never();

        let effects = SideEffects::new(
            Arc::new(audit),
            Arc::new(store),
            Arc::new(EventDispatcher::new()),
        );
        let mut warnings = Vec::new();
        effects
            .record_audit(
                &ctx(),
                Uuid::new_v4(),
                OP_EMPLOYEE_DELETE,
                deleted_snapshot(),
                Snapshot::new(),
                &mut warnings,
            )
            .await;

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, AdvisoryKind::AuditLog);
        assert!(warnings[0].message.contains("audit store down"));
    }

    #[tokio::test]
    async fn test_successful_audit_publishes_audit_log_created() {
        let mut audit = MockAuditLogRepository::new();
        audit.expect_create().times(1).returning(|_| Ok(()));
        let mut store = MockEventStoreRepository::new();
        store
            .expect_save_event()
            .withf(|event| event.event_type() == AUDIT_LOG_CREATED)
            .times(1)
            .returning(|_| Ok(()));

        let effects = SideEffects::new(
            Arc::new(audit),
            Arc::new(store),
            Arc::new(EventDispatcher::new()),
        );
        let mut warnings = Vec::new();
        effects
            .record_audit(
                &ctx(),
                Uuid::new_v4(),
                OP_EMPLOYEE_DELETE,
                deleted_snapshot(),
                Snapshot::new(),
                &mut warnings,
            )
            .await;
        assert!(warnings.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_ip_skips_audit_write() {
        let mut audit = MockAuditLogRepository::new();
        audit.expect_create().never();
        let effects = SideEffects::new(
            Arc::new(audit),
            Arc::new(MockEventStoreRepository::new()),
            Arc::new(EventDispatcher::new()),
        );
        let ctx = RequestContext::new("admin-1", "not-an-ip", "tests");
        let mut warnings = Vec::new();
        effects
            .record_audit(
                &ctx,
                Uuid::new_v4(),
                OP_EMPLOYEE_DELETE,
                deleted_snapshot(),
                Snapshot::new(),
                &mut warnings,
            )
            .await;
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("invalid IP address"));
    }

    #[tokio::test]
    async fn test_store_and_dispatch_fail_independently() {
        let mut store = MockEventStoreRepository::new();
        store
            .expect_save_event()
            .times(1)
            .returning(|_| Err(RepositoryError::backend("event store down")));

        let mut handler = MockEventHandler::new();
        handler.expect_can_handle().return_const(true);
        handler
            .expect_handle()
            .times(1)
            .returning(|_| Err(HandlerError::new("indexer offline")));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register_handler(EMPLOYEE_DELETED, Arc::new(handler));

        let effects = SideEffects::new(
            Arc::new(MockAuditLogRepository::new()),
            Arc::new(store),
            Arc::new(dispatcher),
        );
        let mut warnings = Vec::new();
        let event = DomainEvent::employee_deleted(Uuid::new_v4(), deleted_snapshot());
        effects.publish(&ctx(), event, &mut warnings).await;

        let kinds: Vec<AdvisoryKind> = warnings.iter().map(|w| w.kind).collect();
        assert_eq!(kinds, vec![AdvisoryKind::EventStore, AdvisoryKind::Dispatch]);
    }

    #[tokio::test]
    async fn test_cancelled_context_skips_everything() {
        let mut audit = MockAuditLogRepository::new();
        audit.expect_create().never();
        let mut store = MockEventStoreRepository::new();
        store.expect_save_event().never();
        let effects = SideEffects::new(
            Arc::new(audit),
            Arc::new(store),
            Arc::new(EventDispatcher::new()),
        );

        let ctx = ctx();
        ctx.cancel();
        let mut warnings = Vec::new();
        effects
            .record_audit(
                &ctx,
                Uuid::new_v4(),
                OP_EMPLOYEE_DELETE,
                deleted_snapshot(),
                Snapshot::new(),
                &mut warnings,
            )
            .await;
        let event = DomainEvent::employee_deleted(Uuid::new_v4(), deleted_snapshot());
        effects.publish(&ctx, event, &mut warnings).await;

        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().all(|w| w.message == SKIPPED_CANCELLED));
    }
}
