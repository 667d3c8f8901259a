//! In-process fan-out of domain events to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::events::DomainEvent;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Failure reported by a single handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(msg: impl Into<String>) -> Self {
        HandlerError(msg.into())
    }
}

/// Every handler failure for one dispatch, in registration order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("event dispatch had {} errors: [{}]", .failures.len(), .failures.join("; "))]
pub struct DispatchError {
    pub event_type: String,
    pub failures: Vec<String>,
}

/// Consumer of domain events.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError>;

    fn can_handle(&self, event_type: &str) -> bool;
}

/// Registry of handlers keyed by event type.
#[derive(Default, Clone)]
pub struct EventDispatcher {
    handlers: HashMap<String, Vec<Arc<dyn EventHandler>>>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> = self
            .handlers
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        f.debug_struct("EventDispatcher")
            .field("handlers", &counts)
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list for `event_type`.
    pub fn register_handler(&mut self, event_type: &str, handler: Arc<dyn EventHandler>) {
        self.handlers
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
    }

    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers.get(event_type).map_or(0, Vec::len)
    }

    /// Run every registered handler that accepts the event's type.
    ///
    /// A failing handler does not stop the others; all failures are
    /// returned together. No registered handlers is success.
    pub async fn dispatch(&self, event: &DomainEvent) -> Result<(), DispatchError> {
        let event_type = event.event_type();
        let Some(handlers) = self.handlers.get(event_type) else {
            return Ok(());
        };

        let mut failures = Vec::new();
        for handler in handlers.iter().filter(|h| h.can_handle(event_type)) {
            if let Err(e) = handler.handle(event).await {
                failures.push(format!("handler failed for event {event_type}: {e}"));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError {
                event_type: event_type.to_string(),
                failures,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::event_types::EMPLOYEE_DELETED;
    use crate::value::Snapshot;
    use uuid::Uuid;

    fn event() -> DomainEvent {
        DomainEvent::employee_deleted(Uuid::new_v4(), Snapshot::new())
    }

    fn handler(accepts: bool, result: Result<(), HandlerError>) -> Arc<dyn EventHandler> {
        let mut mock = MockEventHandler::new();
        mock.expect_can_handle().return_const(accepts);
        let calls = if accepts { 1 } else { 0 };
        mock.expect_handle()
            .times(calls)
            .returning(move |_| result.clone());
        Arc::new(mock)
    }

    #[tokio::test]
    async fn test_no_handlers_is_ok() {
        let dispatcher = EventDispatcher::new();
        assert!(dispatcher.dispatch(&event()).await.is_ok());
    }

    #[tokio::test]
    async fn test_failures_are_aggregated_without_short_circuit() {
        let mut dispatcher = EventDispatcher::new();
        let failing = |msg: &str| handler(true, Err(HandlerError::new(msg)));
        dispatcher.register_handler(EMPLOYEE_DELETED, failing("first"));
        dispatcher.register_handler(EMPLOYEE_DELETED, handler(true, Ok(())));
        dispatcher.register_handler(EMPLOYEE_DELETED, failing("third"));

        let err = dispatcher.dispatch(&event()).await.unwrap_err();
        assert_eq!(err.event_type, EMPLOYEE_DELETED);
        assert_eq!(err.failures.len(), 2);
        assert!(err.to_string().starts_with("event dispatch had 2 errors"));
        assert!(err.failures[1].contains("third"));
    }

    #[tokio::test]
    async fn test_handlers_that_decline_are_skipped() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register_handler(
            EMPLOYEE_DELETED,
            handler(false, Err(HandlerError::new("never"))),
        );
        dispatcher.register_handler(EMPLOYEE_DELETED, handler(true, Ok(())));

        assert!(dispatcher.dispatch(&event()).await.is_ok());
        assert_eq!(dispatcher.handler_count(EMPLOYEE_DELETED), 2);
        assert_eq!(dispatcher.handler_count("employee.created"), 0);
    }

    #[tokio::test]
    async fn test_handlers_for_other_types_are_not_called() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register_handler(
            "employee.created",
            handler(false, Err(HandlerError::new("no"))),
        );
        assert!(dispatcher.dispatch(&event()).await.is_ok());
    }
}
