//! Built-in event handlers.

use std::sync::Arc;

use async_trait::async_trait;
use domain::events::event_types;
use domain::{DomainEvent, EventDispatcher, EventHandler, HandlerError};

/// Writes every event it receives to the log.
#[derive(Debug, Clone, Default)]
pub struct LoggingEventHandler;

impl LoggingEventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Register one shared instance for every known event type.
    pub fn register_all(self, dispatcher: &mut EventDispatcher) {
        let handler: Arc<dyn EventHandler> = Arc::new(self);
        for event_type in event_types::ALL {
            dispatcher.register_handler(event_type, Arc::clone(&handler));
        }
    }
}

#[async_trait]
impl EventHandler for LoggingEventHandler {
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        tracing::info!(
            event_id = %event.id,
            event_type = event.event_type(),
            aggregate_id = %event.aggregate_id,
            "domain event"
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            let payload = serde_json::to_string(event)
                .map_err(|e| HandlerError::new(format!("failed to serialize event: {e}")))?;
            tracing::debug!(%payload, "domain event payload");
        }
        Ok(())
    }

    fn can_handle(&self, event_type: &str) -> bool {
        event_types::ALL.contains(&event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Snapshot;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_registers_for_every_event_type() {
        let mut dispatcher = EventDispatcher::new();
        LoggingEventHandler::new().register_all(&mut dispatcher);
        for event_type in event_types::ALL {
            assert_eq!(dispatcher.handler_count(event_type), 1);
        }

        let event = DomainEvent::employee_deleted(Uuid::new_v4(), Snapshot::new());
        assert!(dispatcher.dispatch(&event).await.is_ok());
    }

    #[test]
    fn test_ignores_unknown_types() {
        let handler = LoggingEventHandler::new();
        assert!(handler.can_handle(event_types::USER_LOGGED_IN));
        assert!(!handler.can_handle("payroll.closed"));
    }
}
