//! Per-call request metadata and cancellation.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{ServiceError, ServiceResult};

/// Actor recorded for work the service initiates itself.
pub const SYSTEM_ACTOR: &str = "system";

const SYSTEM_USER_AGENT: &str = concat!("hr-service/", env!("CARGO_PKG_VERSION"));

/// Who is calling, from where, and whether they still care about the answer.
///
/// Clones share the cancellation token.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub actor: String,
    pub ip_address: String,
    pub user_agent: String,
    cancel: CancellationToken,
}

impl RequestContext {
    pub fn new(
        actor: impl Into<String>,
        ip_address: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            actor: actor.into(),
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// Context for system-initiated work such as start-up seeding.
    pub fn system(ip_address: impl Into<String>) -> Self {
        Self::new(SYSTEM_ACTOR, ip_address, SYSTEM_USER_AGENT)
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Tie this context to an externally owned token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `Cancelled` once the token has fired.
    pub fn ensure_active(&self) -> ServiceResult<()> {
        if self.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }
        Ok(())
    }
}

/// Run `operation` under a deadline. On expiry the context is cancelled and
/// the operation future is dropped.
pub async fn with_deadline<T, F>(
    ctx: &RequestContext,
    limit: Duration,
    operation: F,
) -> ServiceResult<T>
where
    F: Future<Output = ServiceResult<T>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                actor = %ctx.actor,
                timeout_ms = limit.as_millis() as u64,
                "operation deadline exceeded"
            );
            ctx.cancel();
            Err(ServiceError::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_cancellation() {
        let ctx = RequestContext::new("alice", "10.0.0.1", "tests");
        let clone = ctx.clone();
        assert!(clone.ensure_active().is_ok());

        ctx.cancel();
        assert!(clone.is_cancelled());
        assert!(matches!(clone.ensure_active(), Err(ServiceError::Cancelled)));
    }

    #[test]
    fn test_system_context() {
        let ctx = RequestContext::system("127.0.0.1").with_actor("scheduler");
        assert_eq!(ctx.actor, "scheduler");
        assert!(ctx.user_agent.starts_with("hr-service/"));
    }

    #[tokio::test]
    async fn test_deadline_cancels_context() {
        let ctx = RequestContext::system("127.0.0.1");
        let result: ServiceResult<()> = with_deadline(&ctx, Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(ServiceError::Cancelled)));
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_deadline_passes_result_through() {
        let ctx = RequestContext::system("127.0.0.1");
        let value = with_deadline(&ctx, Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert!(!ctx.is_cancelled());
    }
}
