//! HR Service Library
//!
//! Employee and user management on top of the `domain` ports: services,
//! request context, advisory outcomes, in-memory adapters and the runner
//! used by the `hr-service` binary.

pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod outcome;
pub mod repository;
pub mod service;

use std::sync::Arc;

use tokio::signal;
use tracing::info;

use domain::{EventDispatcher, Password, User, UserRole};

use crate::config::{BootstrapAdmin, HrServiceConfig};
use crate::context::{with_deadline, RequestContext};
use crate::error::{ServiceError, ServiceResult};
use crate::handlers::LoggingEventHandler;
use crate::repository::{
    InMemoryAuditLogRepository, InMemoryEmployeeRepository, InMemoryEventStore,
    InMemoryUserRepository,
};
use crate::service::{
    EmployeeManager, EmployeeService, NewUser, SideEffects, UserManager, UserService,
};

pub use crate::context::SYSTEM_ACTOR;
pub use crate::outcome::{Advisory, AdvisoryKind, Outcome};

/// Loopback address recorded on audit entries the runner produces.
const LOCAL_IP: &str = "127.0.0.1";

/// Storage shared by both services when running without a database.
#[derive(Clone, Default)]
pub struct InMemoryStores {
    pub employees: InMemoryEmployeeRepository,
    pub users: InMemoryUserRepository,
    pub audit_logs: InMemoryAuditLogRepository,
    pub events: InMemoryEventStore,
}

/// The two service entry points, ready to share across tasks.
#[derive(Clone)]
pub struct HrServices {
    pub employees: Arc<dyn EmployeeService>,
    pub users: Arc<dyn UserService>,
}

impl HrServices {
    pub fn in_memory(stores: &InMemoryStores, dispatcher: EventDispatcher) -> Self {
        let effects = SideEffects::new(
            Arc::new(stores.audit_logs.clone()),
            Arc::new(stores.events.clone()),
            Arc::new(dispatcher),
        );
        Self {
            employees: Arc::new(EmployeeManager::new(
                Arc::new(stores.employees.clone()),
                effects.clone(),
            )),
            users: Arc::new(UserManager::new(Arc::new(stores.users.clone()), effects)),
        }
    }
}

/// Dispatcher with the built-in handlers registered.
pub fn default_dispatcher() -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    LoggingEventHandler::new().register_all(&mut dispatcher);
    dispatcher
}

/// Create the configured admin unless the username is already taken.
///
/// Returns the new account, or `None` when it already existed.
pub async fn seed_bootstrap_admin(
    users: &dyn UserService,
    ctx: &RequestContext,
    admin: &BootstrapAdmin,
) -> ServiceResult<Option<User>> {
    let input = NewUser {
        username: admin.username.clone(),
        email: admin.email.clone(),
        password: admin.password.clone(),
        role: UserRole::Admin,
    };
    match users.create_user(ctx, input).await {
        Ok(outcome) => {
            for warning in &outcome.warnings {
                tracing::warn!(
                    kind = ?warning.kind,
                    message = %warning.message,
                    "bootstrap admin advisory"
                );
            }
            Ok(Some(outcome.into_inner()))
        }
        Err(ServiceError::UsernameAlreadyExists) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Strength-check `plain_text` and return its argon2 PHC string.
pub fn hash_password(plain_text: &str) -> Result<String, domain::DomainError> {
    Ok(Password::new(plain_text)?.into_string())
}

/// Wire the in-memory stack, seed the bootstrap admin and wait for shutdown.
pub async fn run(config: HrServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let stores = InMemoryStores::default();
    let services = HrServices::in_memory(&stores, default_dispatcher());

    if let Some(admin) = &config.bootstrap_admin {
        let ctx = RequestContext::system(LOCAL_IP).with_actor(config.system_actor.as_str());
        let seeded = with_deadline(
            &ctx,
            config.operation_timeout,
            seed_bootstrap_admin(services.users.as_ref(), &ctx, admin),
        )
        .await?;
        match seeded {
            Some(user) => info!(
                user_id = %user.id(),
                username = %user.username(),
                "bootstrap admin created"
            ),
            None => info!(username = %admin.username, "bootstrap admin already present"),
        }
    }

    info!(service = %config.service.service_name, "HR service ready");
    shutdown_signal().await;

    info!(
        employees = stores.employees.len().await,
        users = stores.users.len().await,
        audit_logs = stores.audit_logs.len().await,
        events = stores.events.event_count().await,
        "HR service stopped"
    );
    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
