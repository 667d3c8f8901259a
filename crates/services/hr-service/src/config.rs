//! HR service configuration.

use std::env;
use std::fmt;
use std::time::Duration;

use common::{LogFormat, ServiceConfig};

use crate::context::SYSTEM_ACTOR;

const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 5000;

/// Administrator account created at start-up when none exists yet.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// HR service configuration.
#[derive(Debug, Clone)]
pub struct HrServiceConfig {
    pub service: ServiceConfig,
    /// Actor id recorded on system-initiated audit entries
    pub system_actor: String,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Deadline the runner applies around each service call
    pub operation_timeout: Duration,
}

impl HrServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let log_format = non_empty("LOG_FORMAT")
            .and_then(|v| v.parse::<LogFormat>().ok())
            .unwrap_or(defaults.service.log_format);

        let bootstrap_admin = match (
            non_empty("HR_BOOTSTRAP_ADMIN_USERNAME"),
            non_empty("HR_BOOTSTRAP_ADMIN_EMAIL"),
            non_empty("HR_BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(email), Some(password)) => Some(BootstrapAdmin {
                username,
                email,
                password,
            }),
            _ => None,
        };

        Self {
            service: ServiceConfig {
                service_name: non_empty("HR_SERVICE_NAME")
                    .unwrap_or(defaults.service.service_name),
                log_level: non_empty("LOG_LEVEL").unwrap_or(defaults.service.log_level),
                log_format,
            },
            system_actor: non_empty("HR_SYSTEM_ACTOR").unwrap_or(defaults.system_actor),
            bootstrap_admin,
            operation_timeout: non_empty("HR_OPERATION_TIMEOUT_MS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.operation_timeout),
        }
    }
}

impl Default for HrServiceConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            system_actor: SYSTEM_ACTOR.to_string(),
            bootstrap_admin: None,
            operation_timeout: Duration::from_millis(DEFAULT_OPERATION_TIMEOUT_MS),
        }
    }
}
