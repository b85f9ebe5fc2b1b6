//! Typed per-backend configuration.
//!
//! Connection parameters are validated once at startup and passed around as
//! structs; connection URLs are rendered exactly once, inside the driver
//! crates, never string-built at call sites.

use crate::types::BackendKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Immutable connection parameters for one backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    /// Administrative database used for the create-database pre-step, when
    /// the kind needs one and the dialect default should be overridden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_database: Option<String>,
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            user: user.into(),
            password: password.into(),
            admin_database: None,
        }
    }

    pub fn with_admin_database(mut self, admin: impl Into<String>) -> Self {
        self.admin_database = Some(admin.into());
        self
    }
}

// Manual Debug so the password never lands in logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("admin_database", &self.admin_database)
            .finish()
    }
}

/// Bounded-retry discipline used during provisioning and schema setup.
///
/// The delay is fixed between attempts, not exponential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Default policy for a kind: fast starters get a short budget, slow
    /// starters a longer one. Same policy shape for every kind.
    pub fn for_kind(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Postgres | BackendKind::Mysql | BackendKind::Mariadb => {
                Self::new(5, Duration::from_secs(3))
            }
            BackendKind::Cockroach => Self::new(12, Duration::from_secs(5)),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(3))
    }
}

/// Fixed durations used by the scenario set.
///
/// The defaults are the contract values; tests shrink them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioTuning {
    /// ExplicitWait duration passed to the backend's native wait primitive.
    pub wait: Duration,
    /// How long the Contention blocker holds its row lock before commit.
    pub hold: Duration,
    /// Contention targets a row id drawn uniformly from `1..=contention_rows`.
    pub contention_rows: u32,
}

impl Default for ScenarioTuning {
    fn default() -> Self {
        Self {
            wait: Duration::from_millis(500),
            hold: Duration::from_millis(1000),
            contention_rows: 100,
        }
    }
}
