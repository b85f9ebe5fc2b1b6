//! Core data types shared across the loadstone crates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of backends the engine knows how to exercise.
///
/// Each kind maps to a [`SqlFamily`] that selects the driver crate, and to a
/// dialect capability description (see [`crate::dialect::SqlDialect`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Postgres,
    Mysql,
    Mariadb,
    Cockroach,
}

impl BackendKind {
    /// Every supported kind, in registry ordering.
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Postgres,
        BackendKind::Mysql,
        BackendKind::Mariadb,
        BackendKind::Cockroach,
    ];

    /// The wire-protocol family this kind speaks.
    pub fn family(&self) -> SqlFamily {
        match self {
            BackendKind::Postgres | BackendKind::Cockroach => SqlFamily::Postgres,
            BackendKind::Mysql | BackendKind::Mariadb => SqlFamily::Mysql,
        }
    }

    /// Conventional server port for this kind.
    pub fn default_port(&self) -> u16 {
        match self {
            BackendKind::Postgres => 5432,
            BackendKind::Mysql | BackendKind::Mariadb => 3306,
            BackendKind::Cockroach => 26257,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Postgres => "postgres",
            BackendKind::Mysql => "mysql",
            BackendKind::Mariadb => "mariadb",
            BackendKind::Cockroach => "cockroach",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown backend name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown backend kind: {0}")]
pub struct UnknownBackendKind(pub String);

impl FromStr for BackendKind {
    type Err = UnknownBackendKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" | "postgresql" => Ok(BackendKind::Postgres),
            "mysql" => Ok(BackendKind::Mysql),
            "mariadb" => Ok(BackendKind::Mariadb),
            "cockroach" | "cockroachdb" => Ok(BackendKind::Cockroach),
            other => Err(UnknownBackendKind(other.to_string())),
        }
    }
}

/// Driver family a backend kind belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlFamily {
    Postgres,
    Mysql,
}

/// Outcome of provisioning one backend.
///
/// A degraded backend is excluded from scenario execution but never aborts
/// startup of the other backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProvisionStatus {
    Healthy,
    Degraded { reason: String },
}

impl ProvisionStatus {
    pub fn degraded(reason: impl Into<String>) -> Self {
        ProvisionStatus::Degraded {
            reason: reason.into(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, ProvisionStatus::Healthy)
    }
}

impl fmt::Display for ProvisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionStatus::Healthy => write!(f, "healthy"),
            ProvisionStatus::Degraded { reason } => write!(f, "degraded: {}", reason),
        }
    }
}

/// One row of the append-only visit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub id: i64,
    pub visit_time: DateTime<Utc>,
}

/// One row of the reference dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: Decimal,
}

/// Canonical result of one scenario batch.
///
/// Every backend's native return shapes are normalized into this record, so a
/// consumer sees the identical shape regardless of which backend answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Identifier assigned by the backend for the NormalWrite insert.
    pub normal_insert_id: i64,
    /// Row count returned by the AggregateRead over the reference dataset.
    pub slow_query_count: i64,
    /// Elapsed milliseconds of the ExplicitWait, measured around the native
    /// wait primitive. Driver scalar returns are discarded.
    pub wait_result: u64,
    /// Price read by the blocked session of the Contention scenario.
    pub blocking_read_price: Decimal,
}

/// What a seeding pass did to the reference dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SeedOutcome {
    /// This pass claimed the seed marker and inserted the rows.
    Seeded { rows: u64 },
    /// The dataset was already seeded; nothing was written.
    AlreadySeeded,
}

impl SeedOutcome {
    pub fn rows_inserted(&self) -> u64 {
        match self {
            SeedOutcome::Seeded { rows } => *rows,
            SeedOutcome::AlreadySeeded => 0,
        }
    }
}
