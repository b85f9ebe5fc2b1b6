//! The backend abstraction every driver crate implements.

use crate::seed::SeedSpec;
use crate::types::{BackendKind, SeedOutcome, VisitRecord};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;

/// Common result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Driver-level fault, already stripped of driver-native error types so it
/// can travel through the engine unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("decode error: {0}")]
    Decode(String),

    /// A concurrent initializer holds the seed sentinel and has not
    /// committed yet. Retryable during initialization only.
    #[error("concurrent seeding in progress: {0}")]
    SeedRace(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl BackendError {
    pub fn is_seed_race(&self) -> bool {
        matches!(self, BackendError::SeedRace(_))
    }
}

/// One provisioned backend: a shared pool plus the scenario operations,
/// expressed over the dialect capability description.
///
/// Implementations must be cheap to clone behind `Arc` and safe to share
/// across concurrent scenario invocations; the pool bounds in-flight
/// operations and must admit at least the two Contention sessions plus the
/// other three operations at once.
#[async_trait]
pub trait ScenarioBackend: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// Apply the idempotent DDL for the visit log, the reference dataset and
    /// the seed sentinel.
    async fn ensure_schema(&self) -> BackendResult<()>;

    /// Seed the reference dataset exactly once, guarded by the sentinel
    /// claim inside a single transaction. Losing a live race yields
    /// [`BackendError::SeedRace`]; finding the dataset populated yields
    /// [`SeedOutcome::AlreadySeeded`].
    async fn seed_products(&self, spec: &SeedSpec) -> BackendResult<SeedOutcome>;

    /// NormalWrite: append one visit row, returning the backend-assigned id.
    async fn insert_visit(&self) -> BackendResult<i64>;

    /// Most-recent-first page of the visit log.
    async fn recent_visits(&self, limit: u32) -> BackendResult<Vec<VisitRecord>>;

    /// AggregateRead: count of reference rows in one category.
    async fn count_category(&self, category: &str) -> BackendResult<i64>;

    /// ExplicitWait: invoke the backend's native delay primitive.
    async fn native_wait(&self, wait: Duration) -> BackendResult<()>;

    /// Contention blocker: open a transaction, take a row-scoped exclusive
    /// lock on `row_id`, hold it for `hold`, then commit.
    async fn lock_row_and_hold(&self, row_id: i64, hold: Duration) -> BackendResult<()>;

    /// Contention blocked session: plain read of the same row's price. The
    /// observed latency is whatever the backend's isolation produces.
    async fn read_product_price(&self, row_id: i64) -> BackendResult<Decimal>;
}
