//! Concurrent execution of the scenario set against one backend.

use crate::aggregate::{canonicalize, RawBatch};
use crate::backend::ScenarioBackend;
use crate::config::ScenarioTuning;
use crate::dialect::AGGREGATE_CATEGORY;
use crate::error::ScenarioError;
use crate::types::ScenarioResult;
use rand::RngExt;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Run all four scenario operations concurrently against one backend and
/// join the results. Fail-fast: the first failing operation fails the whole
/// batch and no partial results are returned.
pub async fn run_batch(
    backend: Arc<dyn ScenarioBackend>,
    tuning: ScenarioTuning,
) -> Result<ScenarioResult, ScenarioError> {
    let kind = backend.kind();
    let contended_row = pick_contended_row(tuning.contention_rows);
    debug!(backend = %kind, contended_row, "running scenario batch");

    let (normal_insert_id, slow_query_count, wait_elapsed, blocking_read_price) = tokio::try_join!(
        normal_write(&backend),
        aggregate_read(&backend),
        explicit_wait(&backend, tuning.wait),
        contention(&backend, contended_row, tuning.hold),
    )?;

    Ok(canonicalize(RawBatch {
        normal_insert_id,
        slow_query_count,
        wait_elapsed,
        blocking_read_price,
    }))
}

// Drawn before the futures are built; the rng must not be held across await.
fn pick_contended_row(contention_rows: u32) -> i64 {
    let mut rng = rand::rng();
    rng.random_range(1..=i64::from(contention_rows.max(1)))
}

async fn normal_write(backend: &Arc<dyn ScenarioBackend>) -> Result<i64, ScenarioError> {
    backend
        .insert_visit()
        .await
        .map_err(|err| ScenarioError::operation(backend.kind(), "normal_write", err))
}

async fn aggregate_read(backend: &Arc<dyn ScenarioBackend>) -> Result<i64, ScenarioError> {
    backend
        .count_category(AGGREGATE_CATEGORY)
        .await
        .map_err(|err| ScenarioError::operation(backend.kind(), "aggregate_read", err))
}

async fn explicit_wait(
    backend: &Arc<dyn ScenarioBackend>,
    wait: Duration,
) -> Result<Duration, ScenarioError> {
    let started = Instant::now();
    backend
        .native_wait(wait)
        .await
        .map_err(|err| ScenarioError::operation(backend.kind(), "explicit_wait", err))?;
    Ok(started.elapsed())
}

/// Two sessions against the same row: the blocker takes the row lock and
/// holds it; the blocked session issues a plain read. The blocker future is
/// polled first, but the sessions race by design; the blocked session's
/// latency is whatever the backend's locking semantics produce.
async fn contention(
    backend: &Arc<dyn ScenarioBackend>,
    row_id: i64,
    hold: Duration,
) -> Result<Decimal, ScenarioError> {
    let blocker = backend.lock_row_and_hold(row_id, hold);
    let blocked = backend.read_product_price(row_id);
    let (lock_outcome, read_outcome) = tokio::join!(blocker, blocked);

    lock_outcome.map_err(|err| ScenarioError::operation(backend.kind(), "contention", err))?;
    read_outcome.map_err(|err| ScenarioError::operation(backend.kind(), "contention", err))
}

const BUSYWORK_ITERATIONS: u64 = 2_000_000;

/// CPU-bound busywork, dispatched to the blocking pool so it cannot stall
/// the scheduler away from the I/O-bound scenario operations.
pub async fn cpu_intensive() -> Result<u64, ScenarioError> {
    tokio::task::spawn_blocking(|| (0..BUSYWORK_ITERATIONS).map(|i| i * i).sum::<u64>())
        .await
        .map_err(|err| ScenarioError::Internal(format!("busywork task failed: {err}")))
}
