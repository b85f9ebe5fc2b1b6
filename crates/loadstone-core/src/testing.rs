//! Test doubles for the engine's unit tests.
//!
//! `MockBackend` mimics one backend instance: monotonic visit ids, a
//! sentinel-guarded reference dataset and an optional row lock honored by
//! plain reads, so contention timing is observable without a server.

use crate::backend::{BackendError, BackendResult, ScenarioBackend};
use crate::seed::{generate_products, ProductSeed, SeedSpec};
use crate::types::{BackendKind, SeedOutcome, VisitRecord};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared "server" state, so several mock connects can hit one instance.
#[derive(Default)]
pub struct MockState {
    next_visit_id: AtomicI64,
    visits: Mutex<Vec<VisitRecord>>,
    products: Mutex<Vec<ProductSeed>>,
    seed_marker: tokio::sync::Mutex<bool>,
    row_lock: tokio::sync::Mutex<()>,
    /// Remaining seed attempts that should lose a live race.
    seed_races_left: AtomicU32,
    /// Remaining schema applications that should fail.
    schema_failures_left: AtomicU32,
    /// When set, every scenario operation fails.
    fail_operations: AtomicBool,
    schema_applied: AtomicU32,
}

impl MockState {
    pub fn product_count(&self) -> usize {
        self.products.lock().unwrap().len()
    }

    pub fn schema_applications(&self) -> u32 {
        self.schema_applied.load(Ordering::SeqCst)
    }

    pub fn fail_next_seeds_with_race(&self, n: u32) {
        self.seed_races_left.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_schema_applications(&self, n: u32) {
        self.schema_failures_left.store(n, Ordering::SeqCst);
    }

    pub fn set_fail_operations(&self, fail: bool) {
        self.fail_operations.store(fail, Ordering::SeqCst);
    }
}

pub struct MockBackend {
    kind: BackendKind,
    state: Arc<MockState>,
    honor_locks: bool,
}

impl MockBackend {
    pub fn new(kind: BackendKind) -> Self {
        Self::with_state(kind, Arc::new(MockState::default()))
    }

    pub fn with_state(kind: BackendKind, state: Arc<MockState>) -> Self {
        Self {
            kind,
            state,
            honor_locks: true,
        }
    }

    /// Snapshot-isolation flavour: plain reads ignore the row lock.
    pub fn ignoring_locks(mut self) -> Self {
        self.honor_locks = false;
        self
    }

    pub fn state(&self) -> Arc<MockState> {
        Arc::clone(&self.state)
    }

    fn check_operational(&self) -> BackendResult<()> {
        if self.state.fail_operations.load(Ordering::SeqCst) {
            Err(BackendError::Query("injected failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ScenarioBackend for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn ensure_schema(&self) -> BackendResult<()> {
        let left = &self.state.schema_failures_left;
        if left.load(Ordering::SeqCst) > 0 {
            left.fetch_sub(1, Ordering::SeqCst);
            return Err(BackendError::Schema("injected schema failure".into()));
        }
        self.state.schema_applied.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn seed_products(&self, spec: &SeedSpec) -> BackendResult<SeedOutcome> {
        let races = &self.state.seed_races_left;
        if races.load(Ordering::SeqCst) > 0 {
            races.fetch_sub(1, Ordering::SeqCst);
            return Err(BackendError::SeedRace("marker held by another seeder".into()));
        }

        // The marker mutex stands in for the sentinel row lock: concurrent
        // seeders serialize here, and the loser observes the committed flag.
        let mut marker = self.state.seed_marker.lock().await;
        if *marker {
            return Ok(SeedOutcome::AlreadySeeded);
        }
        let rows = generate_products(spec);
        tokio::task::yield_now().await;
        self.state.products.lock().unwrap().extend(rows);
        *marker = true;
        Ok(SeedOutcome::Seeded {
            rows: spec.rows as u64,
        })
    }

    async fn insert_visit(&self) -> BackendResult<i64> {
        self.check_operational()?;
        let id = self.state.next_visit_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.visits.lock().unwrap().push(VisitRecord {
            id,
            visit_time: Utc::now(),
        });
        Ok(id)
    }

    async fn recent_visits(&self, limit: u32) -> BackendResult<Vec<VisitRecord>> {
        self.check_operational()?;
        let mut visits = self.state.visits.lock().unwrap().clone();
        visits.sort_by(|a, b| b.id.cmp(&a.id));
        visits.truncate(limit as usize);
        Ok(visits)
    }

    async fn count_category(&self, category: &str) -> BackendResult<i64> {
        self.check_operational()?;
        let products = self.state.products.lock().unwrap();
        Ok(products.iter().filter(|p| p.category == category).count() as i64)
    }

    async fn native_wait(&self, wait: Duration) -> BackendResult<()> {
        self.check_operational()?;
        tokio::time::sleep(wait).await;
        Ok(())
    }

    async fn lock_row_and_hold(&self, _row_id: i64, hold: Duration) -> BackendResult<()> {
        self.check_operational()?;
        let _guard = self.state.row_lock.lock().await;
        tokio::time::sleep(hold).await;
        Ok(())
    }

    async fn read_product_price(&self, row_id: i64) -> BackendResult<Decimal> {
        self.check_operational()?;
        if self.honor_locks {
            let _guard = self.state.row_lock.lock().await;
        }
        let products = self.state.products.lock().unwrap();
        products
            .get((row_id - 1) as usize)
            .map(|p| p.price)
            .ok_or_else(|| BackendError::NotFound(format!("product {}", row_id)))
    }
}
