//! Connection provisioning and schema initialization.
//!
//! Backends provision concurrently (fan-out/join); attempts for one backend
//! are strictly sequential, bounded, with a fixed inter-attempt delay. A
//! backend that exhausts its budget is marked degraded and excluded. The
//! policy is the same for every kind, and a degraded backend never aborts
//! the others.

use crate::backend::{BackendResult, ScenarioBackend};
use crate::config::{ConnectionConfig, RetryPolicy};
use crate::error::{ProvisionError, SchemaError};
use crate::registry::BackendRegistry;
use crate::seed::SeedSpec;
use crate::types::{BackendKind, SeedOutcome};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Knobs for one provisioning pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvisionOptions {
    pub seed: SeedSpec,
    /// Overrides the per-kind retry defaults when set. Tests shrink this.
    pub retry_override: Option<RetryPolicy>,
}

impl ProvisionOptions {
    fn retry_for(&self, kind: BackendKind) -> RetryPolicy {
        self.retry_override
            .unwrap_or_else(|| RetryPolicy::for_kind(kind))
    }
}

/// Provision every configured backend concurrently and initialize its
/// schema. Always returns a registry; failures surface as degraded entries.
pub async fn provision_all<C, F>(
    configs: &HashMap<BackendKind, ConnectionConfig>,
    options: &ProvisionOptions,
    connector: &C,
) -> BackendRegistry
where
    C: Fn(BackendKind, ConnectionConfig) -> F,
    F: Future<Output = BackendResult<Arc<dyn ScenarioBackend>>>,
{
    let tasks = configs
        .iter()
        .map(|(kind, config)| provision_one(*kind, config.clone(), options, connector));
    let outcomes = futures::future::join_all(tasks).await;

    let mut registry = BackendRegistry::new();
    for (kind, outcome) in outcomes {
        match outcome {
            Ok(backend) => registry.insert(backend),
            Err(reason) => registry.mark_degraded(kind, reason),
        }
    }
    registry
}

async fn provision_one<C, F>(
    kind: BackendKind,
    config: ConnectionConfig,
    options: &ProvisionOptions,
    connector: &C,
) -> (BackendKind, Result<Arc<dyn ScenarioBackend>, String>)
where
    C: Fn(BackendKind, ConnectionConfig) -> F,
    F: Future<Output = BackendResult<Arc<dyn ScenarioBackend>>>,
{
    let retry = options.retry_for(kind);

    let backend = match connect_with_retry(kind, &config, retry, connector).await {
        Ok(backend) => backend,
        Err(err) => {
            error!(backend = %kind, %err, "🔴 provisioning exhausted, running degraded");
            return (kind, Err(err.to_string()));
        }
    };

    match initialize_schema(kind, backend.as_ref(), retry, &options.seed).await {
        Ok(()) => {
            info!(backend = %kind, "✅ backend provisioned and initialized");
            (kind, Ok(backend))
        }
        Err(err) => {
            error!(backend = %kind, %err, "🔴 schema initialization exhausted, running degraded");
            (kind, Err(err.to_string()))
        }
    }
}

async fn connect_with_retry<C, F>(
    kind: BackendKind,
    config: &ConnectionConfig,
    retry: RetryPolicy,
    connector: &C,
) -> Result<Arc<dyn ScenarioBackend>, ProvisionError>
where
    C: Fn(BackendKind, ConnectionConfig) -> F,
    F: Future<Output = BackendResult<Arc<dyn ScenarioBackend>>>,
{
    let attempts = retry.attempts.max(1);
    let mut last = None;
    for attempt in 1..=attempts {
        debug!(backend = %kind, attempt, "connecting");
        match connector(kind, config.clone()).await {
            Ok(backend) => {
                info!(backend = %kind, attempt, "connection established");
                return Ok(backend);
            }
            Err(err) => {
                warn!(
                    backend = %kind,
                    attempt,
                    remaining = attempts - attempt,
                    delay_secs = retry.delay.as_secs_f64(),
                    %err,
                    "connection attempt failed"
                );
                last = Some(err);
                if attempt < attempts {
                    tokio::time::sleep(retry.delay).await;
                }
            }
        }
    }
    Err(ProvisionError {
        kind,
        attempts,
        last: last.expect("at least one attempt"),
    })
}

/// Apply DDL and seed the reference dataset under the same bounded-retry,
/// fixed-delay discipline as connection provisioning.
async fn initialize_schema(
    kind: BackendKind,
    backend: &dyn ScenarioBackend,
    retry: RetryPolicy,
    seed: &SeedSpec,
) -> Result<(), SchemaError> {
    let attempts = retry.attempts.max(1);
    let mut last = None;
    for attempt in 1..=attempts {
        match apply_schema_and_seed(backend, seed).await {
            Ok(()) => return Ok(()),
            Err(err) => {
                if err.is_seed_race() {
                    warn!(backend = %kind, attempt, "seed sentinel held elsewhere, retrying");
                } else {
                    warn!(backend = %kind, attempt, %err, "schema attempt failed");
                }
                last = Some(err);
                if attempt < attempts {
                    tokio::time::sleep(retry.delay).await;
                }
            }
        }
    }
    let last = last.expect("at least one attempt");
    if last.is_seed_race() {
        Err(SchemaError::SeedRace { kind, last })
    } else {
        Err(SchemaError::Exhausted {
            kind,
            attempts,
            last,
        })
    }
}

async fn apply_schema_and_seed(
    backend: &dyn ScenarioBackend,
    seed: &SeedSpec,
) -> BackendResult<()> {
    backend.ensure_schema().await?;
    match backend.seed_products(seed).await? {
        SeedOutcome::Seeded { rows } => {
            info!(backend = %backend.kind(), rows, "reference dataset seeded");
        }
        SeedOutcome::AlreadySeeded => {
            debug!(backend = %backend.kind(), "reference dataset already seeded");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBackend, MockState};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{Duration, Instant};

    fn test_config() -> ConnectionConfig {
        ConnectionConfig::new("127.0.0.1", 5432, "loadstone", "app", "app")
    }

    fn fast_retry(attempts: u32) -> ProvisionOptions {
        ProvisionOptions {
            seed: SeedSpec::new(40),
            retry_override: Some(RetryPolicy::new(attempts, Duration::from_millis(5))),
        }
    }

    #[tokio::test]
    async fn provisions_healthy_backend_first_try() {
        let configs = HashMap::from([(BackendKind::Postgres, test_config())]);
        let registry = provision_all(&configs, &fast_retry(3), &|kind, _| async move {
            Ok(Arc::new(MockBackend::new(kind)) as Arc<dyn ScenarioBackend>)
        })
        .await;

        assert_eq!(registry.healthy_kinds(), vec![BackendKind::Postgres]);
        assert!(registry.statuses()[&BackendKind::Postgres].is_healthy());
    }

    #[tokio::test]
    async fn unreachable_backend_exhausts_its_budget_then_degrades() {
        let attempts_seen = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&attempts_seen);
        let configs = HashMap::from([(BackendKind::Mysql, test_config())]);

        let started = Instant::now();
        let registry = provision_all(&configs, &fast_retry(4), &move |_, _| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Err(crate::backend::BackendError::Connection("refused".into()))
            }
        })
        .await;

        assert_eq!(attempts_seen.load(Ordering::SeqCst), 4);
        // Three fixed inter-attempt delays of 5ms each.
        assert!(started.elapsed() >= Duration::from_millis(15));
        assert!(registry.is_empty());
        let statuses = registry.statuses();
        assert!(!statuses[&BackendKind::Mysql].is_healthy());
        assert!(statuses[&BackendKind::Mysql].to_string().contains("refused"));
    }

    #[tokio::test]
    async fn one_degraded_backend_does_not_affect_the_other() {
        let configs = HashMap::from([
            (BackendKind::Postgres, test_config()),
            (BackendKind::Cockroach, test_config()),
        ]);

        let registry = provision_all(&configs, &fast_retry(2), &|kind, _| async move {
            if kind == BackendKind::Cockroach {
                Err(crate::backend::BackendError::Connection("refused".into()))
            } else {
                Ok(Arc::new(MockBackend::new(kind)) as Arc<dyn ScenarioBackend>)
            }
        })
        .await;

        assert_eq!(registry.healthy_kinds(), vec![BackendKind::Postgres]);
        let statuses = registry.statuses();
        assert!(statuses[&BackendKind::Postgres].is_healthy());
        assert!(!statuses[&BackendKind::Cockroach].is_healthy());
    }

    #[tokio::test]
    async fn schema_failures_are_retried_then_degrade() {
        let state = Arc::new(MockState::default());
        state.fail_next_schema_applications(10);
        let configs = HashMap::from([(BackendKind::Postgres, test_config())]);
        let shared = Arc::clone(&state);

        let registry = provision_all(&configs, &fast_retry(3), &move |kind, _| {
            let state = Arc::clone(&shared);
            async move {
                Ok(Arc::new(MockBackend::with_state(kind, state)) as Arc<dyn ScenarioBackend>)
            }
        })
        .await;

        assert!(registry.is_empty());
        assert!(!registry.statuses()[&BackendKind::Postgres].is_healthy());
    }

    #[tokio::test]
    async fn seed_race_is_retried_until_the_winner_commits() {
        let state = Arc::new(MockState::default());
        state.fail_next_seeds_with_race(2);
        let configs = HashMap::from([(BackendKind::Mariadb, test_config())]);
        let shared = Arc::clone(&state);

        let registry = provision_all(&configs, &fast_retry(5), &move |kind, _| {
            let state = Arc::clone(&shared);
            async move {
                Ok(Arc::new(MockBackend::with_state(kind, state)) as Arc<dyn ScenarioBackend>)
            }
        })
        .await;

        assert_eq!(registry.healthy_kinds(), vec![BackendKind::Mariadb]);
        assert_eq!(state.product_count(), 40);
    }

    #[tokio::test]
    async fn reinitializing_a_seeded_backend_leaves_the_dataset_alone() {
        let state = Arc::new(MockState::default());
        let configs = HashMap::from([(BackendKind::Postgres, test_config())]);

        for _ in 0..2 {
            let shared = Arc::clone(&state);
            let registry = provision_all(&configs, &fast_retry(2), &move |kind, _| {
                let state = Arc::clone(&shared);
                async move {
                    Ok(Arc::new(MockBackend::with_state(kind, state)) as Arc<dyn ScenarioBackend>)
                }
            })
            .await;
            assert_eq!(registry.len(), 1);
        }

        assert_eq!(state.product_count(), 40);
        // The idempotent DDL ran on both passes; only the first one seeded.
        assert_eq!(state.schema_applications(), 2);
    }

    #[tokio::test]
    async fn concurrent_cold_initializers_seed_exactly_once() {
        let state = Arc::new(MockState::default());
        let configs = HashMap::from([(BackendKind::Postgres, test_config())]);
        let options = fast_retry(3);

        let connector = |state: Arc<MockState>| {
            move |kind: BackendKind, _: ConnectionConfig| {
                let state = Arc::clone(&state);
                async move {
                    Ok(Arc::new(MockBackend::with_state(kind, state)) as Arc<dyn ScenarioBackend>)
                }
            }
        };

        let first = connector(Arc::clone(&state));
        let second = connector(Arc::clone(&state));
        let (a, b) = tokio::join!(
            provision_all(&configs, &options, &first),
            provision_all(&configs, &options, &second),
        );

        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        // Exactly one seeding pass landed: never zero, never double.
        assert_eq!(state.product_count(), 40);
    }
}
