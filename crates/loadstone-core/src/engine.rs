//! The in-process facade consumed by the routing layer.
//!
//! All entry points are plain-data: configs in, statuses and canonical
//! records out. The engine owns the backend registry (constructed by
//! `initialize`, replaced atomically on re-initialization) and the load
//! session supervisor; nothing here is a process-wide global.

use crate::backend::{BackendResult, ScenarioBackend};
use crate::config::{ConnectionConfig, RetryPolicy, ScenarioTuning};
use crate::error::ScenarioError;
use crate::loadgen::{LoadSpec, LoadSupervisor, SessionId, SessionInfo};
use crate::provision::{provision_all, ProvisionOptions};
use crate::registry::BackendRegistry;
use crate::runner;
use crate::seed::SeedSpec;
use crate::types::{BackendKind, ProvisionStatus, ScenarioResult, VisitRecord};
use rand::RngExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Construction-time knobs for [`LoadstoneCore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreOptions {
    pub tuning: ScenarioTuning,
    pub seed: SeedSpec,
    /// Overrides the per-kind retry defaults when set.
    pub retry_override: Option<RetryPolicy>,
}

/// The scenario engine.
pub struct LoadstoneCore {
    registry: RwLock<BackendRegistry>,
    options: CoreOptions,
    supervisor: LoadSupervisor,
}

impl Default for LoadstoneCore {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadstoneCore {
    pub fn new() -> Self {
        Self::with_options(CoreOptions::default())
    }

    pub fn with_options(options: CoreOptions) -> Self {
        Self {
            registry: RwLock::new(BackendRegistry::new()),
            options,
            supervisor: LoadSupervisor::new(),
        }
    }

    /// Provision and initialize every configured backend, replacing any
    /// previous registry. Degraded backends are reported, not fatal.
    pub async fn initialize<C, F>(
        &self,
        configs: &HashMap<BackendKind, ConnectionConfig>,
        connector: &C,
    ) -> HashMap<BackendKind, ProvisionStatus>
    where
        C: Fn(BackendKind, ConnectionConfig) -> F,
        F: Future<Output = BackendResult<Arc<dyn ScenarioBackend>>>,
    {
        let provision_options = ProvisionOptions {
            seed: self.options.seed,
            retry_override: self.options.retry_override,
        };
        let registry = provision_all(configs, &provision_options, connector).await;
        let statuses = registry.statuses();
        *self.registry.write().await = registry;
        statuses
    }

    /// Run the four-scenario batch against one backend. Fail-fast; never
    /// retried.
    pub async fn run_scenarios(&self, kind: BackendKind) -> Result<ScenarioResult, ScenarioError> {
        let backend = self.backend(kind).await?;
        runner::run_batch(backend, self.options.tuning).await
    }

    /// Most-recent-first page of the visit log for one backend.
    pub async fn recent_visits(
        &self,
        kind: BackendKind,
        limit: u32,
    ) -> Result<Vec<VisitRecord>, ScenarioError> {
        let backend = self.backend(kind).await?;
        backend
            .recent_visits(limit)
            .await
            .map_err(|err| ScenarioError::operation(kind, "recent_visits", err))
    }

    /// Always fails; exists to validate failure-path telemetry end to end.
    pub fn deliberate_failure(&self) -> Result<(), ScenarioError> {
        Err(ScenarioError::Deliberate)
    }

    /// CPU-bound busywork on the blocking pool.
    pub async fn cpu_intensive(&self) -> Result<u64, ScenarioError> {
        runner::cpu_intensive().await
    }

    /// Provisioning outcome per backend, as of the last `initialize`.
    pub async fn statuses(&self) -> HashMap<BackendKind, ProvisionStatus> {
        self.registry.read().await.statuses()
    }

    pub async fn healthy_kinds(&self) -> Vec<BackendKind> {
        self.registry.read().await.healthy_kinds()
    }

    /// Start a supervised load session firing random entry points.
    pub async fn start_load_session(self: &Arc<Self>, spec: LoadSpec) -> SessionId {
        let engine = Arc::clone(self);
        self.supervisor
            .start(spec, move || {
                let engine = Arc::clone(&engine);
                async move { engine.load_tick().await }
            })
            .await
    }

    pub async fn load_sessions(&self) -> Vec<SessionInfo> {
        self.supervisor.sessions().await
    }

    pub async fn cancel_load_session(&self, id: &str) -> bool {
        self.supervisor.cancel(id).await
    }

    async fn backend(&self, kind: BackendKind) -> Result<Arc<dyn ScenarioBackend>, ScenarioError> {
        self.registry
            .read()
            .await
            .get(kind)
            .ok_or(ScenarioError::UnknownBackend(kind))
    }

    /// One load-generation tick: pick an entry point at random and invoke
    /// it. Errors are logged and swallowed; the deliberate-failure target
    /// fails by design.
    async fn load_tick(&self) {
        let kinds = self.healthy_kinds().await;
        let target = pick_target(&kinds);
        match target {
            LoadTarget::Scenarios(kind) => match self.run_scenarios(kind).await {
                Ok(result) => {
                    debug!(backend = %kind, insert_id = result.normal_insert_id, "load tick: scenarios")
                }
                Err(err) => debug!(backend = %kind, %err, "load tick: scenarios failed"),
            },
            LoadTarget::Visits(kind) => match self.recent_visits(kind, 10).await {
                Ok(visits) => {
                    debug!(backend = %kind, returned = visits.len(), "load tick: recent visits")
                }
                Err(err) => debug!(backend = %kind, %err, "load tick: recent visits failed"),
            },
            LoadTarget::Cpu => match self.cpu_intensive().await {
                Ok(result) => debug!(result, "load tick: cpu busywork"),
                Err(err) => debug!(%err, "load tick: cpu busywork failed"),
            },
            LoadTarget::Failure => {
                if let Err(err) = self.deliberate_failure() {
                    debug!(%err, "load tick: deliberate failure");
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum LoadTarget {
    Scenarios(BackendKind),
    Visits(BackendKind),
    Cpu,
    Failure,
}

fn pick_target(kinds: &[BackendKind]) -> LoadTarget {
    let mut rng = rand::rng();
    if kinds.is_empty() {
        return if rng.random_bool(0.5) {
            LoadTarget::Cpu
        } else {
            LoadTarget::Failure
        };
    }
    let kind = kinds[rng.random_range(0..kinds.len())];
    match rng.random_range(0..4u8) {
        0 => LoadTarget::Scenarios(kind),
        1 => LoadTarget::Visits(kind),
        2 => LoadTarget::Cpu,
        _ => LoadTarget::Failure,
    }
}
