//! Explicit backend registry.
//!
//! Constructed once by the provisioner and passed by reference into every
//! component that needs backend access; there are no ambient globals.

use crate::backend::ScenarioBackend;
use crate::types::{BackendKind, ProvisionStatus};
use std::collections::HashMap;
use std::sync::Arc;

/// Provisioned backends plus the per-backend provisioning outcome.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<BackendKind, Arc<dyn ScenarioBackend>>,
    statuses: HashMap<BackendKind, ProvisionStatus>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a healthy backend.
    pub fn insert(&mut self, backend: Arc<dyn ScenarioBackend>) {
        let kind = backend.kind();
        self.backends.insert(kind, backend);
        self.statuses.insert(kind, ProvisionStatus::Healthy);
    }

    /// Record a degraded backend; it is excluded from scenario execution.
    pub fn mark_degraded(&mut self, kind: BackendKind, reason: impl Into<String>) {
        self.backends.remove(&kind);
        self.statuses
            .insert(kind, ProvisionStatus::degraded(reason));
    }

    /// The backend for a kind, if it provisioned healthily.
    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn ScenarioBackend>> {
        self.backends.get(&kind).cloned()
    }

    /// Kinds currently available for scenario execution.
    pub fn healthy_kinds(&self) -> Vec<BackendKind> {
        let mut kinds: Vec<_> = self.backends.keys().copied().collect();
        kinds.sort_by_key(|k| BackendKind::ALL.iter().position(|c| c == k));
        kinds
    }

    pub fn statuses(&self) -> HashMap<BackendKind, ProvisionStatus> {
        self.statuses.clone()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("healthy", &self.healthy_kinds())
            .field("statuses", &self.statuses)
            .finish()
    }
}
