//! Engine-level error taxonomy.
//!
//! Provisioning and schema failures are contained per backend (the backend
//! is degraded, the rest of the process continues). Scenario failures are
//! not contained within a batch: one failing operation fails the whole
//! `run_scenarios` call. Nothing is retried after steady state.

use crate::backend::BackendError;
use crate::types::BackendKind;

/// Backend unreachable after exhausting its bounded retry budget.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} unreachable after {attempts} connection attempts: {last}")]
pub struct ProvisionError {
    pub kind: BackendKind,
    pub attempts: u32,
    pub last: BackendError,
}

/// DDL, pre-step or seeding failed after exhausting retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("{kind} schema setup failed after {attempts} attempts: {last}")]
    Exhausted {
        kind: BackendKind,
        attempts: u32,
        last: BackendError,
    },

    /// A concurrent initializer won the seed sentinel and never committed
    /// within our retry budget.
    #[error("{kind} seeding lost to a concurrent initializer: {last}")]
    SeedRace { kind: BackendKind, last: BackendError },
}

/// A scenario batch failed; surfaced as one fatal error, never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    #[error("backend {0} is not provisioned")]
    UnknownBackend(BackendKind),

    #[error("scenario {scenario} failed on {kind}: {source}")]
    Operation {
        kind: BackendKind,
        scenario: &'static str,
        source: BackendError,
    },

    /// The always-failing operation used to validate error-path telemetry.
    #[error("intentional test failure from the deliberate-failure scenario")]
    Deliberate,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ScenarioError {
    pub(crate) fn operation(
        kind: BackendKind,
        scenario: &'static str,
        source: BackendError,
    ) -> Self {
        ScenarioError::Operation {
            kind,
            scenario,
            source,
        }
    }
}
