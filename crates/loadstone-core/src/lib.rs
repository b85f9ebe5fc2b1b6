//! Core scenario engine for loadstone.
//!
//! Loadstone exercises multiple independently-addressable relational
//! backends with a uniform set of synthetic scenarios (fast writes, slow
//! aggregate reads, explicit wait-latency and deliberate row-lock
//! contention) to generate realistic, diverse telemetry for testing
//! observability instrumentation.
//!
//! This crate holds everything backend-agnostic: the capability-described
//! dialect layer, the [`backend::ScenarioBackend`] trait, the resilient
//! provisioner, the scenario runner and the load-session supervisor. The
//! driver crates (`loadstone-postgres`, `loadstone-mysql`) implement the
//! trait over their connection pools.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use loadstone_core::{BackendKind, ConnectionConfig, LoadstoneCore};
//!
//! let engine = std::sync::Arc::new(LoadstoneCore::new());
//! let statuses = engine.initialize(&configs, &connector).await;
//! let result = engine.run_scenarios(BackendKind::Postgres).await?;
//! ```

pub mod aggregate;
pub mod backend;
pub mod config;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod loadgen;
pub mod provision;
pub mod registry;
pub mod runner;
pub mod seed;
pub mod types;

#[cfg(test)]
mod testing;

// Re-exports
pub use backend::{BackendError, BackendResult, ScenarioBackend};
pub use config::{ConnectionConfig, RetryPolicy, ScenarioTuning};
pub use dialect::{IdentityRetrieval, SqlDialect, AGGREGATE_CATEGORY, CATEGORIES};
pub use engine::{CoreOptions, LoadstoneCore};
pub use error::{ProvisionError, ScenarioError, SchemaError};
pub use loadgen::{LoadSpec, LoadSupervisor, SessionId, SessionInfo, SessionStatus};
pub use registry::BackendRegistry;
pub use seed::{generate_products, ProductSeed, SeedSpec};
pub use types::{
    BackendKind, ProductRecord, ProvisionStatus, ScenarioResult, SeedOutcome, SqlFamily,
    VisitRecord,
};
