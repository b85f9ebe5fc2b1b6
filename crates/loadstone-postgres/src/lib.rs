//! PostgreSQL-family scenario backend for loadstone.
//!
//! Implements [`loadstone_core::ScenarioBackend`] over a `sqlx::PgPool`.
//! One crate serves both PostgreSQL-protocol kinds: stock Postgres and
//! CockroachDB. Everything dialect-divergent comes from the capability
//! description in `loadstone_core::dialect`.

pub mod backend;

// Re-exports
pub use backend::PostgresBackend;
