//! MySQL-family scenario backend for loadstone.
//!
//! Implements [`loadstone_core::ScenarioBackend`] over a `sqlx::MySqlPool`,
//! serving both MySQL-protocol kinds: MySQL and MariaDB. Identity retrieval
//! goes through the driver's `last_insert_id()` rather than `RETURNING`;
//! everything else dialect-divergent comes from the capability description
//! in `loadstone_core::dialect`.

pub mod backend;

// Re-exports
pub use backend::MysqlBackend;
