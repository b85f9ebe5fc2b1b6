//! Application configuration: TOML file plus environment overrides.
//!
//! Each backend is declared under `[backends.<kind>]` or enabled by setting
//! `LOADSTONE_<KIND>_HOST`; per-field environment variables override the
//! file. Validation happens once, at startup; the rest of the process
//! only ever sees typed `ConnectionConfig` values.

use anyhow::{Context, Result};
use loadstone_core::{BackendKind, ConnectionConfig, SqlFamily};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

fn default_seed_rows() -> u32 {
    50_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Reference dataset size applied to every cold backend.
    #[serde(default = "default_seed_rows")]
    pub seed_rows: u32,

    /// Declared backends, keyed by kind name.
    #[serde(default)]
    pub backends: HashMap<String, BackendEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            seed_rows: default_seed_rows(),
            backends: HashMap::new(),
        }
    }
}

/// One backend declaration; unset fields fall back to kind defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendEntry {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub admin_database: Option<String>,
}

impl AppConfig {
    /// Load the file (when given), then apply environment overrides. With
    /// neither present, a single local Postgres backend is assumed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => Self::default(),
        };
        if config.seed_rows == 0 {
            anyhow::bail!("seed_rows must be positive");
        }

        config.apply_env_overrides();

        if config.backends.is_empty() {
            config
                .backends
                .insert("postgres".to_string(), BackendEntry::default());
        }
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        for kind in BackendKind::ALL {
            let prefix = format!("LOADSTONE_{}", kind.as_str().to_uppercase());
            let host = std::env::var(format!("{prefix}_HOST")).ok();
            // Setting the host enables a backend that the file never declared.
            if host.is_none() && !self.backends.contains_key(kind.as_str()) {
                continue;
            }
            let entry = self
                .backends
                .entry(kind.as_str().to_string())
                .or_default();

            if let Some(host) = host {
                entry.host = Some(host);
            }
            if let Some(port) = std::env::var(format!("{prefix}_PORT"))
                .ok()
                .and_then(|p| p.parse().ok())
            {
                entry.port = Some(port);
            }
            if let Ok(database) = std::env::var(format!("{prefix}_DATABASE")) {
                entry.database = Some(database);
            }
            if let Ok(user) = std::env::var(format!("{prefix}_USER")) {
                entry.user = Some(user);
            }
            if let Ok(password) = std::env::var(format!("{prefix}_PASSWORD")) {
                entry.password = Some(password);
            }
        }
    }

    /// Resolve the declarations into typed connection configs.
    pub fn connection_configs(&self) -> Result<HashMap<BackendKind, ConnectionConfig>> {
        let mut configs = HashMap::new();
        for (name, entry) in &self.backends {
            let kind: BackendKind = name
                .parse()
                .with_context(|| format!("in [backends.{name}]"))?;
            configs.insert(kind, resolve_entry(kind, entry));
        }
        Ok(configs)
    }
}

fn resolve_entry(kind: BackendKind, entry: &BackendEntry) -> ConnectionConfig {
    let default_user = match kind.family() {
        SqlFamily::Postgres => "postgres",
        SqlFamily::Mysql => "root",
    };
    let mut config = ConnectionConfig::new(
        entry.host.clone().unwrap_or_else(|| "127.0.0.1".to_string()),
        entry.port.unwrap_or_else(|| kind.default_port()),
        entry.database.clone().unwrap_or_else(|| "loadstone".to_string()),
        entry.user.clone().unwrap_or_else(|| default_user.to_string()),
        entry.password.clone().unwrap_or_else(|| default_user.to_string()),
    );
    if let Some(admin) = &entry.admin_database {
        config = config.with_admin_database(admin.clone());
    }
    config
}
