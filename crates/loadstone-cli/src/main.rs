use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use loadstone_core::backend::{BackendResult, ScenarioBackend};
use loadstone_core::{
    BackendKind, ConnectionConfig, CoreOptions, LoadSpec, LoadstoneCore, SeedSpec, SqlFamily,
};
use loadstone_mysql::MysqlBackend;
use loadstone_postgres::PostgresBackend;

mod cli;
mod config;

use cli::{Cli, Commands};
use config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = format!(
        "loadstone_cli={0},loadstone_core={0},loadstone_postgres={0},loadstone_mysql={0}",
        log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .init();

    let app_config = AppConfig::load(cli.config.as_deref())?;
    let configs = app_config.connection_configs()?;
    info!(backends = configs.len(), "configuration loaded");

    let engine = Arc::new(LoadstoneCore::with_options(CoreOptions {
        seed: SeedSpec::new(app_config.seed_rows),
        ..CoreOptions::default()
    }));

    let statuses = engine.initialize(&configs, &connect_backend).await;
    let mut kinds: Vec<_> = statuses.keys().copied().collect();
    kinds.sort_by_key(|k| BackendKind::ALL.iter().position(|c| c == k));
    for kind in &kinds {
        info!(backend = %kind, status = %statuses[kind], "provisioning outcome");
    }

    match cli.command {
        Commands::Init => {
            for kind in &kinds {
                println!("{:<10} {}", kind.to_string(), statuses[kind]);
            }
        }

        Commands::Run { backend } => {
            let result = engine.run_scenarios(backend).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Visits { backend, limit } => {
            let visits = engine.recent_visits(backend, limit).await?;
            println!("{}", serde_json::to_string_pretty(&visits)?);
        }

        Commands::Loadgen { duration, sessions } => {
            let spec = LoadSpec {
                duration: Duration::from_secs(duration),
                ..LoadSpec::default()
            };
            for _ in 0..sessions.max(1) {
                let id = engine.start_load_session(spec).await;
                info!(session = %id, "session started");
            }
            wait_for_sessions(&engine).await;
        }

        Commands::Exercise { duration } => {
            let healthy = engine.healthy_kinds().await;
            if healthy.is_empty() {
                warn!("no healthy backends; nothing to exercise");
                return Ok(());
            }
            for kind in &healthy {
                match engine.run_scenarios(*kind).await {
                    Ok(result) => {
                        println!("{kind}: {}", serde_json::to_string(&result)?);
                    }
                    Err(err) => warn!(backend = %kind, %err, "scenario batch failed"),
                }
            }
            let spec = LoadSpec {
                duration: Duration::from_secs(duration),
                ..LoadSpec::default()
            };
            let id = engine.start_load_session(spec).await;
            info!(session = %id, "load session started");
            wait_for_sessions(&engine).await;
        }
    }

    Ok(())
}

/// Wire a backend kind to its driver crate. The engine only ever sees the
/// `ScenarioBackend` trait.
async fn connect_backend(
    kind: BackendKind,
    config: ConnectionConfig,
) -> BackendResult<Arc<dyn ScenarioBackend>> {
    match kind.family() {
        SqlFamily::Postgres => {
            Ok(Arc::new(PostgresBackend::connect(kind, config).await?) as Arc<dyn ScenarioBackend>)
        }
        SqlFamily::Mysql => {
            Ok(Arc::new(MysqlBackend::connect(kind, config).await?) as Arc<dyn ScenarioBackend>)
        }
    }
}

/// Block until every supervised load session reaches a terminal state.
async fn wait_for_sessions(engine: &Arc<LoadstoneCore>) {
    loop {
        let sessions = engine.load_sessions().await;
        if sessions.iter().all(|s| s.status.is_terminal()) {
            for session in &sessions {
                info!(session = %session.id, status = %session.status, "session finished");
            }
            return;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}
