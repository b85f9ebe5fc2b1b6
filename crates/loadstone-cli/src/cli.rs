//! Command-line definitions.

use clap::{Parser, Subcommand};
use loadstone_core::BackendKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "loadstone",
    version,
    about = "Exercise relational backends with synthetic scenarios to generate telemetry"
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML configuration file (environment variables override it)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision every configured backend and report per-backend status
    Init,

    /// Run the four-scenario batch against one backend
    Run {
        /// Backend to exercise (postgres, mysql, mariadb, cockroach)
        backend: BackendKind,
    },

    /// Show the most recent visits for one backend
    Visits {
        backend: BackendKind,
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },

    /// Start supervised load sessions and wait for them to finish
    Loadgen {
        /// Session duration in seconds
        #[arg(short, long, default_value_t = 60)]
        duration: u64,
        /// Number of overlapping sessions to start
        #[arg(short, long, default_value_t = 1)]
        sessions: u32,
    },

    /// Provision, run one batch per healthy backend, then generate load
    Exercise {
        /// Load session duration in seconds
        #[arg(short, long, default_value_t = 60)]
        duration: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_backend_name() {
        let cli = Cli::try_parse_from(["loadstone", "run", "cockroach"]).unwrap();
        match cli.command {
            Commands::Run { backend } => assert_eq!(backend, BackendKind::Cockroach),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_backend_names() {
        assert!(Cli::try_parse_from(["loadstone", "run", "oracle"]).is_err());
    }

    #[test]
    fn visits_limit_defaults_to_ten() {
        let cli = Cli::try_parse_from(["loadstone", "visits", "postgres"]).unwrap();
        match cli.command {
            Commands::Visits { limit, .. } => assert_eq!(limit, 10),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
