use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wf-run")]
#[command(version)]
#[command(about = "WebRunner - builds, runs and stops workflow services", long_about = None)]
pub(crate) struct Cli {
    /// Services config (TOML). Can also be set via WF_RUN_CONFIG env var.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// HTTP port for the status endpoints. Defaults to SERVER_PORT or 8080.
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Directory holding WebRunner.html and favicon.ico
    #[arg(long, global = true)]
    pub static_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Commands {
    /// Build and run every service until SIGINT/SIGTERM (default)
    Run,

    /// List the declared services
    Services,

    /// List the HTTP endpoints
    Endpoints,
}
