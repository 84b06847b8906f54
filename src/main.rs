mod args;
mod commands;

use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use webrunner::clienv;
use webrunner::config::ServicesConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.or_else(clienv::config_path);
    let config = ServicesConfig::load(config_path.as_deref())?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let port = cli.port.unwrap_or_else(clienv::server_port);
            let static_dir = cli.static_dir.unwrap_or_else(clienv::static_dir);
            commands::run::cmd_run(config, port, static_dir).await?
        }
        Commands::Services => commands::list::cmd_services(&config),
        Commands::Endpoints => commands::list::cmd_endpoints()?,
    }

    Ok(())
}
