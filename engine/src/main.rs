// Switchyard agent router
// Main entry point for the switchyard binary

use clap::Parser;
use switchyard_engine::cli::{Cli, Command};
use switchyard_engine::config::Config;
use switchyard_engine::handlers::{
    handle_agents, handle_route, handle_run, with_hint, OutputFormat,
};
use switchyard_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load_default(),
    }
    .map_err(with_hint)?;

    // --log wins over the configured level; RUST_LOG wins over both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    tracing::debug!(
        "Switchyard v{} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH")
    );

    match cli.command {
        Command::Run { objective, agent } => handle_run(objective, agent, &config, format).await,
        Command::Route { objective } => handle_route(objective, &config, format).await,
        Command::Agents => handle_agents(&config, format),
    }
}
