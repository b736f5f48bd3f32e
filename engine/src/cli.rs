//! CLI interface for Switchyard
//!
//! This module provides the command-line interface using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Switchyard agent router
///
/// Routes a free-text objective to the best suited agent and prints the
/// agent's answer.
#[derive(Parser, Debug)]
#[command(name = "switchyard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Route an objective and run the chosen agent
    Run {
        /// The objective to work on
        objective: String,

        /// Skip routing and use this agent
        #[arg(short, long)]
        agent: Option<String>,
    },

    /// Show which agent an objective would be routed to
    Route {
        /// The objective to route
        objective: String,
    },

    /// List configured agents in routing order
    Agents,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["switchyard", "agents"]);
        assert!(matches!(cli.command, Command::Agents));
        assert!(!cli.json);
        assert!(cli.log.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from([
            "switchyard",
            "--json",
            "--log",
            "debug",
            "--config",
            "/tmp/switchyard.toml",
            "agents",
        ]);
        assert!(cli.json);
        assert_eq!(cli.log, Some("debug".to_string()));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/switchyard.toml")));
    }

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from(["switchyard", "run", "Reduce harness cost"]);
        if let Command::Run { objective, agent } = cli.command {
            assert_eq!(objective, "Reduce harness cost");
            assert!(agent.is_none());
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_run_with_explicit_agent() {
        let cli = Cli::parse_from(["switchyard", "run", "x", "--agent", "catchall", "--json"]);
        if let Command::Run { agent, .. } = cli.command {
            assert_eq!(agent, Some("catchall".to_string()));
        } else {
            panic!("Expected Run command");
        }
        assert!(cli.json);
    }

    #[test]
    fn test_route_command() {
        let cli = Cli::parse_from(["switchyard", "route", "Improve seat comfort"]);
        assert!(matches!(cli.command, Command::Route { objective } if objective == "Improve seat comfort"));
    }
}
