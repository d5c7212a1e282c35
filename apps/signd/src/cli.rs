// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use clap::{Parser, Subcommand};
use tracing::error;

use crate::config::{Config, LogConfig, ENV_VARS};
use crate::{logging, server};

#[derive(Parser, Debug)]
#[command(author, version, about = "Real-time sign-detection inference service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Starts the signd server
    Serve,
    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the environment variables the server reads, with defaults
    Env,
}

/// Handle the "serve" command - start the server.
/// Exits the process on error with status code 1.
// Allow eprintln before logging is initialized (CLI output)
#[allow(clippy::disallowed_macros)]
async fn handle_serve_command() {
    let _log_guard = match logging::init_logging(&LogConfig::from_env()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            std::process::exit(1);
        }
    };

    let config = Config::from_env();

    if let Err(e) = server::start_server(config).await {
        error!(error = %e, "Failed to start server");
        std::process::exit(1);
    }
}

/// Handle the "config env" command - print the variable table to stdout.
// Allow println for CLI output to stdout (intentional)
#[allow(clippy::disallowed_macros)]
fn handle_config_env_command() {
    println!("# Environment variables read by signd");
    for (name, default, description) in ENV_VARS {
        println!("{name:28} default: {default:36} {description}");
    }
}

/// Handle CLI commands.
pub async fn handle_command(cli: &Cli) {
    match cli.command.as_ref().unwrap_or(&Commands::Serve) {
        Commands::Serve => handle_serve_command().await,
        Commands::Config(ConfigCommands::Env) => handle_config_env_command(),
    }
}
