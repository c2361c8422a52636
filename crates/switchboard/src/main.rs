// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Switchboard - live chat handoff and routing engine.
//!
//! This is the binary entry point.

mod config;
mod serve;
mod shutdown;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Switchboard - live chat handoff and routing engine.
#[derive(Parser, Debug)]
#[command(name = "switchboard", version, about, long_about = None)]
struct Cli {
    /// Path to an explicit config file (skips the XDG hierarchy).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the routing engine and gateway.
    Serve,
    /// Print the resolved configuration.
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config_from_path(path),
        None => config::load_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("switchboard: invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(Commands::Serve) => match serve::run_serve(config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("switchboard serve: {e}");
                ExitCode::FAILURE
            }
        },
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => {
                println!("{rendered}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("switchboard config: {e}");
                ExitCode::FAILURE
            }
        },
        None => {
            println!("switchboard: use --help for available commands");
            ExitCode::SUCCESS
        }
    }
}
