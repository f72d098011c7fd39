// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # catpol
//!
//! Command line front end for the catalog view policy engine.
//!
//! ## Commands
//!
//! - `catpol view validate|normalize|show|contains|apply|get|list|delete` - View documents
//! - `catpol check` - Decide one request against a view document
//! - `catpol config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use catalog_policy::commands::{self, CheckArgs, ConfigCommand, ViewCommand};
use catalog_policy_core::engine_config::PolicyEngineConfigManifest;

/// Catalog view policy engine
#[derive(Parser)]
#[command(name = "catpol")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "CATPOL_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to spec.logging.level
    #[arg(long, global = true, env = "CATPOL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format (compact, json); defaults to spec.logging.format
    #[arg(long, global = true, env = "CATPOL_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// View document operations
    #[command(name = "view")]
    View {
        #[command(subcommand)]
        command: ViewCommand,
    },

    /// Decide a single request against a view
    #[command(name = "check")]
    Check(CheckArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging is not up yet, so config loading here is silent
    let logging = PolicyEngineConfigManifest::load_or_default(cli.config.clone())
        .map(|config| config.spec.logging)
        .unwrap_or_default();
    let level = cli.log_level.clone().unwrap_or(logging.level);
    let format = cli.log_format.clone().unwrap_or(logging.format);
    init_logging(&level, &format)?;

    match cli.command {
        Some(Commands::View { command }) => {
            commands::view::handle_command(command, cli.config).await
        }
        Some(Commands::Check(args)) => commands::check::handle_command(args, cli.config).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        "json" => builder.json().init(),
        _ => builder.compact().init(),
    }

    Ok(())
}
