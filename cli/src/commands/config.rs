// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use catalog_policy_core::engine_config::{PolicyEngineConfigManifest, StorageBackendKind};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./catpol-config.yaml)
        #[arg(short, long, default_value = "./catpol-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output, examples } => generate(output, examples),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = PolicyEngineConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. CATPOL_CONFIG_PATH: {}",
            std::env::var("CATPOL_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./catpol-config.yaml");
        println!("  4. ~/.catpol/config.yaml");
        println!("  5. /etc/catpol/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "Validation:".bold());
    println!(
        "  Supported view version: {}",
        config.spec.validation.supported_version
    );
    println!("  Max name length: {}", config.spec.validation.max_name_length);
    println!();

    println!("{}", "Storage:".bold());
    match config.spec.storage.backend {
        StorageBackendKind::InMemory => println!("  Backend: in-memory"),
        StorageBackendKind::Postgres => {
            println!("  Backend: postgres");
            let configured = config.spec.storage.connection_string.is_some();
            println!(
                "  Connection string: {}",
                if configured { "(set)".normal() } else { "(missing)".red() }
            );
        }
    }
    println!();

    println!("{}", "Events:".bold());
    println!("  Channel capacity: {}", config.spec.events.capacity);
    println!();

    println!("{}", "Logging:".bold());
    println!("  Level: {}", config.spec.logging.level);
    println!("  Format: {}", config.spec.logging.format);

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = PolicyEngineConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
