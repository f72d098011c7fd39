// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! View document commands
//!
//! Offline: validate, normalize, show, contains.
//! Through the embedded engine: apply, get, list, delete.

use anyhow::{bail, Context, Result};
use clap::{Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};

use catalog_policy_core::{
    application::view_service::{ViewError, ViewService},
    engine_config::PolicyEngineConfigManifest,
    infrastructure::view_document_parser::{DocumentFormat, ViewDocumentParser},
    rule::Intent,
    validation::ViewValidator,
    view::{validate_derived_view, ViewDefinition, ViewDocument},
};

use crate::embedded::EmbeddedEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl From<OutputFormat> for DocumentFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => DocumentFormat::Json,
            OutputFormat::Yaml => DocumentFormat::Yaml,
        }
    }
}

#[derive(Subcommand)]
pub enum ViewCommand {
    /// Validate a view document and report every problem found
    Validate {
        /// Path to view document (JSON or YAML)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Rewrite a view document with duplicate rules and operations removed
    Normalize {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(short, long, value_enum, default_value = "yaml")]
        format: OutputFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the rules of a view document
    Show {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Check that a derived view stays within its parent
    Contains {
        /// Parent view document
        #[arg(long, value_name = "FILE")]
        parent: PathBuf,

        /// Derived view document
        #[arg(long, value_name = "FILE")]
        child: PathBuf,
    },

    /// Create or replace a stored view
    Apply {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Stored view the new view is derived from
        #[arg(long)]
        parent: Option<String>,
    },

    /// Print a stored view document
    Get {
        catalog: String,
        name: String,

        #[arg(short, long, value_enum, default_value = "yaml")]
        format: OutputFormat,
    },

    /// List stored views of a catalog
    List { catalog: String },

    /// Delete a stored view
    Delete { catalog: String, name: String },
}

pub async fn handle_command(command: ViewCommand, config_override: Option<PathBuf>) -> Result<()> {
    let config = PolicyEngineConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    let validator = ViewValidator::from_config(&config.spec.validation);

    match command {
        ViewCommand::Validate { file } => validate(&file, &validator),
        ViewCommand::Normalize {
            file,
            format,
            output,
        } => normalize(&file, &validator, format, output),
        ViewCommand::Show { file } => show(&file, &validator),
        ViewCommand::Contains { parent, child } => contains(&parent, &child, &validator),
        ViewCommand::Apply { file, parent } => {
            let engine = EmbeddedEngine::new(&config).await?;
            apply(&engine, &file, parent.as_deref()).await
        }
        ViewCommand::Get {
            catalog,
            name,
            format,
        } => {
            let engine = EmbeddedEngine::new(&config).await?;
            let doc = engine
                .view_service
                .get_view_document(&catalog, &name)
                .await?;
            print!("{}", ViewDocumentParser::render(&doc, format.into())?);
            Ok(())
        }
        ViewCommand::List { catalog } => {
            let engine = EmbeddedEngine::new(&config).await?;
            let views = engine.view_service.list_views(&catalog).await?;
            if views.is_empty() {
                println!("{}", format!("No views in catalog '{}'", catalog).dimmed());
            }
            for view in views {
                println!(
                    "{}  generation {}  {} rule(s)",
                    view.name().bold(),
                    view.generation,
                    view.rule_set().len()
                );
            }
            Ok(())
        }
        ViewCommand::Delete { catalog, name } => {
            let engine = EmbeddedEngine::new(&config).await?;
            engine.view_service.delete_view(&catalog, &name).await?;
            println!("{}", format!("✓ View '{}' deleted", name).green());
            Ok(())
        }
    }
}

/// Parse and validate a document, printing each validation error.
pub fn load_definition(file: &Path, validator: &ViewValidator) -> Result<ViewDefinition> {
    let doc = ViewDocumentParser::parse_file(file)?;
    match validator.validate(&doc) {
        Ok(definition) => Ok(definition),
        Err(errors) => {
            eprintln!("{}", format!("✗ {}", file.display()).red());
            for error in errors.iter() {
                eprintln!("  - {}", error);
            }
            bail!("{} validation error(s) in {}", errors.len(), file.display())
        }
    }
}

fn validate(file: &Path, validator: &ViewValidator) -> Result<()> {
    let definition = load_definition(file, validator)?;
    println!(
        "{}",
        format!(
            "✓ View '{}' in catalog '{}' is valid ({} rule(s))",
            definition.name,
            definition.catalog,
            definition.rules.len()
        )
        .green()
    );
    Ok(())
}

fn normalize(
    file: &Path,
    validator: &ViewValidator,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let doc = normalized_document(file, validator)?;
    let rendered = ViewDocumentParser::render(&doc, format.into())?;

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("Failed to write view document to {:?}", path))?;
            println!(
                "{}",
                format!("✓ Normalized view written: {}", path.display()).green()
            );
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

pub fn normalized_document(file: &Path, validator: &ViewValidator) -> Result<ViewDocument> {
    Ok(load_definition(file, validator)?.deduplicated().to_document())
}

fn show(file: &Path, validator: &ViewValidator) -> Result<()> {
    let definition = load_definition(file, validator)?;

    println!("{}", format!("View: {}", definition.name).bold());
    println!("  Catalog: {}", definition.catalog);
    if !definition.description.is_empty() {
        println!("  Description: {}", definition.description);
    }
    println!();

    for (idx, rule) in definition.rules.iter().enumerate() {
        let intent = match rule.intent {
            Intent::Allow => rule.intent.as_str().green(),
            Intent::Deny => rule.intent.as_str().red(),
        };
        println!("  [{}] {}", idx, intent);
        let operations: Vec<&str> = rule.operations.iter().map(|op| op.as_str()).collect();
        println!("      operations: {}", operations.join(", "));
        for target in &rule.targets {
            println!("      target:     {}", target);
        }
    }
    Ok(())
}

fn contains(parent: &Path, child: &Path, validator: &ViewValidator) -> Result<()> {
    let parent_def = load_definition(parent, validator)?;
    let child_def = load_definition(child, validator)?.deduplicated();

    validate_derived_view(&parent_def, &child_def)
        .with_context(|| format!("'{}' is not contained in '{}'", child_def.name, parent_def.name))?;

    println!(
        "{}",
        format!(
            "✓ View '{}' stays within '{}'",
            child_def.name, parent_def.name
        )
        .green()
    );
    Ok(())
}

async fn apply(engine: &EmbeddedEngine, file: &Path, parent: Option<&str>) -> Result<()> {
    let doc = ViewDocumentParser::parse_file(file)?;
    let service = &engine.view_service;

    let view = match service.get_view(&doc.metadata.catalog, &doc.metadata.name).await {
        Ok(_) => service.update_view(&doc, parent).await?,
        Err(ViewError::ViewNotFound { .. }) => service.create_view(&doc, parent).await?,
        Err(e) => return Err(e.into()),
    };

    println!(
        "{}",
        format!(
            "✓ View '{}' applied to catalog '{}' (generation {})",
            view.name(),
            view.definition.catalog,
            view.generation
        )
        .green()
    );
    Ok(())
}
