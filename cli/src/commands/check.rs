// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `catpol check` - decide a request against a view document.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use catalog_policy_core::{
    application::authorization::{
        are_operations_allowed, AuthorizationService, PolicyRequest, ResourceKind,
    },
    engine_config::PolicyEngineConfigManifest,
    infrastructure::event_bus::EventBus,
    operation::Operation,
    policy::{Decision, PolicyDenied},
    rule::RuleSet,
    validation::ViewValidator,
};

use super::view::load_definition;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// View document whose rules are evaluated
    #[arg(long, value_name = "FILE")]
    pub view: PathBuf,

    /// Operation to check, e.g. namespace.list (repeat to require all)
    #[arg(long = "operation", short = 'o', required = true)]
    pub operations: Vec<String>,

    /// Resource URI, e.g. res://catalog/sales/variant/prod
    #[arg(long, short = 'r')]
    pub resource: String,

    /// Resource kind used for request dispatch (collections, attributes, ...)
    #[arg(long)]
    pub kind: Option<String>,

    /// Hierarchy prefix of the addressed resource
    #[arg(long, default_value = "")]
    pub metadata: String,

    /// Request body file (collection create requests)
    #[arg(long, value_name = "FILE")]
    pub body: Option<PathBuf>,

    /// Treat an attribute target as the collection itself
    #[arg(long)]
    pub collection: bool,
}

pub async fn handle_command(args: CheckArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config = PolicyEngineConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    let validator = ViewValidator::from_config(&config.spec.validation);

    let rules = load_definition(&args.view, &validator)?.rules;
    let operations = parse_operations(&args.operations)?;

    if operations.len() > 1 {
        let allowed = are_operations_allowed(&rules, &args.resource, &operations)?;
        report_all(allowed, &operations, &args.resource);
        return Ok(());
    }

    let body = match &args.body {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("Failed to read body from {:?}", path))?,
        ),
        None => None,
    };

    let event_bus = Arc::new(EventBus::new(config.spec.events.capacity));
    let service = AuthorizationService::new(event_bus);
    let result = decide(&service, &rules, &args, operations[0], body.as_deref())?;
    report(&result, operations[0], &args.resource);
    Ok(())
}

fn parse_operations(raw: &[String]) -> Result<Vec<Operation>> {
    raw.iter()
        .map(|s| {
            s.parse::<Operation>()
                .with_context(|| format!("Unknown operation '{}'", s))
        })
        .collect()
}

fn decide(
    service: &AuthorizationService,
    rules: &RuleSet,
    args: &CheckArgs,
    operation: Operation,
    body: Option<&[u8]>,
) -> Result<Result<Decision, PolicyDenied>> {
    let kind = match &args.kind {
        Some(name) => match ResourceKind::from_resource_name(name) {
            Some(kind) => kind,
            None => bail!("Unknown resource kind '{}'", name),
        },
        None => default_kind(operation),
    };

    let mut request = PolicyRequest::new(Some(rules), kind, operation, args.resource.clone())
        .with_metadata(args.metadata.clone());
    if let Some(body) = body {
        request = request.with_body(body);
    }
    if args.collection {
        request = request.with_query_param("collection", "true");
    }

    Ok(service.authorize(&request))
}

fn default_kind(operation: Operation) -> ResourceKind {
    use catalog_policy_core::resource_uri::ResourceType;
    match operation.resource_type() {
        ResourceType::Catalog => ResourceKind::Catalog,
        ResourceType::Variant => ResourceKind::Variant,
        ResourceType::Namespace => ResourceKind::Namespace,
        ResourceType::Workspace => ResourceKind::Workspace,
        ResourceType::Schema => ResourceKind::CollectionSchema,
        ResourceType::Collection => ResourceKind::Collection,
    }
}

fn report(result: &Result<Decision, PolicyDenied>, operation: Operation, resource: &str) {
    match result {
        Ok(decision) => {
            println!("{} {} on {}", "ALLOW".green().bold(), operation, resource);
            let rules: Vec<String> = decision.allowed_by.iter().map(|i| i.to_string()).collect();
            println!("  granted by rule(s): {}", rules.join(", "));
        }
        Err(denied) => {
            println!("{} {} on {}", "DENY".red().bold(), operation, resource);
            if let Some(reason) = &denied.reason {
                println!("  reason: {}", reason);
            }
        }
    }
}

fn report_all(allowed: bool, operations: &[Operation], resource: &str) {
    let names: Vec<&str> = operations.iter().map(|op| op.as_str()).collect();
    let verdict = if allowed {
        "ALLOW".green().bold()
    } else {
        "DENY".red().bold()
    };
    println!("{} [{}] on {}", verdict, names.join(", "), resource);
}
