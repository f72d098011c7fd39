// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Authorization Dispatch
//!
//! Resource-kind-aware entry point in front of the rule evaluator.
//!
//! | Kind | Evaluated target |
//! |------|------------------|
//! | `Collection` + `collection.create` | `<metadata>/collectionschemas/<spec.schema>` from the request body |
//! | `Attribute` | owning collection (the target itself when `collection=true`) |
//! | everything else | the request target, unchanged |
//!
//! ## Relationships
//! - Consumes `RuleSet::evaluate` from the domain layer
//! - Publishes `AccessDenied` events on the `EventBus`
//! - Emits `catalog_policy_decisions_total` / `catalog_policy_denials_total`

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::events::PolicyEvent;
use crate::domain::operation::Operation;
use crate::domain::policy::{Decision, PolicyDenied};
use crate::domain::resource_uri::{ResourceCollection, RESOURCE_URI_SCHEME};
use crate::domain::rule::RuleSet;
use crate::domain::view::view_resource_uri;
use crate::infrastructure::event_bus::EventBus;

pub const REASON_INVALID_VIEW: &str = "invalid view";
pub const REASON_EMPTY_COLLECTION: &str = "empty collection";
pub const REASON_INVALID_COLLECTION: &str = "invalid collection";
pub const REASON_INVALID_ATTRIBUTE: &str = "invalid attribute";
pub const REASON_INVALID_REQUEST: &str = "invalid request";

/// Resource kinds the request layer dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Catalog,
    Variant,
    Namespace,
    Workspace,
    ParameterSchema,
    CollectionSchema,
    Collection,
    Attribute,
    View,
}

impl ResourceKind {
    /// Map a URL resource name (`collections`, `attributes`, ...) to a kind.
    pub fn from_resource_name(name: &str) -> Option<Self> {
        match name {
            "catalogs" => Some(Self::Catalog),
            "variants" => Some(Self::Variant),
            "namespaces" => Some(Self::Namespace),
            "workspaces" => Some(Self::Workspace),
            "parameterschemas" => Some(Self::ParameterSchema),
            "collectionschemas" => Some(Self::CollectionSchema),
            "collections" => Some(Self::Collection),
            "attributes" => Some(Self::Attribute),
            "views" => Some(Self::View),
            _ => None,
        }
    }

    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::Catalog => "catalogs",
            Self::Variant => "variants",
            Self::Namespace => "namespaces",
            Self::Workspace => "workspaces",
            Self::ParameterSchema => "parameterschemas",
            Self::CollectionSchema => "collectionschemas",
            Self::Collection => "collections",
            Self::Attribute => "attributes",
            Self::View => "views",
        }
    }
}

/// Per-call authorization input. Never persisted.
#[derive(Debug, Clone)]
pub struct PolicyRequest<'a> {
    /// Rule set of the caller's view; `None` when the view could not be resolved.
    pub rule_set: Option<&'a RuleSet>,
    pub kind: ResourceKind,
    /// Hierarchy prefix of the addressed resource, e.g. `res://catalog/c/variant/v`.
    pub metadata: String,
    pub operation: Operation,
    pub target: String,
    pub query_params: HashMap<String, String>,
    pub body: Option<&'a [u8]>,
}

impl<'a> PolicyRequest<'a> {
    pub fn new(
        rule_set: Option<&'a RuleSet>,
        kind: ResourceKind,
        operation: Operation,
        target: impl Into<String>,
    ) -> Self {
        Self {
            rule_set,
            kind,
            metadata: String::new(),
            operation,
            target: target.into(),
            query_params: HashMap::new(),
            body: None,
        }
    }

    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = metadata.into();
        self
    }

    pub fn with_body(mut self, body: &'a [u8]) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }
}

/// The resource the decision is evaluated against for a request.
pub fn resolve_target(request: &PolicyRequest<'_>) -> Result<String, PolicyDenied> {
    match request.kind {
        ResourceKind::Collection if request.operation == Operation::CollectionCreate => {
            let schema = collection_schema_reference(request.body)?;
            Ok(format!(
                "{}/{}/{}",
                request.metadata,
                ResourceCollection::CollectionSchemas.keyword(),
                schema
            ))
        }
        ResourceKind::Attribute => owning_collection(request),
        _ => Ok(request.target.clone()),
    }
}

fn collection_schema_reference(body: Option<&[u8]>) -> Result<String, PolicyDenied> {
    let body = match body {
        Some(b) if !b.is_empty() => b,
        _ => return Err(PolicyDenied::with_reason(REASON_EMPTY_COLLECTION)),
    };
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|_| PolicyDenied::with_reason(REASON_INVALID_COLLECTION))?;
    match value.pointer("/spec/schema").and_then(|s| s.as_str()) {
        Some(schema) if !schema.is_empty() => Ok(schema.to_string()),
        _ => Err(PolicyDenied::with_reason(REASON_INVALID_COLLECTION)),
    }
}

fn owning_collection(request: &PolicyRequest<'_>) -> Result<String, PolicyDenied> {
    if request.query_params.get("collection").map(String::as_str) == Some("true") {
        return Ok(request.target.clone());
    }
    let path = request
        .target
        .strip_prefix(RESOURCE_URI_SCHEME)
        .unwrap_or(&request.target);
    let path = path.strip_prefix('/').unwrap_or(path);
    match path.rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => Ok(format!("{}{}", RESOURCE_URI_SCHEME, parent)),
        _ => Err(PolicyDenied::with_reason(REASON_INVALID_ATTRIBUTE)),
    }
}

/// Decide a request. Returns the decision on success.
pub fn authorize(request: &PolicyRequest<'_>) -> Result<Decision, PolicyDenied> {
    let rule_set = request
        .rule_set
        .ok_or_else(|| PolicyDenied::with_reason(REASON_INVALID_VIEW))?;
    let target = resolve_target(request)?;

    let decision = rule_set.deduplicate().evaluate(request.operation, &target);
    if decision.allowed {
        Ok(decision)
    } else {
        Err(PolicyDenied::new())
    }
}

/// True only if every operation is allowed on `resource`.
pub fn are_operations_allowed(
    rule_set: &RuleSet,
    resource: &str,
    operations: &[Operation],
) -> Result<bool, PolicyDenied> {
    if resource.is_empty() || operations.is_empty() {
        return Err(PolicyDenied::with_reason(REASON_INVALID_REQUEST));
    }
    Ok(operations
        .iter()
        .all(|&op| rule_set.is_action_allowed(op, resource)))
}

/// Whether the rule set may adopt `view` in `catalog`.
pub fn can_adopt_view(rule_set: &RuleSet, catalog: &str, view: &str) -> bool {
    rule_set.is_action_allowed(Operation::CatalogAdoptView, &view_resource_uri(catalog, view))
}

/// Dispatch with audit side effects: counters, logs and `AccessDenied` events.
#[derive(Clone)]
pub struct AuthorizationService {
    event_bus: Arc<EventBus>,
}

impl AuthorizationService {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self { event_bus }
    }

    pub fn authorize(&self, request: &PolicyRequest<'_>) -> Result<Decision, PolicyDenied> {
        let result = authorize(request);
        match &result {
            Ok(decision) => {
                metrics::counter!("catalog_policy_decisions_total", "decision" => "allow")
                    .increment(1);
                debug!(
                    operation = %request.operation,
                    resource = %request.target,
                    rules = ?decision.allowed_by,
                    "Access allowed"
                );
            }
            Err(denied) => {
                let reason = denied.reason.clone().unwrap_or_else(|| "policy".to_string());
                metrics::counter!("catalog_policy_decisions_total", "decision" => "deny")
                    .increment(1);
                metrics::counter!("catalog_policy_denials_total", "reason" => reason.clone())
                    .increment(1);
                info!(
                    operation = %request.operation,
                    resource = %request.target,
                    reason = %reason,
                    "Access denied"
                );
                self.event_bus.publish_policy_event(PolicyEvent::AccessDenied {
                    operation: request.operation.to_string(),
                    resource: request.target.clone(),
                    reason: denied.reason.clone(),
                    denied_at: Utc::now(),
                });
            }
        }
        result
    }
}
