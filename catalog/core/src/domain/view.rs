// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! View aggregate and its policy document.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Named, versioned policy container owned 1:1 by a catalog
//!
//! A [`ViewDocument`] is the caller-supplied wire form. It is deliberately
//! lenient: every field defaults so that missing attributes reach
//! [`ViewValidator`](crate::domain::validation::ViewValidator) and are
//! reported together. A validated [`ViewDefinition`] is what gets stored.

use crate::domain::resource_uri::ResourceType;
use crate::domain::rule::{Rule, RuleSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Document `kind` of a view.
pub const VIEW_KIND: &str = "View";

/// Document `version` accepted by default.
pub const SUPPORTED_VIEW_VERSION: &str = "v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewId(pub Uuid);

impl ViewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ViewId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogId(pub Uuid);

impl CatalogId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CatalogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CatalogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wire form of a view policy document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewDocument {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub metadata: ViewMetadata,

    #[serde(default)]
    pub spec: ViewSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewMetadata {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub catalog: String,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewSpec {
    #[serde(default)]
    pub rules: Vec<RuleDocument>,
}

/// Unvalidated rule as written by the author. Values stay raw strings so that
/// every bad token can be reported with its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDocument {
    #[serde(rename = "Intent", alias = "intent", default)]
    pub intent: String,

    #[serde(
        rename = "Operation",
        alias = "operation",
        alias = "operations",
        alias = "actions",
        default
    )]
    pub operations: Vec<String>,

    #[serde(rename = "Target", alias = "target", alias = "targets", default)]
    pub targets: Vec<String>,
}

impl From<&Rule> for RuleDocument {
    fn from(rule: &Rule) -> Self {
        Self {
            intent: rule.intent.to_string(),
            operations: rule.operations.iter().map(|op| op.to_string()).collect(),
            targets: rule.targets.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// A validated view: identity within its catalog plus its rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDefinition {
    pub name: String,
    pub catalog: String,
    #[serde(default)]
    pub description: String,
    pub rules: RuleSet,
}

impl ViewDefinition {
    /// Render back to the wire document.
    pub fn to_document(&self) -> ViewDocument {
        ViewDocument {
            version: SUPPORTED_VIEW_VERSION.to_string(),
            kind: VIEW_KIND.to_string(),
            metadata: ViewMetadata {
                name: self.name.clone(),
                catalog: self.catalog.clone(),
                description: self.description.clone(),
            },
            spec: ViewSpec {
                rules: self.rules.iter().map(RuleDocument::from).collect(),
            },
        }
    }

    /// Same definition with operations and targets deduplicated.
    pub fn deduplicated(mut self) -> Self {
        self.rules = self.rules.deduplicate();
        self
    }
}

/// Stored view aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    pub id: ViewId,
    pub catalog_id: CatalogId,
    pub definition: ViewDefinition,
    /// Incremented every time the rule set is replaced.
    pub generation: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl View {
    pub fn new(catalog_id: CatalogId, definition: ViewDefinition) -> Self {
        let now = Utc::now();
        Self {
            id: ViewId::new(),
            catalog_id,
            definition,
            generation: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn rule_set(&self) -> &RuleSet {
        &self.definition.rules
    }

    /// Replace the whole definition, bumping the generation.
    pub fn replace_definition(&mut self, definition: ViewDefinition) {
        self.definition = definition;
        self.generation += 1;
        self.updated_at = Utc::now();
    }

    /// `res://catalog/<catalog>/views/<name>`
    pub fn resource_uri(&self) -> String {
        view_resource_uri(&self.definition.catalog, &self.definition.name)
    }
}

pub fn view_resource_uri(catalog: &str, view: &str) -> String {
    format!(
        "res://{}/{}/views/{}",
        ResourceType::Catalog.as_str(),
        catalog,
        view
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivedViewError {
    #[error("derived view catalog '{child}' differs from parent catalog '{parent}'")]
    CatalogMismatch { parent: String, child: String },

    #[error("derived view '{0}' grants permissions its parent does not hold")]
    Escalation(String),
}

/// Check that `child` stays within `parent`: same catalog, and every
/// permission it allows is already allowed by the parent.
pub fn validate_derived_view(
    parent: &ViewDefinition,
    child: &ViewDefinition,
) -> Result<(), DerivedViewError> {
    if parent.catalog != child.catalog {
        return Err(DerivedViewError::CatalogMismatch {
            parent: parent.catalog.clone(),
            child: child.catalog.clone(),
        });
    }
    if !child.rules.is_subset_of(&parent.rules) {
        return Err(DerivedViewError::Escalation(child.name.clone()));
    }
    Ok(())
}
