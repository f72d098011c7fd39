// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! View document validation.
//!
//! [`ViewValidator`] is an explicitly constructed value (usually built from
//! [`ValidationConfig`]); there is no process-wide validator registry. It
//! walks the whole document and collects one [`ValidationError`] per
//! offending field.

use crate::domain::engine_config::ValidationConfig;
use crate::domain::operation::Operation;
use crate::domain::resource_uri::{
    validate_resource_name, ResourceUri, TargetResource, DEFAULT_MAX_NAME_LENGTH,
};
use crate::domain::rule::{Intent, Rule, RuleSet};
use crate::domain::view::{ViewDefinition, ViewDocument, SUPPORTED_VIEW_VERSION, VIEW_KIND};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: missing required attribute")]
    MissingAttribute { field: String },

    #[error("{field}: invalid version '{value}', expected '{expected}'")]
    InvalidVersion {
        field: String,
        value: String,
        expected: String,
    },

    #[error("{field}: unsupported kind '{value}'")]
    UnsupportedKind { field: String, value: String },

    #[error("{field}: invalid name format '{value}': {reason}")]
    InvalidNameFormat {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{field}: invalid intent '{value}', expected Allow or Deny")]
    InvalidIntent { field: String, value: String },

    #[error("{field}: invalid operation '{value}'")]
    InvalidOperation { field: String, value: String },

    #[error("{field}: invalid resource URI '{value}': {reason}")]
    InvalidResourceUri {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{field}: view must contain at least one rule")]
    EmptyRuleSet { field: String },

    #[error("{field}: rule must list at least one operation")]
    EmptyOperations { field: String },

    #[error("{field}: rule must list at least one target")]
    EmptyTargets { field: String },

    #[error("{field}: {reason}")]
    InvalidParentScope { field: String, reason: String },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            Self::MissingAttribute { field }
            | Self::InvalidVersion { field, .. }
            | Self::UnsupportedKind { field, .. }
            | Self::InvalidNameFormat { field, .. }
            | Self::InvalidIntent { field, .. }
            | Self::InvalidOperation { field, .. }
            | Self::InvalidResourceUri { field, .. }
            | Self::EmptyRuleSet { field }
            | Self::EmptyOperations { field }
            | Self::EmptyTargets { field }
            | Self::InvalidParentScope { field, .. } => field,
        }
    }
}

/// All validation failures found in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("validation failed: {}", join_messages(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    messages.join("; ")
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

#[derive(Debug, Clone)]
pub struct ViewValidator {
    supported_version: String,
    max_name_length: usize,
}

impl Default for ViewValidator {
    fn default() -> Self {
        Self {
            supported_version: SUPPORTED_VIEW_VERSION.to_string(),
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }
}

impl ViewValidator {
    pub fn new(supported_version: impl Into<String>, max_name_length: usize) -> Self {
        Self {
            supported_version: supported_version.into(),
            max_name_length,
        }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(config.supported_version.clone(), config.max_name_length)
    }

    pub fn max_name_length(&self) -> usize {
        self.max_name_length
    }

    /// Validate a document and build the definition it describes.
    pub fn validate(&self, doc: &ViewDocument) -> Result<ViewDefinition, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if doc.version.is_empty() {
            errors.push(ValidationError::MissingAttribute {
                field: "version".to_string(),
            });
        } else if doc.version != self.supported_version {
            errors.push(ValidationError::InvalidVersion {
                field: "version".to_string(),
                value: doc.version.clone(),
                expected: self.supported_version.clone(),
            });
        }

        if doc.kind.is_empty() {
            errors.push(ValidationError::MissingAttribute {
                field: "kind".to_string(),
            });
        } else if doc.kind != VIEW_KIND {
            errors.push(ValidationError::UnsupportedKind {
                field: "kind".to_string(),
                value: doc.kind.clone(),
            });
        }

        self.check_name("metadata.name", &doc.metadata.name, &mut errors);
        self.check_name("metadata.catalog", &doc.metadata.catalog, &mut errors);

        if doc.spec.rules.is_empty() {
            errors.push(ValidationError::EmptyRuleSet {
                field: "spec.rules".to_string(),
            });
        }

        let mut rules = Vec::with_capacity(doc.spec.rules.len());
        for (i, rule_doc) in doc.spec.rules.iter().enumerate() {
            let base = format!("spec.rules[{}]", i);

            let intent = if rule_doc.intent.is_empty() {
                errors.push(ValidationError::MissingAttribute {
                    field: format!("{}.Intent", base),
                });
                None
            } else {
                let parsed = Intent::parse(&rule_doc.intent);
                if parsed.is_none() {
                    errors.push(ValidationError::InvalidIntent {
                        field: format!("{}.Intent", base),
                        value: rule_doc.intent.clone(),
                    });
                }
                parsed
            };

            if rule_doc.operations.is_empty() {
                errors.push(ValidationError::EmptyOperations {
                    field: format!("{}.Operation", base),
                });
            }
            let mut operations = Vec::with_capacity(rule_doc.operations.len());
            for (j, token) in rule_doc.operations.iter().enumerate() {
                match token.parse::<Operation>() {
                    Ok(op) => operations.push(op),
                    Err(_) => errors.push(ValidationError::InvalidOperation {
                        field: format!("{}.Operation[{}]", base, j),
                        value: token.clone(),
                    }),
                }
            }

            if rule_doc.targets.is_empty() {
                errors.push(ValidationError::EmptyTargets {
                    field: format!("{}.Target", base),
                });
            }
            let mut targets = Vec::with_capacity(rule_doc.targets.len());
            for (j, target) in rule_doc.targets.iter().enumerate() {
                match self.validate_target(target) {
                    Ok(t) => targets.push(t),
                    Err(reason) => errors.push(ValidationError::InvalidResourceUri {
                        field: format!("{}.Target[{}]", base, j),
                        value: target.clone(),
                        reason,
                    }),
                }
            }

            if let Some(intent) = intent {
                rules.push(Rule {
                    intent,
                    operations,
                    targets,
                });
            }
        }

        errors.into_result(ViewDefinition {
            name: doc.metadata.name.clone(),
            catalog: doc.metadata.catalog.clone(),
            description: doc.metadata.description.clone(),
            rules: RuleSet::new(rules),
        })
    }

    /// Check a single target pattern.
    pub fn validate_target(&self, target: &str) -> Result<TargetResource, String> {
        ResourceUri::parse_with_limit(target, self.max_name_length)
            .map(|_| TargetResource::new(target))
            .map_err(|e| e.to_string())
    }

    fn check_name(&self, field: &str, value: &str, errors: &mut ValidationErrors) {
        if value.is_empty() {
            errors.push(ValidationError::MissingAttribute {
                field: field.to_string(),
            });
        } else if let Err(e) = validate_resource_name(value, self.max_name_length) {
            errors.push(ValidationError::InvalidNameFormat {
                field: field.to_string(),
                value: value.to_string(),
                reason: e.to_string(),
            });
        }
    }
}
