// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Policy Evaluation
//!
//! Two-phase decision fold over a [`RuleSet`]:
//!
//! 1. **Admin phase.** An `Allow` rule listing the admin operation of the
//!    requested operation's resource type grants the request when one of its
//!    targets is anchored at that type and covers the resource.
//! 2. **Exact phase.** Every rule listing the requested operation literally,
//!    with a target matching the resource, votes: `Allow` grants, `Deny`
//!    revokes. Any matching deny wins regardless of declaration order.
//!
//! Evaluation is pure and never fails. Malformed resources or patterns are
//! non-matches, so bad input is denied rather than rejected.

use crate::domain::operation::Operation;
use crate::domain::resource_uri::{covers, matches, ResourceType, ResourceUri, TargetResource};
use crate::domain::rule::{Intent, RuleSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The sole negative outcome of authorization. Carries an optional short
/// reason for audit logs and never the rule internals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("policy denied{}", reason_suffix(.reason))]
pub struct PolicyDenied {
    pub reason: Option<String>,
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|reason| format!(": {}", reason))
        .unwrap_or_default()
}

impl PolicyDenied {
    pub fn new() -> Self {
        Self { reason: None }
    }

    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

impl Default for PolicyDenied {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of evaluating one (operation, resource) pair, with the indices of
/// the rules that contributed to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    /// Allow rules that granted the request, admin grants included.
    pub allowed_by: Vec<usize>,
    /// Deny rules that matched the request.
    pub denied_by: Vec<usize>,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn is_explicitly_denied(&self) -> bool {
        !self.denied_by.is_empty()
    }
}

/// Whether an admin rule target grants type-wide access to `resource`.
///
/// The target must be anchored at `resource_type` (its deepest hierarchy pair
/// is that type, or its resource collection is owned by it) and must cover
/// the resource as a segment prefix.
pub fn admin_target_covers(
    target: &TargetResource,
    resource_type: ResourceType,
    resource: &str,
) -> bool {
    let Ok(uri) = ResourceUri::parse_with_limit(target.as_str(), usize::MAX) else {
        return false;
    };
    uri.anchor() == Some(resource_type) && covers(target.as_str(), resource)
}

impl RuleSet {
    /// Evaluate `operation` on `resource`.
    pub fn evaluate(&self, operation: Operation, resource: &str) -> Decision {
        let resource_type = operation.resource_type();
        let admin = Operation::admin_for(resource_type);
        let mut decision = Decision::default();

        for (idx, rule) in self.iter().enumerate() {
            if rule.intent != Intent::Allow || !rule.has_operation(admin) {
                continue;
            }
            if rule
                .targets
                .iter()
                .any(|t| admin_target_covers(t, resource_type, resource))
            {
                decision.allowed = true;
                decision.allowed_by.push(idx);
            }
        }

        for (idx, rule) in self.iter().enumerate() {
            if !rule.has_operation(operation) || !rule.matches_resource(resource) {
                continue;
            }
            match rule.intent {
                Intent::Allow => {
                    decision.allowed = true;
                    if !decision.allowed_by.contains(&idx) {
                        decision.allowed_by.push(idx);
                    }
                }
                Intent::Deny => decision.denied_by.push(idx),
            }
        }

        if !decision.denied_by.is_empty() {
            decision.allowed = false;
        }
        decision.allowed_by.sort_unstable();
        decision
    }

    pub fn is_action_allowed(&self, operation: Operation, resource: &str) -> bool {
        self.evaluate(operation, resource).allowed
    }

    /// Whether every permission this rule set allows is also allowed by
    /// `parent`. A parent deny that falls inside one of our allowed targets
    /// for the same operation also breaks containment.
    pub fn is_subset_of(&self, parent: &RuleSet) -> bool {
        self.iter()
            .filter(|rule| rule.intent == Intent::Allow)
            .all(|rule| {
                rule.operations.iter().all(|&op| {
                    rule.targets.iter().all(|target| {
                        parent.is_action_allowed(op, target.as_str())
                            && !parent.denies_within(op, target.as_str())
                    })
                })
            })
    }

    fn denies_within(&self, operation: Operation, pattern: &str) -> bool {
        self.iter()
            .filter(|rule| rule.intent == Intent::Deny && rule.has_operation(operation))
            .any(|rule| rule.targets.iter().any(|t| matches(pattern, t.as_str())))
    }
}
