// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Rule & Rule Set Model
//!
//! A [`Rule`] binds an [`Intent`] to a set of operations and a set of target
//! patterns. A [`RuleSet`] keeps rules in declaration order for storage and
//! audit; order never changes the decision since deny always wins.

use crate::domain::operation::Operation;
use crate::domain::resource_uri::TargetResource;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    Allow,
    Deny,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Allow" => Some(Self::Allow),
            "Deny" => Some(Self::Deny),
            _ => None,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "Intent", alias = "intent")]
    pub intent: Intent,

    #[serde(rename = "Operation", alias = "operation", alias = "operations", alias = "actions")]
    pub operations: Vec<Operation>,

    #[serde(rename = "Target", alias = "target", alias = "targets")]
    pub targets: Vec<TargetResource>,
}

impl Rule {
    pub fn new(
        intent: Intent,
        operations: impl IntoIterator<Item = Operation>,
        targets: impl IntoIterator<Item = impl Into<TargetResource>>,
    ) -> Self {
        Self {
            intent,
            operations: operations.into_iter().collect(),
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allow(
        operations: impl IntoIterator<Item = Operation>,
        targets: impl IntoIterator<Item = impl Into<TargetResource>>,
    ) -> Self {
        Self::new(Intent::Allow, operations, targets)
    }

    pub fn deny(
        operations: impl IntoIterator<Item = Operation>,
        targets: impl IntoIterator<Item = impl Into<TargetResource>>,
    ) -> Self {
        Self::new(Intent::Deny, operations, targets)
    }

    pub fn has_operation(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }

    /// Whether any target pattern matches `resource`.
    pub fn matches_resource(&self, resource: &str) -> bool {
        self.targets.iter().any(|t| t.matches(resource))
    }

    /// Copy of this rule with repeated operations and targets removed.
    pub fn deduplicated(&self) -> Self {
        Self {
            intent: self.intent,
            operations: unique_in_order(&self.operations),
            targets: unique_in_order(&self.targets),
        }
    }
}

fn unique_in_order<T: Clone + Eq + Hash>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

/// Ordered sequence of rules attached to a view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(Vec<Rule>);

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self(rules)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.0
    }

    /// Reduce every rule's operations and targets to distinct values, keeping
    /// first-seen order. Rule order and count are preserved.
    pub fn deduplicate(&self) -> RuleSet {
        RuleSet(self.0.iter().map(Rule::deduplicated).collect())
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self(rules)
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
