// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Resource Addressing
//!
//! Canonical hierarchical addresses for catalog resources and the segment-wise
//! matching primitive shared by rule authors and the evaluator.
//!
//! ## Grammar
//!
//! ```text
//! res://catalog/<name>[/variant/<name>[/namespace/<name>[/workspace/<name>]]][/<collection>/<path>...][/*]
//! ```
//!
//! | Collection keyword | Owning resource type |
//! |--------------------|----------------------|
//! | `collectionschemas` | `schema` |
//! | `parameterschemas` | `schema` |
//! | `collections` | `collection` |
//! | `views` | `catalog` |
//!
//! `*` may only appear as the final segment of a pattern. In a name position it
//! matches any single name; as a trailing segment it matches the path and
//! everything nested under it.
//!
//! Validation ([`ResourceUri::parse`]) is strict. Matching ([`matches`],
//! [`covers`]) is purely structural and never fails: anything it cannot read
//! is a non-match.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Scheme prefix of every resource URI.
pub const RESOURCE_URI_SCHEME: &str = "res://";

/// Wildcard segment.
pub const WILDCARD: &str = "*";

/// Maximum length of a resource name (DNS label).
pub const DEFAULT_MAX_NAME_LENGTH: usize = 63;

/// Resource types that own operations in the action taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Catalog,
    Variant,
    Namespace,
    Workspace,
    Schema,
    Collection,
}

impl ResourceType {
    /// Hierarchy levels in their fixed address order.
    pub const HIERARCHY: [ResourceType; 4] = [
        ResourceType::Catalog,
        ResourceType::Variant,
        ResourceType::Namespace,
        ResourceType::Workspace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Variant => "variant",
            Self::Namespace => "namespace",
            Self::Workspace => "workspace",
            Self::Schema => "schema",
            Self::Collection => "collection",
        }
    }

    /// Position of this type in the address hierarchy, `None` for types that
    /// live in a resource collection (schemas, collections).
    pub fn hierarchy_depth(&self) -> Option<usize> {
        Self::HIERARCHY.iter().position(|t| t == self)
    }

    /// Parse a hierarchy key segment (`catalog`, `variant`, ...).
    pub fn from_hierarchy_key(key: &str) -> Option<Self> {
        Self::HIERARCHY.into_iter().find(|t| t.as_str() == key)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource collections that may follow the hierarchy part of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceCollection {
    CollectionSchemas,
    ParameterSchemas,
    Collections,
    Views,
}

impl ResourceCollection {
    pub const ALL: [ResourceCollection; 4] = [
        ResourceCollection::CollectionSchemas,
        ResourceCollection::ParameterSchemas,
        ResourceCollection::Collections,
        ResourceCollection::Views,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::CollectionSchemas => "collectionschemas",
            Self::ParameterSchemas => "parameterschemas",
            Self::Collections => "collections",
            Self::Views => "views",
        }
    }

    /// Resource type whose admin operation governs this collection.
    pub fn owner(&self) -> ResourceType {
        match self {
            Self::CollectionSchemas | Self::ParameterSchemas => ResourceType::Schema,
            Self::Collections => ResourceType::Collection,
            Self::Views => ResourceType::Catalog,
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.keyword() == keyword)
    }
}

/// Resource URI syntax errors, reported at authoring time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceUriError {
    #[error("missing '{RESOURCE_URI_SCHEME}' prefix")]
    MissingScheme,

    #[error("empty resource path")]
    Empty,

    #[error("empty path segment")]
    EmptySegment,

    #[error("resource path must start with a catalog")]
    MissingCatalog,

    #[error("'{key}' is out of order: expected at hierarchy position {expected}")]
    OutOfOrder { key: String, expected: usize },

    #[error("missing name for '{0}'")]
    MissingName(String),

    #[error("invalid name '{0}': must be lower-case alphanumeric with hyphens")]
    InvalidName(String),

    #[error("name '{name}' exceeds {max} characters")]
    NameTooLong { name: String, max: usize },

    #[error("wildcard is only allowed as the last segment")]
    NonTerminalWildcard,

    #[error("missing resource path after '{0}'")]
    MissingResourcePath(String),

    #[error("unknown segment '{0}'")]
    UnknownSegment(String),
}

/// The resource collection part of an address, e.g. `collections/folder/item`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTail {
    pub collection: ResourceCollection,
    pub path: Vec<String>,
}

/// A parsed, validated resource URI or URI pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUri {
    raw: String,
    hierarchy: Vec<(ResourceType, String)>,
    tail: Option<ResourceTail>,
    trailing_wildcard: bool,
}

impl ResourceUri {
    /// Parse with the default name length limit.
    pub fn parse(uri: &str) -> Result<Self, ResourceUriError> {
        Self::parse_with_limit(uri, DEFAULT_MAX_NAME_LENGTH)
    }

    pub fn parse_with_limit(uri: &str, max_name_length: usize) -> Result<Self, ResourceUriError> {
        let rest = uri
            .strip_prefix(RESOURCE_URI_SCHEME)
            .ok_or(ResourceUriError::MissingScheme)?;
        if rest.is_empty() {
            return Err(ResourceUriError::Empty);
        }
        let segments: Vec<&str> = rest.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ResourceUriError::EmptySegment);
        }

        let last = segments.len() - 1;
        let mut hierarchy: Vec<(ResourceType, String)> = Vec::new();
        let mut tail = None;
        let mut trailing_wildcard = false;
        let mut idx = 0;

        while idx < segments.len() {
            let segment = segments[idx];

            if segment == WILDCARD {
                if hierarchy.is_empty() {
                    return Err(ResourceUriError::MissingCatalog);
                }
                if idx != last {
                    return Err(ResourceUriError::NonTerminalWildcard);
                }
                trailing_wildcard = true;
                break;
            }

            if let Some(resource_type) = ResourceType::from_hierarchy_key(segment) {
                let expected = resource_type.hierarchy_depth().unwrap_or_default();
                if hierarchy.len() != expected {
                    if hierarchy.is_empty() {
                        return Err(ResourceUriError::MissingCatalog);
                    }
                    return Err(ResourceUriError::OutOfOrder {
                        key: segment.to_string(),
                        expected,
                    });
                }
                let name = segments
                    .get(idx + 1)
                    .ok_or_else(|| ResourceUriError::MissingName(segment.to_string()))?;
                if *name == WILDCARD {
                    if idx + 1 != last {
                        return Err(ResourceUriError::NonTerminalWildcard);
                    }
                } else {
                    validate_resource_name(name, max_name_length)?;
                }
                hierarchy.push((resource_type, name.to_string()));
                idx += 2;
                continue;
            }

            if let Some(collection) = ResourceCollection::from_keyword(segment) {
                if hierarchy.is_empty() {
                    return Err(ResourceUriError::MissingCatalog);
                }
                let path = &segments[idx + 1..];
                if path.is_empty() {
                    return Err(ResourceUriError::MissingResourcePath(segment.to_string()));
                }
                for (i, part) in path.iter().enumerate() {
                    if *part == WILDCARD {
                        if i != path.len() - 1 {
                            return Err(ResourceUriError::NonTerminalWildcard);
                        }
                    } else {
                        validate_resource_name(part, max_name_length)?;
                    }
                }
                tail = Some(ResourceTail {
                    collection,
                    path: path.iter().map(|p| p.to_string()).collect(),
                });
                break;
            }

            if hierarchy.is_empty() {
                return Err(ResourceUriError::MissingCatalog);
            }
            return Err(ResourceUriError::UnknownSegment(segment.to_string()));
        }

        Ok(Self {
            raw: uri.to_string(),
            hierarchy,
            tail,
            trailing_wildcard,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn hierarchy(&self) -> &[(ResourceType, String)] {
        &self.hierarchy
    }

    pub fn tail(&self) -> Option<&ResourceTail> {
        self.tail.as_ref()
    }

    /// Name bound to a hierarchy level, if present.
    pub fn name_of(&self, resource_type: ResourceType) -> Option<&str> {
        self.hierarchy
            .iter()
            .find(|(t, _)| *t == resource_type)
            .map(|(_, name)| name.as_str())
    }

    pub fn is_pattern(&self) -> bool {
        self.trailing_wildcard
            || self.hierarchy.iter().any(|(_, name)| name == WILDCARD)
            || self
                .tail
                .as_ref()
                .is_some_and(|t| t.path.iter().any(|p| p == WILDCARD))
    }

    /// The resource type this address is anchored at: the owner of its
    /// resource collection if it has one, otherwise its deepest hierarchy level.
    pub fn anchor(&self) -> Option<ResourceType> {
        match &self.tail {
            Some(tail) => Some(tail.collection.owner()),
            None => self.hierarchy.last().map(|(t, _)| *t),
        }
    }
}

impl FromStr for ResourceUri {
    type Err = ResourceUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A rule target: a resource URI pattern as written in a policy document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetResource(String);

impl TargetResource {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this pattern matches `candidate` (see [`matches`]).
    pub fn matches(&self, candidate: &str) -> bool {
        matches(&self.0, candidate)
    }

    /// Whether `candidate` lies at or below this pattern (see [`covers`]).
    pub fn covers(&self, candidate: &str) -> bool {
        covers(&self.0, candidate)
    }
}

impl fmt::Display for TargetResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetResource {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TargetResource {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Check that a name follows DNS label rules: `^[a-z0-9]([-a-z0-9]*[a-z0-9])?$`.
pub fn validate_resource_name(name: &str, max_length: usize) -> Result<(), ResourceUriError> {
    if name.len() > max_length {
        return Err(ResourceUriError::NameTooLong {
            name: name.to_string(),
            max: max_length,
        });
    }
    if name.is_empty()
        || name.starts_with('-')
        || name.ends_with('-')
        || !name
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
    {
        return Err(ResourceUriError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn segments(uri: &str) -> Option<Vec<&str>> {
    let rest = uri.strip_prefix(RESOURCE_URI_SCHEME)?;
    if rest.is_empty() {
        return None;
    }
    let segments: Vec<&str> = rest.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segments)
}

/// Segment-wise pattern match.
///
/// Literal segments must be equal. A terminal `*` in a name position
/// (`res://catalog/*`, `.../collections/*`) matches the candidate's segment
/// at that position and everything after it. A terminal `*` that follows a
/// complete path (`res://catalog/a/*`, `.../collections/folder/*`) matches
/// that path itself and everything nested under it. Without a trailing
/// wildcard the segment counts must be equal. A non-terminal `*` never
/// matches.
pub fn matches(pattern: &str, candidate: &str) -> bool {
    compare(pattern, candidate, false)
}

/// Like [`matches`], but also accepts candidates nested below a literal
/// pattern: `res://catalog/a` covers `res://catalog/a/variant/b`.
pub fn covers(pattern: &str, candidate: &str) -> bool {
    compare(pattern, candidate, true)
}

fn compare(pattern: &str, candidate: &str, allow_nested: bool) -> bool {
    let (Some(pattern), Some(candidate)) = (segments(pattern), segments(candidate)) else {
        return false;
    };

    let last = pattern.len() - 1;
    for (i, segment) in pattern.iter().enumerate() {
        if *segment == WILDCARD {
            if i != last {
                return false;
            }
            if in_name_position(&pattern[..i]) {
                return candidate.len() > i;
            }
            return candidate.len() >= i;
        }
        if candidate.get(i) != Some(segment) {
            return false;
        }
    }

    if allow_nested {
        candidate.len() >= pattern.len()
    } else {
        candidate.len() == pattern.len()
    }
}

/// Whether the segment following `prefix` is expected to be a name: the
/// value of a hierarchy pair, or the first path segment after a collection
/// keyword.
fn in_name_position(prefix: &[&str]) -> bool {
    let mut expects_name = false;
    let mut in_tail = false;
    for segment in prefix {
        if in_tail || expects_name {
            expects_name = false;
            continue;
        }
        expects_name = true;
        in_tail = ResourceCollection::from_keyword(segment).is_some();
    }
    expects_name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_uris() {
        let valid = [
            "res://catalog/my-catalog",
            "res://catalog/my-catalog/variant/my-variant",
            "res://catalog/my-catalog/variant/my-variant/namespace/my-namespace",
            "res://catalog/my-catalog/variant/my-variant/namespace/my-namespace/workspace/ws1",
            "res://catalog/my-catalog/variant/my-variant/collectionschemas/path",
            "res://catalog/c/variant/v/namespace/n/collections/path/to/res-ource",
            "res://catalog/c/variant/v/collections/path/*",
            "res://catalog/c/variant/v/namespace/n/workspace/w/collections/*",
            "res://catalog/c/variant/v/workspace/*",
            "res://catalog/*",
            "res://catalog/c/*",
            "res://catalog/c/variant/v/namespace/*",
            "res://catalog/c/views/my-view",
        ];
        for uri in valid {
            assert!(ResourceUri::parse(uri).is_ok(), "expected valid: {}", uri);
        }
    }

    #[test]
    fn test_parse_invalid_uris() {
        let invalid = [
            "res://",
            "catalog/my-catalog",
            "res://catalog/test-catalog/varian/test-variant",
            "res://variant/my-variant",
            "res://namespace/my-namespace",
            "res://catalog/c/namespace/n",
            "res://catalog/c/variant/v/workspace/w/namespace/n",
            "res://variant/v/catalog/c",
            "res://catalog/*/variant/my-variant",
            "res://catalog/c/variant/v/collections/*/path",
            "res://catalog/c/variant/v/collections",
            "res://catalog/c/variant/v/workspace/my*",
            "res://catalog/c/variant/v/collections/path/",
            "res://catalog/c//variant/v",
            "res://catalog/my@catalog",
            "res://catalog/my catalog",
            "res://catalog/my_catalog",
            "res://catalog/My-Catalog",
            "res://catalog/-leading",
            "res://invalid-uri",
            "res://catalog/c/catalog/d",
        ];
        for uri in invalid {
            assert!(ResourceUri::parse(uri).is_err(), "expected invalid: {}", uri);
        }
    }

    #[test]
    fn test_parse_reports_specific_errors() {
        assert_eq!(
            ResourceUri::parse("catalog/a").unwrap_err(),
            ResourceUriError::MissingScheme
        );
        assert_eq!(
            ResourceUri::parse("res://catalog/*/variant/v").unwrap_err(),
            ResourceUriError::NonTerminalWildcard
        );
        assert_eq!(
            ResourceUri::parse("res://catalog/c/namespace/n").unwrap_err(),
            ResourceUriError::OutOfOrder { key: "namespace".to_string(), expected: 2 }
        );
        assert!(matches!(
            ResourceUri::parse(&format!("res://catalog/{}", "a".repeat(64))).unwrap_err(),
            ResourceUriError::NameTooLong { .. }
        ));
    }

    #[test]
    fn test_anchor() {
        let anchor = |s: &str| ResourceUri::parse(s).unwrap().anchor();
        assert_eq!(anchor("res://catalog/*"), Some(ResourceType::Catalog));
        assert_eq!(anchor("res://catalog/a/*"), Some(ResourceType::Catalog));
        assert_eq!(anchor("res://catalog/a/variant/b"), Some(ResourceType::Variant));
        assert_eq!(
            anchor("res://catalog/a/variant/b/namespace/c/workspace/*"),
            Some(ResourceType::Workspace)
        );
        assert_eq!(
            anchor("res://catalog/a/variant/b/collectionschemas/*"),
            Some(ResourceType::Schema)
        );
        assert_eq!(
            anchor("res://catalog/a/variant/b/collections/f/x"),
            Some(ResourceType::Collection)
        );
    }

    #[test]
    fn test_wildcard_terminality() {
        let pattern = "res://catalog/a/variant/*";
        assert!(matches(pattern, "res://catalog/a/variant/b"));
        assert!(matches(pattern, "res://catalog/a/variant/b/namespace/c"));
        assert!(!matches(pattern, "res://catalog/a/variant"));
        assert!(!matches(pattern, "res://catalog/x/variant/b"));
        assert!(!matches("res://catalog/a/variant/y", "res://catalog/a/variant/x"));
    }

    #[test]
    fn test_exact_and_length_rules() {
        assert!(matches("res://catalog/test", "res://catalog/test"));
        assert!(!matches("res://catalog/test", "res://catalog/test/variant/v"));
        assert!(!matches("res://catalog/test/variant/v", "res://catalog/test"));
        assert!(matches("res://catalog/test/*", "res://catalog/test/specific"));
    }

    #[test]
    fn test_malformed_never_matches() {
        assert!(!matches("catalog/test", "res://catalog/test"));
        assert!(!matches("res://catalog/test", "/catalog/test"));
        assert!(!matches("res://catalog/*/variant/v", "res://catalog/a/variant/v"));
        assert!(!matches("res://catalog//x", "res://catalog//x"));
        assert!(!matches("res://", "res://"));
    }

    #[test]
    fn test_wildcard_after_complete_path_includes_the_path() {
        assert!(matches("res://catalog/a/*", "res://catalog/a"));
        assert!(matches("res://catalog/a/*", "res://catalog/a/variant/v"));
        assert!(!matches("res://catalog/a/*", "res://catalog/b"));
        assert!(matches(
            "res://catalog/c/collections/folder/*",
            "res://catalog/c/collections/folder"
        ));
        assert!(covers("res://catalog/a/*", "res://catalog/a"));

        // name positions still need a name
        assert!(!matches("res://catalog/*", "res://catalog"));
        assert!(!matches("res://catalog/a/variant/*", "res://catalog/a/variant"));
        assert!(!matches("res://catalog/c/collections/*", "res://catalog/c/collections"));
        assert!(!covers("res://catalog/a/variant/*", "res://catalog/a/variant"));
    }

    #[test]
    fn test_covers_nested() {
        assert!(covers("res://catalog/a", "res://catalog/a"));
        assert!(covers("res://catalog/a", "res://catalog/a/variant/b"));
        assert!(!covers("res://catalog/a/variant/b", "res://catalog/a"));
        assert!(covers("res://catalog/*", "res://catalog/z/variant/b"));
    }

    #[test]
    fn test_wildcard_candidate_only_matched_by_broader_pattern() {
        assert!(matches("res://catalog/a/*", "res://catalog/a/variant/*"));
        assert!(!matches("res://catalog/a/variant/b", "res://catalog/a/variant/*"));
    }
}
