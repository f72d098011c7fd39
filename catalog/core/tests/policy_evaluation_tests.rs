// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use catalog_policy_core::operation::Operation;
use catalog_policy_core::rule::{Rule, RuleSet};
use catalog_policy_core::view::{validate_derived_view, DerivedViewError, ViewDefinition};

struct Case {
    name: &'static str,
    rules: Vec<Rule>,
    operation: Operation,
    resource: &'static str,
    expected: bool,
}

fn cases() -> Vec<Case> {
    vec![
        Case {
            name: "admin action",
            rules: vec![Rule::allow([Operation::CatalogAdmin], ["res://catalog/*"])],
            operation: Operation::CatalogList,
            resource: "res://catalog/test2",
            expected: true,
        },
        Case {
            name: "admin action with specific resource",
            rules: vec![Rule::allow([Operation::CatalogAdmin], ["res://catalog/test1"])],
            operation: Operation::CatalogList,
            resource: "res://catalog/test2",
            expected: false,
        },
        Case {
            name: "admin target anchored below the operation type",
            rules: vec![Rule::allow(
                [Operation::CatalogAdmin],
                ["res://catalog/test1/variant/test2"],
            )],
            operation: Operation::CatalogList,
            resource: "res://catalog/test1",
            expected: false,
        },
        Case {
            name: "second admin target grants",
            rules: vec![Rule::allow(
                [Operation::CatalogAdmin],
                ["res://catalog/test1/variant/test2", "res://catalog/*"],
            )],
            operation: Operation::CatalogList,
            resource: "res://catalog/test1",
            expected: true,
        },
        Case {
            name: "namespace admin",
            rules: vec![Rule::allow(
                [Operation::NamespaceAdmin],
                ["res://catalog/test1/variant/test2/namespace/*"],
            )],
            operation: Operation::NamespaceList,
            resource: "res://catalog/test1/variant/test2/namespace/test3",
            expected: true,
        },
        Case {
            name: "namespace admin with deny rule",
            rules: vec![
                Rule::allow(
                    [Operation::NamespaceAdmin],
                    ["res://catalog/test1/variant/test2/namespace/*"],
                ),
                Rule::deny(
                    [Operation::NamespaceList],
                    ["res://catalog/test1/variant/test2/namespace/test3"],
                ),
            ],
            operation: Operation::NamespaceList,
            resource: "res://catalog/test1/variant/test2/namespace/test3",
            expected: false,
        },
        Case {
            name: "workspace admin never grants namespace operations",
            rules: vec![Rule::allow(
                [Operation::WorkspaceAdmin],
                ["res://catalog/t1/variant/t2/namespace/t3/workspace/*"],
            )],
            operation: Operation::NamespaceList,
            resource: "res://catalog/t1/variant/t2/namespace/t3/workspace/t4",
            expected: false,
        },
        Case {
            name: "simple allow rule",
            rules: vec![Rule::allow([Operation::CatalogList], ["res://catalog/test"])],
            operation: Operation::CatalogList,
            resource: "res://catalog/test",
            expected: true,
        },
        Case {
            name: "simple deny rule",
            rules: vec![Rule::deny([Operation::CatalogList], ["res://catalog/test"])],
            operation: Operation::CatalogList,
            resource: "res://catalog/test",
            expected: false,
        },
        Case {
            name: "deny overrides allow",
            rules: vec![
                Rule::allow([Operation::CatalogList], ["res://catalog/test"]),
                Rule::deny([Operation::CatalogList], ["res://catalog/test"]),
            ],
            operation: Operation::CatalogList,
            resource: "res://catalog/test",
            expected: false,
        },
        Case {
            name: "deny before allow still wins",
            rules: vec![
                Rule::deny([Operation::CatalogList], ["res://catalog/test"]),
                Rule::allow([Operation::CatalogList], ["res://catalog/test"]),
            ],
            operation: Operation::CatalogList,
            resource: "res://catalog/test",
            expected: false,
        },
        Case {
            name: "wildcard resource matching",
            rules: vec![Rule::allow(
                [Operation::CatalogList],
                ["res://catalog/test/variant/*"],
            )],
            operation: Operation::CatalogList,
            resource: "res://catalog/test/variant/variant1",
            expected: true,
        },
        Case {
            name: "multiple actions in rule",
            rules: vec![Rule::allow(
                [Operation::CatalogList, Operation::VariantList],
                ["res://catalog/test"],
            )],
            operation: Operation::VariantList,
            resource: "res://catalog/test",
            expected: true,
        },
        Case {
            name: "action not in rule",
            rules: vec![Rule::allow([Operation::CatalogList], ["res://catalog/test"])],
            operation: Operation::VariantList,
            resource: "res://catalog/test",
            expected: false,
        },
        Case {
            name: "resource not in rule",
            rules: vec![Rule::allow([Operation::CatalogList], ["res://catalog/test"])],
            operation: Operation::CatalogList,
            resource: "res://catalog/other",
            expected: false,
        },
        Case {
            name: "multiple rules with different resources",
            rules: vec![
                Rule::allow([Operation::CatalogList], ["res://catalog/test1"]),
                Rule::allow([Operation::CatalogList], ["res://catalog/test2"]),
            ],
            operation: Operation::CatalogList,
            resource: "res://catalog/test2",
            expected: true,
        },
        Case {
            name: "wildcard resource with deny rule",
            rules: vec![
                Rule::allow([Operation::CatalogList], ["res://catalog/test/*"]),
                Rule::deny([Operation::CatalogList], ["res://catalog/test/specific"]),
            ],
            operation: Operation::CatalogList,
            resource: "res://catalog/test/specific",
            expected: false,
        },
        Case {
            name: "empty rule set",
            rules: vec![],
            operation: Operation::CatalogList,
            resource: "res://catalog/test",
            expected: false,
        },
        Case {
            name: "overlapping targets",
            rules: vec![Rule::allow(
                [Operation::CatalogList],
                ["res://catalog/*", "res://catalog/test2"],
            )],
            operation: Operation::CatalogList,
            resource: "res://catalog/test2",
            expected: true,
        },
        Case {
            name: "literal target does not match deeper resource",
            rules: vec![Rule::allow(
                [Operation::CatalogList],
                ["res://catalog/my-catalog/variant/v1/namespace/my-namespace"],
            )],
            operation: Operation::CatalogList,
            resource: "res://catalog/my-catalog/variant/v1/namespace/my-namespace/collections/some-col",
            expected: false,
        },
        Case {
            name: "literal target does not match shallower resource",
            rules: vec![Rule::allow(
                [Operation::CatalogList],
                ["res://catalog/my-catalog/variant/v1/namespace/my-namespace"],
            )],
            operation: Operation::CatalogList,
            resource: "res://catalog/my-catalog/variant/v1",
            expected: false,
        },
        Case {
            name: "terminal wildcard consumes deeper segments",
            rules: vec![Rule::allow(
                [Operation::CatalogList],
                ["res://catalog/my-catalog/variant/*"],
            )],
            operation: Operation::CatalogList,
            resource: "res://catalog/my-catalog/variant/v1/namespace/my-namespace",
            expected: true,
        },
        Case {
            name: "terminal wildcard after a complete path includes the path",
            rules: vec![Rule::allow([Operation::CatalogList], ["res://catalog/test/*"])],
            operation: Operation::CatalogList,
            resource: "res://catalog/test",
            expected: true,
        },
        Case {
            name: "terminal wildcard in a name position needs a name",
            rules: vec![Rule::allow(
                [Operation::VariantList],
                ["res://catalog/test/variant/*"],
            )],
            operation: Operation::VariantList,
            resource: "res://catalog/test/variant",
            expected: false,
        },
        Case {
            name: "admin wildcard after a complete path covers the path",
            rules: vec![Rule::allow([Operation::CatalogAdmin], ["res://catalog/a/*"])],
            operation: Operation::CatalogList,
            resource: "res://catalog/a",
            expected: true,
        },
        Case {
            name: "non-terminal wildcard never matches",
            rules: vec![Rule::allow(
                [Operation::CatalogList],
                ["res://catalog/my-catalog/variant/*/namespace/my-namespace"],
            )],
            operation: Operation::CatalogList,
            resource: "res://catalog/my-catalog/variant/v1/namespace/my-namespace",
            expected: false,
        },
        Case {
            name: "namespace admin does not grant catalog operations",
            rules: vec![Rule::allow(
                [Operation::NamespaceAdmin],
                ["res://catalog/my-catalog/variant/v1/namespace/*"],
            )],
            operation: Operation::CatalogList,
            resource: "res://catalog/my-catalog/variant/v1/namespace/my-namespace",
            expected: false,
        },
        Case {
            name: "schema admin covers collection schemas",
            rules: vec![Rule::allow(
                [Operation::SchemaAdmin],
                ["res://catalog/c/variant/v/collectionschemas/*"],
            )],
            operation: Operation::SchemaEdit,
            resource: "res://catalog/c/variant/v/collectionschemas/orders",
            expected: true,
        },
        Case {
            name: "schema admin does not grant collection operations",
            rules: vec![Rule::allow(
                [Operation::SchemaAdmin],
                ["res://catalog/c/variant/v/collectionschemas/*"],
            )],
            operation: Operation::CollectionRead,
            resource: "res://catalog/c/variant/v/collectionschemas/orders",
            expected: false,
        },
        Case {
            name: "collection admin covers nested collection paths",
            rules: vec![Rule::allow(
                [Operation::CollectionAdmin],
                ["res://catalog/c/variant/v/namespace/n/collections/sales"],
            )],
            operation: Operation::CollectionWrite,
            resource: "res://catalog/c/variant/v/namespace/n/collections/sales/q1",
            expected: true,
        },
        Case {
            name: "catalog admin governs view adoption",
            rules: vec![Rule::allow([Operation::CatalogAdmin], ["res://catalog/c"])],
            operation: Operation::CatalogAdoptView,
            resource: "res://catalog/c/views/readers",
            expected: true,
        },
        Case {
            name: "deny on admin operation does not revoke other operations",
            rules: vec![
                Rule::deny([Operation::CatalogAdmin], ["res://catalog/*"]),
                Rule::allow([Operation::CatalogList], ["res://catalog/test"]),
            ],
            operation: Operation::CatalogList,
            resource: "res://catalog/test",
            expected: true,
        },
        Case {
            name: "deny on admin operation blocks the admin operation",
            rules: vec![
                Rule::allow([Operation::CatalogAdmin], ["res://catalog/*"]),
                Rule::deny([Operation::CatalogAdmin], ["res://catalog/*"]),
            ],
            operation: Operation::CatalogAdmin,
            resource: "res://catalog/test",
            expected: false,
        },
        Case {
            name: "malformed resource is denied",
            rules: vec![Rule::allow([Operation::CatalogAdmin], ["res://catalog/*"])],
            operation: Operation::CatalogList,
            resource: "catalog/test",
            expected: false,
        },
    ]
}

#[test]
fn test_is_action_allowed_table() {
    for case in cases() {
        let rules = RuleSet::new(case.rules);
        assert_eq!(
            rules.is_action_allowed(case.operation, case.resource),
            case.expected,
            "case '{}'",
            case.name
        );
    }
}

#[test]
fn test_rule_order_does_not_change_outcome() {
    for case in cases() {
        let mut reversed = case.rules.clone();
        reversed.reverse();
        let forward = RuleSet::new(case.rules);
        let backward = RuleSet::new(reversed);
        assert_eq!(
            forward.is_action_allowed(case.operation, case.resource),
            backward.is_action_allowed(case.operation, case.resource),
            "case '{}'",
            case.name
        );
    }
}

#[test]
fn test_deduplication_does_not_change_outcome() {
    for case in cases() {
        let mut doubled = case.rules.clone();
        doubled.extend(case.rules.iter().cloned());
        let rules = RuleSet::new(doubled).deduplicate();
        assert_eq!(
            rules.is_action_allowed(case.operation, case.resource),
            case.expected,
            "case '{}'",
            case.name
        );
    }
}

#[test]
fn test_decision_reports_contributing_rules() {
    let rules = RuleSet::new(vec![
        Rule::allow([Operation::CatalogList], ["res://catalog/test/*"]),
        Rule::allow([Operation::CatalogAdmin], ["res://catalog/*"]),
        Rule::deny([Operation::CatalogList], ["res://catalog/test/specific"]),
    ]);

    let decision = rules.evaluate(Operation::CatalogList, "res://catalog/test/other");
    assert!(decision.is_allowed());
    assert_eq!(decision.allowed_by, vec![0, 1]);

    let decision = rules.evaluate(Operation::CatalogList, "res://catalog/test/specific");
    assert!(!decision.is_allowed());
    assert!(decision.is_explicitly_denied());
    assert_eq!(decision.denied_by, vec![2]);
}

fn definition(name: &str, rules: Vec<Rule>) -> ViewDefinition {
    ViewDefinition {
        name: name.to_string(),
        catalog: "sales".to_string(),
        description: String::new(),
        rules: RuleSet::new(rules),
    }
}

#[test]
fn test_derived_view_within_parent() {
    let parent = definition(
        "parent",
        vec![Rule::allow([Operation::NamespaceAdmin], ["res://catalog/sales/variant/prod/namespace/*"])],
    );
    let child = definition(
        "child",
        vec![Rule::allow(
            [Operation::NamespaceList],
            ["res://catalog/sales/variant/prod/namespace/team-a"],
        )],
    );
    assert!(validate_derived_view(&parent, &child).is_ok());
}

#[test]
fn test_derived_view_escalation_rejected() {
    let parent = definition(
        "parent",
        vec![Rule::allow([Operation::NamespaceList], ["res://catalog/sales/variant/prod/namespace/*"])],
    );
    let child = definition(
        "child",
        vec![Rule::allow([Operation::NamespaceAdmin], ["res://catalog/sales/variant/prod/namespace/*"])],
    );
    assert_eq!(
        validate_derived_view(&parent, &child),
        Err(DerivedViewError::Escalation("child".to_string()))
    );
}

#[test]
fn test_derived_view_cannot_lift_parent_deny() {
    let parent = definition(
        "parent",
        vec![
            Rule::allow([Operation::CatalogList], ["res://catalog/sales/*"]),
            Rule::deny([Operation::CatalogList], ["res://catalog/sales/variant/secret"]),
        ],
    );
    let child = definition(
        "child",
        vec![Rule::allow([Operation::CatalogList], ["res://catalog/sales/variant/*"])],
    );
    assert!(validate_derived_view(&parent, &child).is_err());
}
