// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Action Taxonomy
//!
//! The closed set of operations a rule can grant or deny. Every operation is
//! owned by exactly one [`ResourceType`], and each type has exactly one
//! `<type>.admin` operation that implies every other operation of that type.

use crate::domain::resource_uri::ResourceType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "catalog.admin")]
    CatalogAdmin,
    #[serde(rename = "catalog.list")]
    CatalogList,
    #[serde(rename = "catalog.adoptView")]
    CatalogAdoptView,

    #[serde(rename = "variant.admin")]
    VariantAdmin,
    #[serde(rename = "variant.list")]
    VariantList,
    #[serde(rename = "variant.clone")]
    VariantClone,
    #[serde(rename = "variant.createView")]
    VariantCreateView,

    #[serde(rename = "namespace.admin")]
    NamespaceAdmin,
    #[serde(rename = "namespace.list")]
    NamespaceList,
    #[serde(rename = "namespace.create")]
    NamespaceCreate,
    #[serde(rename = "namespace.edit")]
    NamespaceEdit,

    #[serde(rename = "workspace.admin")]
    WorkspaceAdmin,
    #[serde(rename = "workspace.list")]
    WorkspaceList,
    #[serde(rename = "workspace.create")]
    WorkspaceCreate,

    #[serde(rename = "schema.admin")]
    SchemaAdmin,
    #[serde(rename = "schema.create")]
    SchemaCreate,
    #[serde(rename = "schema.read")]
    SchemaRead,
    #[serde(rename = "schema.edit")]
    SchemaEdit,
    #[serde(rename = "schema.delete")]
    SchemaDelete,
    #[serde(rename = "schema.assign")]
    SchemaAssign,

    #[serde(rename = "collection.admin")]
    CollectionAdmin,
    #[serde(rename = "collection.create")]
    CollectionCreate,
    #[serde(rename = "collection.read")]
    CollectionRead,
    #[serde(rename = "collection.write")]
    CollectionWrite,
    #[serde(rename = "collection.run")]
    CollectionRun,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation '{0}'")]
pub struct UnknownOperation(pub String);

impl Operation {
    pub const ALL: [Operation; 25] = [
        Operation::CatalogAdmin,
        Operation::CatalogList,
        Operation::CatalogAdoptView,
        Operation::VariantAdmin,
        Operation::VariantList,
        Operation::VariantClone,
        Operation::VariantCreateView,
        Operation::NamespaceAdmin,
        Operation::NamespaceList,
        Operation::NamespaceCreate,
        Operation::NamespaceEdit,
        Operation::WorkspaceAdmin,
        Operation::WorkspaceList,
        Operation::WorkspaceCreate,
        Operation::SchemaAdmin,
        Operation::SchemaCreate,
        Operation::SchemaRead,
        Operation::SchemaEdit,
        Operation::SchemaDelete,
        Operation::SchemaAssign,
        Operation::CollectionAdmin,
        Operation::CollectionCreate,
        Operation::CollectionRead,
        Operation::CollectionWrite,
        Operation::CollectionRun,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CatalogAdmin => "catalog.admin",
            Self::CatalogList => "catalog.list",
            Self::CatalogAdoptView => "catalog.adoptView",
            Self::VariantAdmin => "variant.admin",
            Self::VariantList => "variant.list",
            Self::VariantClone => "variant.clone",
            Self::VariantCreateView => "variant.createView",
            Self::NamespaceAdmin => "namespace.admin",
            Self::NamespaceList => "namespace.list",
            Self::NamespaceCreate => "namespace.create",
            Self::NamespaceEdit => "namespace.edit",
            Self::WorkspaceAdmin => "workspace.admin",
            Self::WorkspaceList => "workspace.list",
            Self::WorkspaceCreate => "workspace.create",
            Self::SchemaAdmin => "schema.admin",
            Self::SchemaCreate => "schema.create",
            Self::SchemaRead => "schema.read",
            Self::SchemaEdit => "schema.edit",
            Self::SchemaDelete => "schema.delete",
            Self::SchemaAssign => "schema.assign",
            Self::CollectionAdmin => "collection.admin",
            Self::CollectionCreate => "collection.create",
            Self::CollectionRead => "collection.read",
            Self::CollectionWrite => "collection.write",
            Self::CollectionRun => "collection.run",
        }
    }

    /// The resource type that owns this operation.
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Self::CatalogAdmin | Self::CatalogList | Self::CatalogAdoptView => {
                ResourceType::Catalog
            }
            Self::VariantAdmin | Self::VariantList | Self::VariantClone | Self::VariantCreateView => {
                ResourceType::Variant
            }
            Self::NamespaceAdmin
            | Self::NamespaceList
            | Self::NamespaceCreate
            | Self::NamespaceEdit => ResourceType::Namespace,
            Self::WorkspaceAdmin | Self::WorkspaceList | Self::WorkspaceCreate => {
                ResourceType::Workspace
            }
            Self::SchemaAdmin
            | Self::SchemaCreate
            | Self::SchemaRead
            | Self::SchemaEdit
            | Self::SchemaDelete
            | Self::SchemaAssign => ResourceType::Schema,
            Self::CollectionAdmin
            | Self::CollectionCreate
            | Self::CollectionRead
            | Self::CollectionWrite
            | Self::CollectionRun => ResourceType::Collection,
        }
    }

    pub fn is_admin(&self) -> bool {
        *self == Self::admin_for(self.resource_type())
    }

    /// The admin operation of a resource type.
    pub fn admin_for(resource_type: ResourceType) -> Operation {
        match resource_type {
            ResourceType::Catalog => Self::CatalogAdmin,
            ResourceType::Variant => Self::VariantAdmin,
            ResourceType::Namespace => Self::NamespaceAdmin,
            ResourceType::Workspace => Self::WorkspaceAdmin,
            ResourceType::Schema => Self::SchemaAdmin,
            ResourceType::Collection => Self::CollectionAdmin,
        }
    }

    /// All operations owned by a resource type, admin first.
    pub fn of_type(resource_type: ResourceType) -> impl Iterator<Item = Operation> {
        Self::ALL
            .into_iter()
            .filter(move |op| op.resource_type() == resource_type)
    }
}

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
