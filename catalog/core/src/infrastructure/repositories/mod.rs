// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository abstractions defined in
//! `crate::domain::repository`.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve views and resolve catalogs
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **PostgresViewRepository** - `views` table, rule sets stored as JSONB
//! - **InMemoryViewRepository** - Thread-safe HashMap-backed storage
//! - **InMemoryCatalogResolver** - Static name to `CatalogId` table
//!
//! # Usage
//!
//! ```no_run
//! # async fn example(database_url: &str) -> anyhow::Result<()> {
//! use catalog_policy_core::infrastructure::repositories::PostgresViewRepository;
//! use sqlx::PgPool;
//!
//! let pool = PgPool::connect(database_url).await?;
//! let repo = PostgresViewRepository::new(pool);
//! # Ok(())
//! # }
//! ```

pub mod postgres_view;

pub use postgres_view::PostgresViewRepository;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::repository::{CatalogResolver, RepositoryError, ViewRepository};
use crate::domain::rule::RuleSet;
use crate::domain::view::{CatalogId, View, ViewId};

fn poisoned<T>(_: T) -> RepositoryError {
    RepositoryError::Unknown("repository lock poisoned".to_string())
}

#[derive(Clone, Default)]
pub struct InMemoryViewRepository {
    views: Arc<RwLock<HashMap<ViewId, View>>>,
}

impl InMemoryViewRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ViewRepository for InMemoryViewRepository {
    async fn create(&self, view: &View) -> Result<(), RepositoryError> {
        let mut views = self.views.write().map_err(poisoned)?;
        if views
            .values()
            .any(|v| v.catalog_id == view.catalog_id && v.name() == view.name())
        {
            return Err(RepositoryError::AlreadyExists(format!(
                "view '{}'",
                view.name()
            )));
        }
        views.insert(view.id, view.clone());
        Ok(())
    }

    async fn update(&self, view: &View, expected_generation: u32) -> Result<(), RepositoryError> {
        let mut views = self.views.write().map_err(poisoned)?;
        match views.get_mut(&view.id) {
            Some(existing) if existing.generation != expected_generation => {
                Err(RepositoryError::Conflict(format!(
                    "view {} is at generation {}, expected {}",
                    view.id, existing.generation, expected_generation
                )))
            }
            Some(existing) => {
                *existing = view.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(format!("view {}", view.id))),
        }
    }

    async fn find_by_name(
        &self,
        catalog_id: CatalogId,
        name: &str,
    ) -> Result<Option<View>, RepositoryError> {
        let views = self.views.read().map_err(poisoned)?;
        Ok(views
            .values()
            .find(|v| v.catalog_id == catalog_id && v.name() == name)
            .cloned())
    }

    async fn list_by_catalog(&self, catalog_id: CatalogId) -> Result<Vec<View>, RepositoryError> {
        let views = self.views.read().map_err(poisoned)?;
        let mut result: Vec<View> = views
            .values()
            .filter(|v| v.catalog_id == catalog_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(result)
    }

    async fn delete(&self, id: ViewId) -> Result<bool, RepositoryError> {
        let mut views = self.views.write().map_err(poisoned)?;
        Ok(views.remove(&id).is_some())
    }

    async fn load_rule_set(&self, id: ViewId) -> Result<RuleSet, RepositoryError> {
        let views = self.views.read().map_err(poisoned)?;
        views
            .get(&id)
            .map(|v| v.rule_set().clone())
            .ok_or_else(|| RepositoryError::NotFound(format!("view {}", id)))
    }

    async fn save_rule_set(&self, id: ViewId, rules: &RuleSet) -> Result<(), RepositoryError> {
        let mut views = self.views.write().map_err(poisoned)?;
        let view = views
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("view {}", id)))?;
        let mut definition = view.definition.clone();
        definition.rules = rules.clone();
        view.replace_definition(definition);
        Ok(())
    }
}

/// Catalog resolver over a fixed name table
#[derive(Clone, Default)]
pub struct InMemoryCatalogResolver {
    catalogs: Arc<RwLock<HashMap<String, CatalogId>>>,
}

impl InMemoryCatalogResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a catalog, returning its identifier. Registering an existing
    /// name returns the identifier already assigned.
    pub fn register(&self, name: &str) -> Result<CatalogId, RepositoryError> {
        let mut catalogs = self.catalogs.write().map_err(poisoned)?;
        Ok(*catalogs.entry(name.to_string()).or_insert_with(CatalogId::new))
    }
}

#[async_trait]
impl CatalogResolver for InMemoryCatalogResolver {
    async fn resolve(&self, catalog_name: &str) -> Result<Option<CatalogId>, RepositoryError> {
        let catalogs = self.catalogs.read().map_err(poisoned)?;
        Ok(catalogs.get(catalog_name).copied())
    }
}
