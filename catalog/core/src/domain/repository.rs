// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts consumed by view management. Interfaces live in the
//! domain layer and are implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Purpose | Implementations |
//! |-------|---------|----------------|
//! | `ViewRepository` | `View` aggregate and its rule set | `InMemoryViewRepository`, `PostgresViewRepository` |
//! | `CatalogResolver` | catalog name to identifier | `InMemoryCatalogResolver` |
//!
//! ## Storage Backend Abstraction
//!
//! Concrete implementations are selected at startup from configuration
//! (`catpol-config.yaml`). In-memory implementations are used for development
//! and testing; PostgreSQL for production.

use async_trait::async_trait;
use crate::domain::rule::RuleSet;
use crate::domain::view::{CatalogId, View, ViewId};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
}

/// Repository interface for View aggregates
#[async_trait]
pub trait ViewRepository: Send + Sync {
    /// Insert a new view. Fails with `AlreadyExists` if the name is taken
    /// within the catalog.
    async fn create(&self, view: &View) -> Result<(), RepositoryError>;

    /// Replace an existing view if its stored generation is still
    /// `expected_generation`. Fails with `Conflict` when another writer got
    /// there first and with `NotFound` when the view is gone.
    async fn update(&self, view: &View, expected_generation: u32) -> Result<(), RepositoryError>;

    async fn find_by_name(
        &self,
        catalog_id: CatalogId,
        name: &str,
    ) -> Result<Option<View>, RepositoryError>;

    /// List views of a catalog ordered by name
    async fn list_by_catalog(&self, catalog_id: CatalogId) -> Result<Vec<View>, RepositoryError>;

    /// Delete view by ID. Returns whether a view was removed.
    async fn delete(&self, id: ViewId) -> Result<bool, RepositoryError>;

    /// Load the rule set of a view verbatim
    async fn load_rule_set(&self, id: ViewId) -> Result<RuleSet, RepositoryError>;

    /// Atomically replace the rule set of a view
    async fn save_rule_set(&self, id: ViewId, rules: &RuleSet) -> Result<(), RepositoryError>;
}

/// Turns human-readable catalog names into canonical identifiers
#[async_trait]
pub trait CatalogResolver: Send + Sync {
    async fn resolve(&self, catalog_name: &str) -> Result<Option<CatalogId>, RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Entity already exists: {0}")]
    AlreadyExists(String),

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                RepositoryError::AlreadyExists(db_err.message().to_string())
            }
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
