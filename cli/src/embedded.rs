// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Embedded engine
//!
//! Builds the view service in-process from a loaded configuration. The
//! in-memory backend lives only as long as the command; the postgres backend
//! persists views across invocations.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use catalog_policy_core::{
    application::view_service::StandardViewService,
    engine_config::PolicyEngineConfigManifest,
    infrastructure::{
        event_bus::EventBus,
        repositories::{InMemoryViewRepository, PostgresViewRepository},
    },
    repository::{CatalogResolver, RepositoryError, StorageBackend, ViewRepository},
    resource_uri::validate_resource_name,
    validation::ViewValidator,
    view::CatalogId,
};

/// Resolves any well-formed catalog name to a stable id derived from the name.
///
/// The CLI has no catalog registry of its own, so ids must be reproducible
/// between runs for views stored in postgres to be found again.
pub struct NamedCatalogResolver {
    max_name_length: usize,
}

impl NamedCatalogResolver {
    pub fn new(max_name_length: usize) -> Self {
        Self { max_name_length }
    }

    pub fn catalog_id(name: &str) -> CatalogId {
        CatalogId(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
    }
}

#[async_trait]
impl CatalogResolver for NamedCatalogResolver {
    async fn resolve(&self, name: &str) -> Result<Option<CatalogId>, RepositoryError> {
        if validate_resource_name(name, self.max_name_length).is_err() {
            return Ok(None);
        }
        Ok(Some(Self::catalog_id(name)))
    }
}

pub struct EmbeddedEngine {
    pub view_service: Arc<StandardViewService>,
    pub event_bus: Arc<EventBus>,
}

impl EmbeddedEngine {
    pub async fn new(config: &PolicyEngineConfigManifest) -> Result<Self> {
        config
            .validate()
            .context("Configuration validation failed")?;

        let validator = ViewValidator::from_config(&config.spec.validation);
        let event_bus = Arc::new(EventBus::new(config.spec.events.capacity));

        let repository: Arc<dyn ViewRepository> = match config.spec.storage.to_backend()? {
            StorageBackend::InMemory => {
                info!("Using in-memory view storage");
                Arc::new(InMemoryViewRepository::new())
            }
            StorageBackend::PostgreSQL(pg) => {
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&pg.connection_string)
                    .await
                    .context("Failed to connect to PostgreSQL")?;
                let repo = PostgresViewRepository::new(pool);
                repo.ensure_schema()
                    .await
                    .context("Failed to prepare views table")?;
                info!("Using PostgreSQL view storage");
                Arc::new(repo)
            }
        };

        let catalogs = Arc::new(NamedCatalogResolver::new(
            config.spec.validation.max_name_length,
        ));

        let view_service = Arc::new(StandardViewService::new(
            repository,
            catalogs,
            event_bus.clone(),
            validator,
        ));

        Ok(Self {
            view_service,
            event_bus,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catalog_ids_are_stable() {
        let resolver = NamedCatalogResolver::new(63);
        let a = resolver.resolve("sales").await.unwrap();
        let b = resolver.resolve("sales").await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, resolver.resolve("hr").await.unwrap());
        assert_eq!(resolver.resolve("Not_Valid").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_in_memory_engine_from_default_config() {
        let engine = EmbeddedEngine::new(&PolicyEngineConfigManifest::default())
            .await
            .unwrap();
        assert_eq!(engine.event_bus.subscriber_count(), 0);
    }
}
