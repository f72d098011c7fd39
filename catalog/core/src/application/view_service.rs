// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! View Management Application Service
//!
//! Orchestrates view lifecycle operations coordinating:
//! - Domain layer: `ViewValidator`, `View` aggregate, derived-view containment
//! - Infrastructure layer: `ViewRepository`, `CatalogResolver`
//! - Event bus: publishing `ViewEvent`s
//!
//! Rule sets are deduplicated before they are persisted and replaced as a
//! whole on update.

use crate::domain::events::ViewEvent;
use crate::domain::repository::{CatalogResolver, RepositoryError, ViewRepository};
use crate::domain::rule::RuleSet;
use crate::domain::validation::{ValidationError, ValidationErrors, ViewValidator};
use crate::domain::view::{
    validate_derived_view, CatalogId, DerivedViewError, View, ViewDefinition, ViewDocument,
};
use crate::infrastructure::event_bus::EventBus;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("invalid view document: {0}")]
    InvalidDocument(String),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("view '{view}' not found in catalog '{catalog}'")]
    ViewNotFound { catalog: String, view: String },

    #[error("catalog '{0}' not found")]
    CatalogNotFound(String),

    #[error("view '{view}' already exists in catalog '{catalog}'")]
    AlreadyExists { catalog: String, view: String },

    #[error("view '{view}' in catalog '{catalog}' was modified concurrently")]
    Conflict { catalog: String, view: String },

    #[error("view '{0}' would grant permissions its parent does not hold")]
    Escalation(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<DerivedViewError> for ViewError {
    fn from(err: DerivedViewError) -> Self {
        match err {
            DerivedViewError::CatalogMismatch { .. } => {
                ViewError::Validation(ValidationErrors::from(ValidationError::InvalidParentScope {
                    field: "metadata.catalog".to_string(),
                    reason: err.to_string(),
                }))
            }
            DerivedViewError::Escalation(name) => ViewError::Escalation(name),
        }
    }
}

/// Parse a JSON policy document.
pub fn parse_view_document(json: &[u8]) -> Result<ViewDocument, ViewError> {
    if json.is_empty() {
        return Err(ViewError::InvalidDocument("empty document".to_string()));
    }
    serde_json::from_slice(json).map_err(|e| ViewError::InvalidDocument(e.to_string()))
}

// ============================================================================
// Service Trait
// ============================================================================

#[async_trait]
pub trait ViewService: Send + Sync {
    /// Create a view. When `parent` names a view of the same catalog the new
    /// view must not exceed it.
    async fn create_view(
        &self,
        document: &ViewDocument,
        parent: Option<&str>,
    ) -> Result<View, ViewError>;

    /// Replace the definition of an existing view, bumping its generation.
    async fn update_view(
        &self,
        document: &ViewDocument,
        parent: Option<&str>,
    ) -> Result<View, ViewError>;

    async fn get_view(&self, catalog: &str, name: &str) -> Result<View, ViewError>;

    /// Render a stored view back to its wire document.
    async fn get_view_document(&self, catalog: &str, name: &str) -> Result<ViewDocument, ViewError>;

    /// Delete a view. Deleting a missing view succeeds.
    async fn delete_view(&self, catalog: &str, name: &str) -> Result<(), ViewError>;

    async fn list_views(&self, catalog: &str) -> Result<Vec<View>, ViewError>;

    /// Rule set used to authorize requests made through a view.
    async fn load_rule_set(&self, catalog: &str, name: &str) -> Result<RuleSet, ViewError>;
}

// ============================================================================
// Standard Implementation
// ============================================================================

pub struct StandardViewService {
    repository: Arc<dyn ViewRepository>,
    catalogs: Arc<dyn CatalogResolver>,
    event_bus: Arc<EventBus>,
    validator: ViewValidator,
}

impl StandardViewService {
    pub fn new(
        repository: Arc<dyn ViewRepository>,
        catalogs: Arc<dyn CatalogResolver>,
        event_bus: Arc<EventBus>,
        validator: ViewValidator,
    ) -> Self {
        Self {
            repository,
            catalogs,
            event_bus,
            validator,
        }
    }

    async fn resolve_catalog(&self, catalog: &str) -> Result<CatalogId, ViewError> {
        self.catalogs
            .resolve(catalog)
            .await?
            .ok_or_else(|| ViewError::CatalogNotFound(catalog.to_string()))
    }

    async fn find(&self, catalog: &str, name: &str) -> Result<(CatalogId, Option<View>), ViewError> {
        let catalog_id = self.resolve_catalog(catalog).await?;
        let view = self.repository.find_by_name(catalog_id, name).await?;
        Ok((catalog_id, view))
    }

    async fn require(&self, catalog: &str, name: &str) -> Result<View, ViewError> {
        self.find(catalog, name)
            .await?
            .1
            .ok_or_else(|| ViewError::ViewNotFound {
                catalog: catalog.to_string(),
                view: name.to_string(),
            })
    }

    /// Validate, check containment against `parent`, and deduplicate.
    async fn prepare(
        &self,
        document: &ViewDocument,
        parent: Option<&str>,
    ) -> Result<ViewDefinition, ViewError> {
        let definition = self.validator.validate(document)?.deduplicated();

        if let Some(parent_name) = parent {
            let parent_view = self.require(&definition.catalog, parent_name).await?;
            validate_derived_view(&parent_view.definition, &definition)?;
        }

        Ok(definition)
    }
}

#[async_trait]
impl ViewService for StandardViewService {
    async fn create_view(
        &self,
        document: &ViewDocument,
        parent: Option<&str>,
    ) -> Result<View, ViewError> {
        let definition = self.prepare(document, parent).await?;
        let catalog_id = self.resolve_catalog(&definition.catalog).await?;

        let view = View::new(catalog_id, definition);
        match self.repository.create(&view).await {
            Ok(()) => {}
            Err(RepositoryError::AlreadyExists(_)) => {
                return Err(ViewError::AlreadyExists {
                    catalog: view.definition.catalog.clone(),
                    view: view.name().to_string(),
                });
            }
            Err(e) => {
                error!(view = %view.name(), catalog = %view.definition.catalog, "Failed to store view: {}", e);
                return Err(e.into());
            }
        }

        info!(view = %view.name(), catalog = %view.definition.catalog, "View created");
        self.event_bus.publish_view_event(ViewEvent::ViewCreated {
            view_id: view.id,
            catalog_id: view.catalog_id,
            name: view.name().to_string(),
            rule_count: view.rule_set().len(),
            created_at: view.created_at,
        });

        Ok(view)
    }

    async fn update_view(
        &self,
        document: &ViewDocument,
        parent: Option<&str>,
    ) -> Result<View, ViewError> {
        let definition = self.prepare(document, parent).await?;
        let mut view = self.require(&definition.catalog, &definition.name).await?;

        let expected_generation = view.generation;
        view.replace_definition(definition);
        self.repository
            .update(&view, expected_generation)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    warn!(
                        view = %view.name(),
                        expected_generation,
                        "View update lost a concurrent write"
                    );
                    ViewError::Conflict {
                        catalog: view.definition.catalog.clone(),
                        view: view.name().to_string(),
                    }
                }
                e => {
                    error!(view = %view.name(), "Failed to update view: {}", e);
                    ViewError::from(e)
                }
            })?;

        info!(
            view = %view.name(),
            catalog = %view.definition.catalog,
            generation = view.generation,
            "View updated"
        );
        self.event_bus.publish_view_event(ViewEvent::ViewUpdated {
            view_id: view.id,
            catalog_id: view.catalog_id,
            name: view.name().to_string(),
            generation: view.generation,
            rule_count: view.rule_set().len(),
            updated_at: view.updated_at,
        });

        Ok(view)
    }

    async fn get_view(&self, catalog: &str, name: &str) -> Result<View, ViewError> {
        self.require(catalog, name).await
    }

    async fn get_view_document(&self, catalog: &str, name: &str) -> Result<ViewDocument, ViewError> {
        Ok(self.require(catalog, name).await?.definition.to_document())
    }

    async fn delete_view(&self, catalog: &str, name: &str) -> Result<(), ViewError> {
        let (catalog_id, view) = self.find(catalog, name).await?;
        let Some(view) = view else {
            debug!(view = %name, catalog = %catalog, "Delete of missing view ignored");
            return Ok(());
        };

        if self.repository.delete(view.id).await? {
            info!(view = %name, catalog = %catalog, "View deleted");
            self.event_bus.publish_view_event(ViewEvent::ViewDeleted {
                view_id: view.id,
                catalog_id,
                name: name.to_string(),
                deleted_at: Utc::now(),
            });
        }
        Ok(())
    }

    async fn list_views(&self, catalog: &str) -> Result<Vec<View>, ViewError> {
        let catalog_id = self.resolve_catalog(catalog).await?;
        Ok(self.repository.list_by_catalog(catalog_id).await?)
    }

    async fn load_rule_set(&self, catalog: &str, name: &str) -> Result<RuleSet, ViewError> {
        let view = self.require(catalog, name).await?;
        Ok(self.repository.load_rule_set(view.id).await?)
    }
}
