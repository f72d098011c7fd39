// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL View Repository
//!
//! Production `ViewRepository` backed by the `views` table via `sqlx`. The
//! rule set is stored verbatim as JSONB so it loads back in declaration order.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::repository::{RepositoryError, ViewRepository};
use crate::domain::rule::RuleSet;
use crate::domain::view::{CatalogId, View, ViewDefinition, ViewId};

/// Convert a view generation to the `INTEGER` column type.
fn generation_to_db(generation: u32) -> Result<i32, RepositoryError> {
    i32::try_from(generation).map_err(|_| {
        RepositoryError::Serialization(format!(
            "generation {} does not fit the generation column",
            generation
        ))
    })
}

/// Convert a stored `INTEGER` generation back to a view generation.
fn generation_from_db(generation: i32) -> Result<u32, RepositoryError> {
    u32::try_from(generation).map_err(|_| {
        RepositoryError::Serialization(format!("stored generation {} is negative", generation))
    })
}

pub struct PostgresViewRepository {
    pool: PgPool,
}

impl PostgresViewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `views` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS views (
                id UUID PRIMARY KEY,
                catalog_id UUID NOT NULL,
                catalog TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                rules JSONB NOT NULL,
                generation INTEGER NOT NULL DEFAULT 1,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                UNIQUE (catalog_id, name)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn row_to_view(row: &PgRow) -> Result<View, RepositoryError> {
        let id: uuid::Uuid = row.get("id");
        let catalog_id: uuid::Uuid = row.get("catalog_id");
        let rules_json: serde_json::Value = row.get("rules");
        let generation: i32 = row.get("generation");

        let rules: RuleSet = serde_json::from_value(rules_json).map_err(|e| {
            RepositoryError::Serialization(format!("Failed to deserialize rules: {}", e))
        })?;

        Ok(View {
            id: ViewId(id),
            catalog_id: CatalogId(catalog_id),
            definition: ViewDefinition {
                name: row.get("name"),
                catalog: row.get("catalog"),
                description: row.get("description"),
                rules,
            },
            generation: generation_from_db(generation)?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl ViewRepository for PostgresViewRepository {
    async fn create(&self, view: &View) -> Result<(), RepositoryError> {
        let rules_json = serde_json::to_value(view.rule_set())?;
        let generation = generation_to_db(view.generation)?;

        sqlx::query(
            r#"
            INSERT INTO views (
                id, catalog_id, catalog, name, description,
                rules, generation, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(view.id.0)
        .bind(view.catalog_id.0)
        .bind(&view.definition.catalog)
        .bind(&view.definition.name)
        .bind(&view.definition.description)
        .bind(rules_json)
        .bind(generation)
        .bind(view.created_at)
        .bind(view.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, view: &View, expected_generation: u32) -> Result<(), RepositoryError> {
        let rules_json = serde_json::to_value(view.rule_set())?;
        let generation = generation_to_db(view.generation)?;
        let expected = generation_to_db(expected_generation)?;

        let result = sqlx::query(
            r#"
            UPDATE views SET
                description = $2,
                rules = $3,
                generation = $4,
                updated_at = $5
            WHERE id = $1 AND generation = $6
            "#,
        )
        .bind(view.id.0)
        .bind(&view.definition.description)
        .bind(rules_json)
        .bind(generation)
        .bind(view.updated_at)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let current: Option<i32> = sqlx::query_scalar("SELECT generation FROM views WHERE id = $1")
            .bind(view.id.0)
            .fetch_optional(&self.pool)
            .await?;
        match current {
            Some(current) => Err(RepositoryError::Conflict(format!(
                "view {} is at generation {}, expected {}",
                view.id, current, expected_generation
            ))),
            None => Err(RepositoryError::NotFound(format!("view {}", view.id))),
        }
    }

    async fn find_by_name(
        &self,
        catalog_id: CatalogId,
        name: &str,
    ) -> Result<Option<View>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, catalog_id, catalog, name, description, rules,
                   generation, created_at, updated_at
            FROM views
            WHERE catalog_id = $1 AND name = $2
            "#,
        )
        .bind(catalog_id.0)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_view).transpose()
    }

    async fn list_by_catalog(&self, catalog_id: CatalogId) -> Result<Vec<View>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, catalog_id, catalog, name, description, rules,
                   generation, created_at, updated_at
            FROM views
            WHERE catalog_id = $1
            ORDER BY name
            "#,
        )
        .bind(catalog_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_view).collect()
    }

    async fn delete(&self, id: ViewId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM views WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn load_rule_set(&self, id: ViewId) -> Result<RuleSet, RepositoryError> {
        let row = sqlx::query("SELECT rules FROM views WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("view {}", id)))?;

        let rules_json: serde_json::Value = row.get("rules");
        Ok(serde_json::from_value(rules_json)?)
    }

    async fn save_rule_set(&self, id: ViewId, rules: &RuleSet) -> Result<(), RepositoryError> {
        let rules_json = serde_json::to_value(rules)?;

        let result = sqlx::query(
            r#"
            UPDATE views SET
                rules = $2,
                generation = generation + 1,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(rules_json)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("view {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_conversions_are_checked() {
        assert_eq!(generation_to_db(1).unwrap(), 1);
        assert_eq!(generation_to_db(i32::MAX as u32).unwrap(), i32::MAX);
        assert!(matches!(
            generation_to_db(i32::MAX as u32 + 1),
            Err(RepositoryError::Serialization(_))
        ));

        assert_eq!(generation_from_db(7).unwrap(), 7);
        assert!(matches!(
            generation_from_db(-1),
            Err(RepositoryError::Serialization(_))
        ));
    }
}
