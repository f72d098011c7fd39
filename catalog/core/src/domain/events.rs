// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::domain::view::{CatalogId, ViewId};

/// View lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ViewEvent {
    ViewCreated {
        view_id: ViewId,
        catalog_id: CatalogId,
        name: String,
        rule_count: usize,
        created_at: DateTime<Utc>,
    },
    ViewUpdated {
        view_id: ViewId,
        catalog_id: CatalogId,
        name: String,
        generation: u32,
        rule_count: usize,
        updated_at: DateTime<Utc>,
    },
    ViewDeleted {
        view_id: ViewId,
        catalog_id: CatalogId,
        name: String,
        deleted_at: DateTime<Utc>,
    },
}

/// Authorization outcome events. Only denials are published; allows are
/// counted but not broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PolicyEvent {
    AccessDenied {
        operation: String,
        resource: String,
        reason: Option<String>,
        denied_at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_created_serialization() {
        let event = ViewEvent::ViewCreated {
            view_id: ViewId::new(),
            catalog_id: CatalogId::new(),
            name: "readers".to_string(),
            rule_count: 2,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("ViewCreated"));
        assert!(json.contains("readers"));
    }

    #[test]
    fn test_access_denied_serialization() {
        let event = PolicyEvent::AccessDenied {
            operation: "collection.create".to_string(),
            resource: "res://catalog/c/variant/v/collectionschemas/s".to_string(),
            reason: Some("invalid collection".to_string()),
            denied_at: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let deserialized: PolicyEvent = serde_json::from_str(&json).unwrap();
        let PolicyEvent::AccessDenied { reason, .. } = deserialized;
        assert_eq!(reason.as_deref(), Some("invalid collection"));
    }
}
