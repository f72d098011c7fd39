// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! View Document Parser
//!
//! Reads view policy documents from JSON or YAML into [`ViewDocument`] and
//! writes them back out.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse external JSON/YAML → Domain objects
//! - **Anti-Corruption:** Field validation stays in `ViewValidator`; this
//!   layer only rejects text that is not a document at all
//!
//! # Document Format
//!
//! ```yaml
//! version: v1
//! kind: View
//! metadata:
//!   name: schema-readers
//!   catalog: sales
//!   description: Read access to collection schemas
//! spec:
//!   rules:
//!     - Intent: Allow
//!       Operation: [schema.read]
//!       Target: [res://catalog/sales/variant/*]
//! ```

use crate::domain::validation::ViewValidator;
use crate::domain::view::{ViewDefinition, ViewDocument};
use anyhow::{anyhow, Context, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick a format from a file extension; anything other than
    /// `.yaml`/`.yml` is treated as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

pub struct ViewDocumentParser;

impl ViewDocumentParser {
    pub fn parse_json(json: &str) -> Result<ViewDocument> {
        serde_json::from_str(json).context("Failed to parse JSON view document")
    }

    pub fn parse_yaml(yaml: &str) -> Result<ViewDocument> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML view document")
    }

    pub fn parse(text: &str, format: DocumentFormat) -> Result<ViewDocument> {
        match format {
            DocumentFormat::Json => Self::parse_json(text),
            DocumentFormat::Yaml => Self::parse_yaml(text),
        }
    }

    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ViewDocument> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read view document: {:?}", path))?;
        Self::parse(&text, DocumentFormat::from_path(path))
    }

    /// Parse a file and validate it into a definition.
    pub fn load_definition<P: AsRef<Path>>(
        path: P,
        validator: &ViewValidator,
    ) -> Result<ViewDefinition> {
        let doc = Self::parse_file(path)?;
        validator
            .validate(&doc)
            .map_err(|e| anyhow!("View document validation failed: {}", e))
    }

    pub fn to_json(doc: &ViewDocument) -> Result<String> {
        serde_json::to_string_pretty(doc).context("Failed to serialize view document to JSON")
    }

    pub fn to_yaml(doc: &ViewDocument) -> Result<String> {
        serde_yaml::to_string(doc).context("Failed to serialize view document to YAML")
    }

    pub fn render(doc: &ViewDocument, format: DocumentFormat) -> Result<String> {
        match format {
            DocumentFormat::Json => Self::to_json(doc),
            DocumentFormat::Yaml => Self::to_yaml(doc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML: &str = r#"
version: v1
kind: View
metadata:
  name: schema-readers
  catalog: sales
spec:
  rules:
    - Intent: Allow
      Operation: [schema.read, schema.read]
      Target: ["res://catalog/sales/variant/*"]
"#;

    #[test]
    fn test_parse_yaml_document() {
        let doc = ViewDocumentParser::parse_yaml(YAML).unwrap();
        assert_eq!(doc.metadata.name, "schema-readers");
        assert_eq!(doc.spec.rules[0].operations.len(), 2);
    }

    #[test]
    fn test_parse_rejects_non_document() {
        assert!(ViewDocumentParser::parse_json("[1, 2]").is_err());
        assert!(ViewDocumentParser::parse_json("{not json").is_err());
    }

    #[test]
    fn test_load_definition_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let def = ViewDocumentParser::load_definition(file.path(), &ViewValidator::default())
            .unwrap();
        assert_eq!(def.catalog, "sales");
        assert_eq!(def.deduplicated().rules.rules()[0].operations.len(), 1);
    }

    #[test]
    fn test_render_json_uses_wire_field_names() {
        let doc = ViewDocumentParser::parse_yaml(YAML).unwrap();
        let json = ViewDocumentParser::render(&doc, DocumentFormat::Json).unwrap();
        assert!(json.contains("\"Intent\""));
        assert!(json.contains("\"Operation\""));
        assert!(json.contains("\"Target\""));
    }
}
