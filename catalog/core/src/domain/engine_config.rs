// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Policy Engine Configuration
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) covering:
// - View document validation limits
// - Storage backend selection
// - Event bus capacity
// - Logging level and format

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::repository::{PostgresConfig, StorageBackend};
use crate::domain::resource_uri::DEFAULT_MAX_NAME_LENGTH;
use crate::domain::view::SUPPORTED_VIEW_VERSION;

pub const CONFIG_API_VERSION: &str = "catalog-policy/v1";
pub const CONFIG_KIND: &str = "PolicyEngineConfig";

/// Top-level policy engine configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyEngineConfigManifest {
    /// API version (must be "catalog-policy/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "PolicyEngineConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: PolicyEngineSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyEngineSpec {
    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// View document validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Document `version` accepted by the validator
    #[serde(default = "default_supported_version")]
    pub supported_version: String,

    /// Maximum length of catalog, view and path segment names
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackendKind {
    #[default]
    InMemory,
    Postgres,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackendKind,

    /// PostgreSQL connection string (required for the postgres backend)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
}

impl StorageConfig {
    pub fn to_backend(&self) -> anyhow::Result<StorageBackend> {
        match self.backend {
            StorageBackendKind::InMemory => Ok(StorageBackend::InMemory),
            StorageBackendKind::Postgres => {
                let connection_string = self
                    .connection_string
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("postgres backend requires storage.connection_string"))?;
                Ok(StorageBackend::PostgreSQL(PostgresConfig { connection_string }))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Broadcast channel capacity
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_supported_version() -> String {
    SUPPORTED_VIEW_VERSION.to_string()
}

fn default_max_name_length() -> usize {
    DEFAULT_MAX_NAME_LENGTH
}

fn default_event_capacity() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            supported_version: default_supported_version(),
            max_name_length: default_max_name_length(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for PolicyEngineConfigManifest {
    fn default() -> Self {
        Self {
            api_version: CONFIG_API_VERSION.to_string(),
            kind: CONFIG_KIND.to_string(),
            metadata: ManifestMetadata {
                name: "catalog-policy".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: PolicyEngineSpec::default(),
        }
    }
}

impl PolicyEngineConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. CATPOL_CONFIG_PATH environment variable
    /// 2. ./catpol-config.yaml (working directory)
    /// 3. ~/.catpol/config.yaml (user home)
    /// 4. /etc/catpol/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("CATPOL_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./catpol-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".catpol").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/catpol/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CATPOL_STORAGE_URL") {
            if url.is_empty() {
                tracing::warn!("CATPOL_STORAGE_URL is set but empty. Ignoring.");
            } else {
                tracing::info!("Environment override: CATPOL_STORAGE_URL (backend=postgres)");
                self.spec.storage.backend = StorageBackendKind::Postgres;
                self.spec.storage.connection_string = Some(url);
            }
        }

        if let Ok(val) = std::env::var("CATPOL_EVENT_CAPACITY") {
            match val.parse::<usize>() {
                Ok(capacity) if capacity > 0 => {
                    tracing::info!("Environment override: CATPOL_EVENT_CAPACITY={}", capacity);
                    self.spec.events.capacity = capacity;
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for CATPOL_EVENT_CAPACITY: '{}'. Expected a positive integer. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != CONFIG_API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                CONFIG_API_VERSION
            );
        }

        if self.kind != CONFIG_KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, CONFIG_KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.validation.supported_version.is_empty() {
            anyhow::bail!("spec.validation.supported_version cannot be empty");
        }

        if self.spec.validation.max_name_length == 0 {
            anyhow::bail!("spec.validation.max_name_length must be greater than zero");
        }

        if self.spec.storage.backend == StorageBackendKind::Postgres
            && self
                .spec
                .storage
                .connection_string
                .as_deref()
                .map_or(true, str::is_empty)
        {
            anyhow::bail!("spec.storage.connection_string is required for the postgres backend");
        }

        if self.spec.events.capacity == 0 {
            anyhow::bail!("spec.events.capacity must be greater than zero");
        }

        match self.spec.logging.format.as_str() {
            "compact" | "json" => {}
            other => anyhow::bail!(
                "Invalid spec.logging.format: '{}'. Must be 'compact' or 'json'",
                other
            ),
        }

        Ok(())
    }
}
