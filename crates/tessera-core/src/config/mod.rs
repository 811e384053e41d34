//! Configuration types for Tessera.
//!
//! Configuration is loaded from YAML files and combined into a single `TesseraConfig`.
//!
//! # Configuration Files
//!
//! - **tessera.yaml**: Main configuration file (metadata location, permission files, join policy)
//! - **metadata.yaml**: Object types, their fields and relations
//! - **permissions/*.yaml**: One permission matrix per role

pub mod metadata;
pub mod permissions;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub use metadata::{
    FieldMetadata, MetadataDefinition, ObjectDefinition, ObjectMetadata, ObjectMetadataId,
    ObjectMetadataMaps, RelationMetadata,
};
pub use permissions::{
    Capability, FieldPermission, ObjectPermissions, ObjectRecordsPermissions,
    PermissionMatrixDefinition,
};

/// Capability required on objects joined into a query.
///
/// Joined objects are only used to filter or enrich the main object's rows, so a
/// deployment may choose to require less than full read access on them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    /// Joined objects must be readable.
    #[default]
    RequireReadable,
    /// Joined objects only need an entry in the permission matrix.
    RequireEntry,
}

/// Complete Tessera configuration loaded from files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TesseraConfig {
    /// Project name.
    #[serde(default)]
    pub project: Option<String>,

    /// Path to the metadata definition file.
    #[serde(default)]
    pub metadata_file: Option<PathBuf>,

    /// Inline metadata definition (replaced by `metadata_file` when both are set).
    #[serde(default)]
    pub metadata: MetadataDefinition,

    /// Directory containing permission matrix files.
    #[serde(default)]
    pub permissions_dir: Option<PathBuf>,

    /// List of individual permission matrix files.
    #[serde(default)]
    pub permission_files: Vec<PathBuf>,

    /// Inline permission matrices keyed by role.
    #[serde(default)]
    pub roles: HashMap<String, PermissionMatrixDefinition>,

    /// Capability required on joined objects.
    #[serde(default)]
    pub join_policy: JoinPolicy,
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TesseraConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration and resolve all external references.
    ///
    /// This loads:
    /// - Object metadata from `metadata_file` if specified
    /// - Permission matrices from `permissions_dir` and `permission_files`
    ///
    /// Relative paths resolve against the directory of `path`.
    pub fn load_with_context(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;

        let base_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        if let Some(metadata_file) = &config.metadata_file {
            let metadata_path = resolve(&base_dir, metadata_file);
            config.metadata = MetadataDefinition::from_file(&metadata_path)?;
        }

        if let Some(permissions_dir) = &config.permissions_dir {
            let permissions_path = resolve(&base_dir, permissions_dir);

            if permissions_path.is_dir() {
                let mut paths = Vec::new();
                for entry in fs::read_dir(&permissions_path)? {
                    let path = entry?.path();
                    if path
                        .extension()
                        .map(|e| e == "yaml" || e == "yml")
                        .unwrap_or(false)
                    {
                        paths.push(path);
                    }
                }
                paths.sort();

                for path in paths {
                    let matrix = PermissionMatrixDefinition::from_file(&path)?;
                    config.roles.insert(matrix.role.clone(), matrix);
                }
            }
        }

        for permission_file in &config.permission_files.clone() {
            let matrix = PermissionMatrixDefinition::from_file(resolve(&base_dir, permission_file))?;
            config.roles.insert(matrix.role.clone(), matrix);
        }

        Ok(config)
    }

    /// Build the object metadata lookup maps.
    pub fn metadata_maps(&self) -> Result<ObjectMetadataMaps, ConfigError> {
        self.metadata.build()
    }

    /// Resolve the permission matrix of a role against the given metadata.
    pub fn permissions_for(
        &self,
        role: &str,
        metadata: &ObjectMetadataMaps,
    ) -> Result<ObjectRecordsPermissions, ConfigError> {
        let definition = self
            .roles
            .get(role)
            .ok_or_else(|| ConfigError::Config(format!("unknown role '{}'", role)))?;
        ObjectRecordsPermissions::from_definition(definition, metadata)
    }

    /// Role names, sorted.
    pub fn role_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.roles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
