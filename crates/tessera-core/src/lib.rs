//! Core types shared across all Tessera crates.
//!
//! - [`config::permissions`]: the permission matrix (what an actor may do per object type)
//! - [`config::metadata`]: object metadata (what object types exist and how they relate)
//! - [`config`]: YAML configuration loading

pub mod config;

pub use config::{
    Capability, ConfigError, FieldMetadata, FieldPermission, JoinPolicy, MetadataDefinition,
    ObjectMetadata, ObjectMetadataId, ObjectMetadataMaps, ObjectPermissions,
    ObjectRecordsPermissions, PermissionMatrixDefinition, RelationMetadata, TesseraConfig,
};

/// A record as exchanged with query builders: field name to JSON value.
pub type ObjectRecord = serde_json::Map<String, serde_json::Value>;
