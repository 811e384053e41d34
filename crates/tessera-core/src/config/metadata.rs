//! Object metadata: the structural description of every object type.
//!
//! Object types are logical record kinds (e.g. `company`, `person`). Each one maps to a
//! storage table, owns a set of fields and may declare relations to other object types.
//! The guarded query builders use this to resolve which permission entries apply to the
//! objects a query touches.
//!
//! Metadata is read-only once built and is shared across every query of a request
//! (usually behind an `Arc`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use super::ConfigError;

/// Identifier of an object type.
pub type ObjectMetadataId = Uuid;

/// A single field of an object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// Field name as used by callers (e.g. `createdAt`).
    pub name: String,

    /// Storage column name. Defaults to the field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
}

impl FieldMetadata {
    /// Create a field whose column name equals its field name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_name: None,
        }
    }

    /// Create a field stored under a different column name.
    pub fn with_column(name: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_name: Some(column_name.into()),
        }
    }

    /// The storage column for this field.
    pub fn column_name(&self) -> &str {
        self.column_name.as_deref().unwrap_or(&self.name)
    }
}

/// A relation from one object type to another.
///
/// Joining through a relation produces `target.target_field = source.join_field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMetadata {
    /// Relation name on the source object (e.g. `company`).
    pub name: String,

    /// Singular name of the target object type.
    pub target_object: String,

    /// Field on the source object holding the join key.
    pub join_field: String,

    /// Field on the target object matched against `join_field`.
    #[serde(default = "default_target_field")]
    pub target_field: String,
}

/// Structural metadata of one object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub id: ObjectMetadataId,
    pub name_singular: String,
    pub table_name: String,
    /// System objects are internal bookkeeping objects (still permission-checked).
    pub is_system: bool,
    pub fields: HashMap<String, FieldMetadata>,
    pub relations: HashMap<String, RelationMetadata>,
    /// Field holding the soft-delete marker, if the object supports soft deletion.
    pub soft_delete_field: Option<String>,
}

impl ObjectMetadata {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.get(name)
    }

    /// Storage column for a field, falling back to the field name for unknown fields.
    pub fn column_for<'a>(&'a self, field: &'a str) -> &'a str {
        self.fields
            .get(field)
            .map(FieldMetadata::column_name)
            .unwrap_or(field)
    }

    /// Look up a relation by name.
    pub fn relation(&self, name: &str) -> Option<&RelationMetadata> {
        self.relations.get(name)
    }

    /// Field names sorted alphabetically (stable ordering for rendering).
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Lookup maps over all object types known to a workspace.
#[derive(Debug, Clone, Default)]
pub struct ObjectMetadataMaps {
    by_id: HashMap<ObjectMetadataId, ObjectMetadata>,
    id_by_name_singular: HashMap<String, ObjectMetadataId>,
    id_by_table_name: HashMap<String, ObjectMetadataId>,
}

impl ObjectMetadataMaps {
    /// Build the maps, rejecting duplicate ids/names/tables and dangling relations.
    pub fn new(objects: impl IntoIterator<Item = ObjectMetadata>) -> Result<Self, ConfigError> {
        let mut maps = Self::default();

        for object in objects {
            if maps.by_id.contains_key(&object.id) {
                return Err(ConfigError::Config(format!(
                    "duplicate object metadata id '{}'",
                    object.id
                )));
            }
            if maps.id_by_name_singular.contains_key(&object.name_singular) {
                return Err(ConfigError::Config(format!(
                    "duplicate object name '{}'",
                    object.name_singular
                )));
            }
            if maps.id_by_table_name.contains_key(&object.table_name) {
                return Err(ConfigError::Config(format!(
                    "table '{}' is mapped by more than one object",
                    object.table_name
                )));
            }

            maps.id_by_name_singular
                .insert(object.name_singular.clone(), object.id);
            maps.id_by_table_name
                .insert(object.table_name.clone(), object.id);
            maps.by_id.insert(object.id, object);
        }

        for object in maps.by_id.values() {
            for relation in object.relations.values() {
                if !maps.id_by_name_singular.contains_key(&relation.target_object) {
                    return Err(ConfigError::Config(format!(
                        "relation '{}.{}' targets unknown object '{}'",
                        object.name_singular, relation.name, relation.target_object
                    )));
                }
            }
        }

        Ok(maps)
    }

    /// Get object metadata by id.
    pub fn get(&self, id: &ObjectMetadataId) -> Option<&ObjectMetadata> {
        self.by_id.get(id)
    }

    /// Resolve an object's id from its singular name.
    pub fn id_by_name(&self, name_singular: &str) -> Option<ObjectMetadataId> {
        self.id_by_name_singular.get(name_singular).copied()
    }

    /// Get object metadata by singular name.
    pub fn get_by_name(&self, name_singular: &str) -> Option<&ObjectMetadata> {
        self.id_by_name(name_singular).and_then(|id| self.by_id.get(&id))
    }

    /// Get object metadata by storage table name.
    ///
    /// The match is exact, schema included: `other.company` does not resolve to an
    /// object stored in `company`, and `company` does not resolve to one stored in
    /// `workspace.company`.
    pub fn get_by_table_name(&self, table_name: &str) -> Option<&ObjectMetadata> {
        self.id_by_table_name
            .get(table_name)
            .and_then(|id| self.by_id.get(id))
    }

    /// Iterate over all objects.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectMetadata> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

// =============================================================================
// YAML definitions
// =============================================================================

/// On-disk metadata definition (`metadata.yaml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataDefinition {
    #[serde(default)]
    pub objects: Vec<ObjectDefinition>,
}

/// On-disk definition of one object type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDefinition {
    /// Stable id. Generated when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectMetadataId>,

    /// Singular object name.
    pub name: String,

    /// Storage table. Defaults to the object name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    #[serde(default)]
    pub is_system: bool,

    #[serde(default)]
    pub fields: Vec<FieldMetadata>,

    #[serde(default)]
    pub relations: Vec<RelationMetadata>,

    /// Soft-delete marker field. Set to `null` for objects without soft deletion.
    #[serde(default = "default_soft_delete_field")]
    pub soft_delete_field: Option<String>,
}

impl MetadataDefinition {
    /// Load a metadata definition from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse a metadata definition from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Build lookup maps from this definition.
    pub fn build(&self) -> Result<ObjectMetadataMaps, ConfigError> {
        ObjectMetadataMaps::new(self.objects.iter().map(ObjectDefinition::to_metadata))
    }
}

impl ObjectDefinition {
    fn to_metadata(&self) -> ObjectMetadata {
        ObjectMetadata {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            name_singular: self.name.clone(),
            table_name: self.table.clone().unwrap_or_else(|| self.name.clone()),
            is_system: self.is_system,
            fields: self
                .fields
                .iter()
                .map(|f| (f.name.clone(), f.clone()))
                .collect(),
            relations: self
                .relations
                .iter()
                .map(|r| (r.name.clone(), r.clone()))
                .collect(),
            soft_delete_field: self.soft_delete_field.clone(),
        }
    }
}

fn default_target_field() -> String {
    "id".to_string()
}

fn default_soft_delete_field() -> Option<String> {
    Some("deletedAt".to_string())
}
