//! Permission matrix types with the read/create/update/soft-delete/destroy model.
//!
//! A permission matrix maps every object type an actor may touch to its capabilities.
//! Object types without an entry are denied. Capabilities can be narrowed per field
//! through `restricted_fields`.
//!
//! # Permission Model
//!
//! | Capability   | Operations             |
//! |--------------|------------------------|
//! | `read`       | select                 |
//! | `create`     | insert                 |
//! | `update`     | update                 |
//! | `soft_delete`| soft-delete, restore   |
//! | `destroy`    | delete (hard delete)   |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use super::ConfigError;
use super::metadata::{ObjectMetadataId, ObjectMetadataMaps};

/// A capability that can be granted on an object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Read,
    Create,
    Update,
    SoftDelete,
    Destroy,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Read => write!(f, "read"),
            Capability::Create => write!(f, "create"),
            Capability::Update => write!(f, "update"),
            Capability::SoftDelete => write!(f, "soft_delete"),
            Capability::Destroy => write!(f, "destroy"),
        }
    }
}

/// Per-field override. `Some(false)` restricts; anything else inherits the object grant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPermission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_read: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_update: Option<bool>,
}

impl FieldPermission {
    pub fn is_read_restricted(&self) -> bool {
        self.can_read == Some(false)
    }

    pub fn is_update_restricted(&self) -> bool {
        self.can_update == Some(false)
    }
}

/// Capabilities granted on one object type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectPermissions {
    #[serde(default)]
    pub can_read: bool,

    #[serde(default)]
    pub can_create: bool,

    #[serde(default)]
    pub can_update: bool,

    #[serde(default)]
    pub can_soft_delete: bool,

    #[serde(default)]
    pub can_destroy: bool,

    /// Field-level restrictions keyed by field name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub restricted_fields: HashMap<String, FieldPermission>,
}

impl ObjectPermissions {
    /// Every capability granted, no field restrictions.
    pub fn all() -> Self {
        Self {
            can_read: true,
            can_create: true,
            can_update: true,
            can_soft_delete: true,
            can_destroy: true,
            restricted_fields: HashMap::new(),
        }
    }

    /// Read access only.
    pub fn read_only() -> Self {
        Self {
            can_read: true,
            ..Self::default()
        }
    }

    /// Restrict a field (builder style).
    pub fn with_restricted_field(mut self, field: impl Into<String>, perm: FieldPermission) -> Self {
        self.restricted_fields.insert(field.into(), perm);
        self
    }

    /// Check an object-level capability.
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Read => self.can_read,
            Capability::Create => self.can_create,
            Capability::Update => self.can_update,
            Capability::SoftDelete => self.can_soft_delete,
            Capability::Destroy => self.can_destroy,
        }
    }

    /// Whether a field may be read (object read grant minus field restriction).
    pub fn can_read_field(&self, field: &str) -> bool {
        self.can_read
            && !self
                .restricted_fields
                .get(field)
                .is_some_and(FieldPermission::is_read_restricted)
    }

    /// Whether a field may be written. Writes are gated by the object-level capability
    /// of the operation; this only applies the field restriction.
    pub fn can_update_field(&self, field: &str) -> bool {
        !self
            .restricted_fields
            .get(field)
            .is_some_and(FieldPermission::is_update_restricted)
    }

    /// Read-restricted field names, sorted.
    pub fn read_restricted_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self
            .restricted_fields
            .iter()
            .filter(|(_, p)| p.is_read_restricted())
            .map(|(name, _)| name.as_str())
            .collect();
        fields.sort_unstable();
        fields
    }
}

/// The resolved permission matrix of one actor, keyed by object metadata id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectRecordsPermissions {
    objects: HashMap<ObjectMetadataId, ObjectPermissions>,
}

impl ObjectRecordsPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the entry for an object type.
    pub fn insert(&mut self, id: ObjectMetadataId, permissions: ObjectPermissions) {
        self.objects.insert(id, permissions);
    }

    /// Get the entry for an object type. `None` means denied.
    pub fn get(&self, id: &ObjectMetadataId) -> Option<&ObjectPermissions> {
        self.objects.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectMetadataId, &ObjectPermissions)> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Resolve a name-keyed definition against object metadata.
    ///
    /// Every object named in the definition must exist, and every restricted field must
    /// be a known field of its object.
    pub fn from_definition(
        definition: &PermissionMatrixDefinition,
        metadata: &ObjectMetadataMaps,
    ) -> Result<Self, ConfigError> {
        let mut matrix = Self::new();

        for (name, permissions) in &definition.objects {
            let object = metadata.get_by_name(name).ok_or_else(|| {
                ConfigError::Config(format!(
                    "role '{}' grants permissions on unknown object '{}'",
                    definition.role, name
                ))
            })?;

            for field in permissions.restricted_fields.keys() {
                if object.field(field).is_none() {
                    return Err(ConfigError::Config(format!(
                        "role '{}' restricts unknown field '{}.{}'",
                        definition.role, name, field
                    )));
                }
            }

            matrix.insert(object.id, permissions.clone());
        }

        Ok(matrix)
    }
}

impl FromIterator<(ObjectMetadataId, ObjectPermissions)> for ObjectRecordsPermissions {
    fn from_iter<I: IntoIterator<Item = (ObjectMetadataId, ObjectPermissions)>>(iter: I) -> Self {
        Self {
            objects: iter.into_iter().collect(),
        }
    }
}

/// On-disk permission matrix of one role (`permissions/*.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionMatrixDefinition {
    /// Role name (e.g. `sales_rep`).
    pub role: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Object permissions keyed by singular object name.
    #[serde(default)]
    pub objects: HashMap<String, ObjectPermissions>,
}

impl PermissionMatrixDefinition {
    /// Load a permission matrix from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse a permission matrix from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }
}
