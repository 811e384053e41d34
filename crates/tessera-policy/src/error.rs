//! Permission error types.
//!
//! Every violation carries a machine-checkable [`PermissionsErrorCode`] and the offending
//! object/field/capability where known. Codes fall into two kinds: capability denials and
//! categorically unsupported methods.

use std::fmt;
use tessera_core::Capability;

/// Error raised when a query is not permitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PermissionsError {
    /// The reason code.
    pub code: PermissionsErrorCode,
    /// Offending object type (singular name), when known.
    pub object: Option<String>,
    /// Offending field, for field-level violations.
    pub field: Option<String>,
    /// Capability that was required.
    pub capability: Option<Capability>,
    /// Human-readable error message.
    pub message: String,
}

impl PermissionsError {
    fn new(code: PermissionsErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            object: None,
            field: None,
            capability: None,
            message: message.into(),
        }
    }

    fn on_object(mut self, object: &str) -> Self {
        self.object = Some(object.to_string());
        self
    }

    /// Classification of this error.
    pub fn kind(&self) -> PermissionsErrorKind {
        self.code.kind()
    }

    // =========================================================================
    // OBJECT-LEVEL ERRORS
    // =========================================================================

    /// The object does not grant the capability required by the operation.
    pub fn object_not_permitted(object: &str, capability: Capability) -> Self {
        let code = match capability {
            Capability::Read => PermissionsErrorCode::ObjectNotReadable,
            Capability::Create => PermissionsErrorCode::ObjectNotCreatable,
            Capability::Update => PermissionsErrorCode::ObjectNotUpdatable,
            Capability::SoftDelete => PermissionsErrorCode::ObjectNotSoftDeletable,
            Capability::Destroy => PermissionsErrorCode::ObjectNotDeletable,
        };
        let mut err = Self::new(
            code,
            format!(
                "Permission denied: '{}' requires the {} capability",
                object, capability
            ),
        )
        .on_object(object);
        err.capability = Some(capability);
        err
    }

    /// The permission matrix has no entry for the object.
    pub fn permissions_not_found(object: &str) -> Self {
        Self::new(
            PermissionsErrorCode::PermissionsNotFound,
            format!("No permissions found for object '{}'", object),
        )
        .on_object(object)
    }

    /// The object is unknown to the metadata.
    pub fn object_metadata_not_found(object: &str) -> Self {
        Self::new(
            PermissionsErrorCode::ObjectMetadataNotFound,
            format!("Object metadata not found for '{}'", object),
        )
        .on_object(object)
    }

    /// The query has no main object to check.
    pub fn missing_main_object() -> Self {
        Self::new(
            PermissionsErrorCode::ObjectMetadataNotFound,
            "Query has no main object; cannot resolve permissions",
        )
    }

    /// A join references an unknown relation or alias.
    pub fn relation_not_found(source: &str, relation: &str) -> Self {
        Self::new(
            PermissionsErrorCode::RelationNotFound,
            format!("Relation '{}.{}' not found", source, relation),
        )
        .on_object(source)
    }

    // =========================================================================
    // FIELD-LEVEL ERRORS
    // =========================================================================

    pub fn field_not_readable(object: &str, field: &str) -> Self {
        let mut err = Self::new(
            PermissionsErrorCode::FieldNotReadable,
            format!("Field '{}' of '{}' is not readable", field, object),
        )
        .on_object(object);
        err.field = Some(field.to_string());
        err.capability = Some(Capability::Read);
        err
    }

    pub fn field_not_updatable(object: &str, field: &str) -> Self {
        let mut err = Self::new(
            PermissionsErrorCode::FieldNotUpdatable,
            format!("Field '{}' of '{}' is not updatable", field, object),
        )
        .on_object(object);
        err.field = Some(field.to_string());
        err.capability = Some(Capability::Update);
        err
    }

    // =========================================================================
    // STRUCTURAL ERRORS
    // =========================================================================

    /// A raw SQL fragment cannot be checked.
    pub fn raw_sql_not_allowed(reason: impl fmt::Display) -> Self {
        Self::new(
            PermissionsErrorCode::RawSqlNotAllowed,
            format!("Raw SQL not allowed: {}", reason),
        )
    }

    /// The method cannot be intercepted and is always refused.
    pub fn method_not_allowed(method: &str) -> Self {
        Self::new(
            PermissionsErrorCode::MethodNotAllowed,
            format!(
                "{} is not supported because it would build an unguarded query",
                method
            ),
        )
    }
}

/// Reason codes for permission violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionsErrorCode {
    ObjectNotReadable,
    ObjectNotCreatable,
    ObjectNotUpdatable,
    ObjectNotDeletable,
    ObjectNotSoftDeletable,
    FieldNotReadable,
    FieldNotUpdatable,
    /// No matrix entry for a touched object.
    PermissionsNotFound,
    /// A touched object is unknown to the metadata.
    ObjectMetadataNotFound,
    RelationNotFound,
    RawSqlNotAllowed,
    MethodNotAllowed,
}

impl PermissionsErrorCode {
    /// Stable wire representation (e.g. `OBJECT_NOT_READABLE`).
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionsErrorCode::ObjectNotReadable => "OBJECT_NOT_READABLE",
            PermissionsErrorCode::ObjectNotCreatable => "OBJECT_NOT_CREATABLE",
            PermissionsErrorCode::ObjectNotUpdatable => "OBJECT_NOT_UPDATABLE",
            PermissionsErrorCode::ObjectNotDeletable => "OBJECT_NOT_DELETABLE",
            PermissionsErrorCode::ObjectNotSoftDeletable => "OBJECT_NOT_SOFT_DELETABLE",
            PermissionsErrorCode::FieldNotReadable => "FIELD_NOT_READABLE",
            PermissionsErrorCode::FieldNotUpdatable => "FIELD_NOT_UPDATABLE",
            PermissionsErrorCode::PermissionsNotFound => "PERMISSIONS_NOT_FOUND",
            PermissionsErrorCode::ObjectMetadataNotFound => "OBJECT_METADATA_NOT_FOUND",
            PermissionsErrorCode::RelationNotFound => "RELATION_NOT_FOUND",
            PermissionsErrorCode::RawSqlNotAllowed => "RAW_SQL_NOT_ALLOWED",
            PermissionsErrorCode::MethodNotAllowed => "METHOD_NOT_ALLOWED",
        }
    }

    pub fn kind(self) -> PermissionsErrorKind {
        match self {
            PermissionsErrorCode::MethodNotAllowed => PermissionsErrorKind::MethodNotAllowed,
            _ => PermissionsErrorKind::PermissionDenied,
        }
    }
}

impl fmt::Display for PermissionsErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categories of permission errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionsErrorKind {
    /// A touched object lacks the required capability, or has no matrix entry.
    PermissionDenied,
    /// The operation is structurally unsupported regardless of permissions.
    MethodNotAllowed,
}
