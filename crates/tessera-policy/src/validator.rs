//! Permission validator.
//!
//! The `PermissionValidator` checks a [`QueryShape`] against a permission matrix and the
//! object metadata. Checks run in this order and the first violation wins:
//!
//! 1. **Main object** - known to the metadata, present in the matrix, and granting the
//!    capability the operation requires
//! 2. **Fields** - selected fields readable, written fields updatable, returned fields readable
//! 3. **Joins** - every joined object known and permitted under the [`JoinPolicy`]
//! 4. **Raw conditions** - every table referenced by raw SQL known and readable
//!
//! Anything that cannot be resolved is denied.

use std::collections::HashMap;

use tessera_core::{
    Capability, JoinPolicy, ObjectMetadata, ObjectMetadataMaps, ObjectPermissions,
    ObjectRecordsPermissions,
};

use crate::error::PermissionsError;
use crate::raw::SqlAnalyzer;
use crate::shape::{Join, JoinTarget, QueryOperation, QueryShape, Selection};

/// Validate a query shape, honouring the bypass flag.
///
/// This is the single entry point used by every guarded builder.
pub fn validate_query_is_permitted(
    shape: &QueryShape,
    permissions: &ObjectRecordsPermissions,
    metadata: &ObjectMetadataMaps,
    join_policy: JoinPolicy,
    bypass: bool,
) -> Result<(), PermissionsError> {
    if bypass {
        return Ok(());
    }

    let result = PermissionValidator::new(permissions, metadata)
        .with_join_policy(join_policy)
        .validate(shape);

    match &result {
        Ok(()) => tracing::debug!(
            operation = %shape.operation,
            object = shape.main.as_ref().map(|m| m.object.as_str()).unwrap_or(""),
            "Query permitted"
        ),
        Err(e) => tracing::warn!(
            code = %e.code,
            operation = %shape.operation,
            object = e.object.as_deref().unwrap_or(""),
            field = e.field.as_deref().unwrap_or(""),
            "Query rejected by permission check"
        ),
    }

    result
}

/// Validates query shapes against one actor's permission matrix.
pub struct PermissionValidator<'a> {
    permissions: &'a ObjectRecordsPermissions,
    metadata: &'a ObjectMetadataMaps,
    join_policy: JoinPolicy,
    analyzer: SqlAnalyzer,
}

impl<'a> PermissionValidator<'a> {
    pub fn new(permissions: &'a ObjectRecordsPermissions, metadata: &'a ObjectMetadataMaps) -> Self {
        Self {
            permissions,
            metadata,
            join_policy: JoinPolicy::default(),
            analyzer: SqlAnalyzer::new(),
        }
    }

    /// Set the capability required on joined objects.
    pub fn with_join_policy(mut self, join_policy: JoinPolicy) -> Self {
        self.join_policy = join_policy;
        self
    }

    /// Validate a query shape.
    ///
    /// Returns `Ok(())` if every touched object permits the operation, or the first
    /// `PermissionsError` found.
    pub fn validate(&self, shape: &QueryShape) -> Result<(), PermissionsError> {
        let main = shape
            .main
            .as_ref()
            .ok_or_else(PermissionsError::missing_main_object)?;

        // 1. Main object
        let object = self.resolve_object(&main.object)?;
        let perms = self.object_permissions(object)?;
        let capability = shape.operation.required_capability();
        if !perms.allows(capability) {
            return Err(PermissionsError::object_not_permitted(
                &object.name_singular,
                capability,
            ));
        }

        // 2. Fields
        match shape.operation {
            QueryOperation::Select => {
                self.validate_main_selection(shape, &main.alias, object, perms)?;
            }
            QueryOperation::Insert | QueryOperation::Update => {
                self.validate_written_fields(shape, object, perms)?;
            }
            QueryOperation::Delete | QueryOperation::SoftDelete | QueryOperation::Restore => {}
        }
        if shape.operation.is_write() {
            self.validate_returning(shape, object, perms)?;
        }

        // 3. Joins
        let mut aliases: HashMap<&str, &ObjectMetadata> = HashMap::new();
        aliases.insert(main.alias.as_str(), object);
        for join in &shape.joins {
            let joined = self.resolve_join(join, &aliases)?;
            let joined_perms = self.object_permissions(joined)?;

            if self.join_policy == JoinPolicy::RequireReadable && !joined_perms.can_read {
                return Err(PermissionsError::object_not_permitted(
                    &joined.name_singular,
                    Capability::Read,
                ));
            }
            if join.select {
                self.validate_all_fields_readable(joined, joined_perms)?;
            }
            self.validate_explicit_selection(shape, &join.alias, joined, joined_perms)?;

            aliases.insert(join.alias.as_str(), joined);
        }

        // 4. Raw conditions
        self.validate_raw_fragments(shape)
    }

    fn resolve_object(&self, name: &str) -> Result<&'a ObjectMetadata, PermissionsError> {
        self.metadata
            .get_by_name(name)
            .ok_or_else(|| PermissionsError::object_metadata_not_found(name))
    }

    fn object_permissions(
        &self,
        object: &ObjectMetadata,
    ) -> Result<&'a ObjectPermissions, PermissionsError> {
        self.permissions
            .get(&object.id)
            .ok_or_else(|| PermissionsError::permissions_not_found(&object.name_singular))
    }

    fn resolve_join(
        &self,
        join: &Join,
        aliases: &HashMap<&str, &'a ObjectMetadata>,
    ) -> Result<&'a ObjectMetadata, PermissionsError> {
        match &join.target {
            JoinTarget::Object(name) => self.resolve_object(name),
            JoinTarget::Relation { alias, relation } => {
                let source = aliases
                    .get(alias.as_str())
                    .ok_or_else(|| PermissionsError::relation_not_found(alias, relation))?;
                let target = source.relation(relation).ok_or_else(|| {
                    PermissionsError::relation_not_found(&source.name_singular, relation)
                })?;
                self.resolve_object(&target.target_object)
            }
        }
    }

    /// An empty selection list selects every field of the main alias.
    fn validate_main_selection(
        &self,
        shape: &QueryShape,
        alias: &str,
        object: &ObjectMetadata,
        perms: &ObjectPermissions,
    ) -> Result<(), PermissionsError> {
        if shape.selects.is_empty() {
            return self.validate_all_fields_readable(object, perms);
        }
        self.validate_explicit_selection(shape, alias, object, perms)
    }

    fn validate_explicit_selection(
        &self,
        shape: &QueryShape,
        alias: &str,
        object: &ObjectMetadata,
        perms: &ObjectPermissions,
    ) -> Result<(), PermissionsError> {
        for selection in shape.selects.iter().filter(|s| s.alias() == alias) {
            match selection {
                Selection::AllFields { .. } => self.validate_all_fields_readable(object, perms)?,
                Selection::Field { field, .. } => {
                    if !perms.can_read_field(field) {
                        return Err(PermissionsError::field_not_readable(
                            &object.name_singular,
                            field,
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_all_fields_readable(
        &self,
        object: &ObjectMetadata,
        perms: &ObjectPermissions,
    ) -> Result<(), PermissionsError> {
        if !perms.can_read {
            return Err(PermissionsError::object_not_permitted(
                &object.name_singular,
                Capability::Read,
            ));
        }
        if let Some(field) = perms.read_restricted_fields().first() {
            return Err(PermissionsError::field_not_readable(
                &object.name_singular,
                field,
            ));
        }
        Ok(())
    }

    fn validate_written_fields(
        &self,
        shape: &QueryShape,
        object: &ObjectMetadata,
        perms: &ObjectPermissions,
    ) -> Result<(), PermissionsError> {
        for row in &shape.values {
            let mut fields: Vec<&String> = row.keys().collect();
            fields.sort_unstable();
            if let Some(field) = fields.into_iter().find(|f| !perms.can_update_field(f)) {
                return Err(PermissionsError::field_not_updatable(
                    &object.name_singular,
                    field,
                ));
            }
        }
        Ok(())
    }

    fn validate_returning(
        &self,
        shape: &QueryShape,
        object: &ObjectMetadata,
        perms: &ObjectPermissions,
    ) -> Result<(), PermissionsError> {
        for field in &shape.returning {
            if field == "*" {
                self.validate_all_fields_readable(object, perms)?;
            } else if !perms.can_read_field(field) {
                return Err(PermissionsError::field_not_readable(
                    &object.name_singular,
                    field,
                ));
            }
        }
        Ok(())
    }

    /// Tables reached through raw SQL are read, whatever the join policy says.
    ///
    /// Table names must match a metadata table exactly, schema included. A name in a
    /// schema the metadata does not declare is an unknown table, even when the bare table
    /// name matches a known object.
    fn validate_raw_fragments(&self, shape: &QueryShape) -> Result<(), PermissionsError> {
        for fragment in shape.raw_fragments() {
            let tables = self
                .analyzer
                .referenced_tables(fragment)
                .map_err(PermissionsError::raw_sql_not_allowed)?;

            for table in tables {
                let object = self
                    .metadata
                    .get_by_table_name(&table.qualified_name())
                    .ok_or_else(|| {
                        PermissionsError::raw_sql_not_allowed(format!(
                            "table '{}' is not a known object",
                            table
                        ))
                    })?;
                let perms = self.object_permissions(object)?;
                if !perms.can_read {
                    return Err(PermissionsError::object_not_permitted(
                        &object.name_singular,
                        Capability::Read,
                    ));
                }
            }
        }
        Ok(())
    }
}
