//! Permission context carried by every guarded builder.

use std::sync::Arc;

use tessera_core::{JoinPolicy, ObjectMetadataMaps, ObjectRecordsPermissions};
use tessera_policy::{PermissionsError, QueryShape, validate_query_is_permitted};

use crate::select::GuardedSelectQueryBuilder;

/// Request-scoped, read-only context shared by all queries of a workspace.
#[derive(Debug, Default)]
pub struct InternalContext {
    pub object_metadata_maps: ObjectMetadataMaps,
    pub join_policy: JoinPolicy,
}

impl InternalContext {
    pub fn new(object_metadata_maps: ObjectMetadataMaps) -> Self {
        Self {
            object_metadata_maps,
            join_policy: JoinPolicy::default(),
        }
    }

    pub fn with_join_policy(mut self, join_policy: JoinPolicy) -> Self {
        self.join_policy = join_policy;
        self
    }
}

/// Permission matrix, metadata context and bypass flag of a builder chain.
///
/// Cloning is cheap and shares the matrix and metadata. Every builder derived from
/// another (by clone or by transition) carries an identical context.
#[derive(Debug, Clone)]
pub struct GuardContext {
    permissions: Arc<ObjectRecordsPermissions>,
    internal: Arc<InternalContext>,
    bypass: bool,
}

impl GuardContext {
    /// A context that validates every terminal call.
    pub fn new(permissions: Arc<ObjectRecordsPermissions>, internal: Arc<InternalContext>) -> Self {
        Self {
            permissions,
            internal,
            bypass: false,
        }
    }

    /// A context for trusted internal paths that skips validation.
    ///
    /// `reason` is logged so every bypassing chain can be traced to its origin.
    pub fn system(
        permissions: Arc<ObjectRecordsPermissions>,
        internal: Arc<InternalContext>,
        reason: &str,
    ) -> Self {
        tracing::info!(reason, "Permission checks bypassed for system query context");
        Self {
            permissions,
            internal,
            bypass: true,
        }
    }

    pub fn permissions(&self) -> &Arc<ObjectRecordsPermissions> {
        &self.permissions
    }

    pub fn internal_context(&self) -> &Arc<InternalContext> {
        &self.internal
    }

    pub fn should_bypass_permission_checks(&self) -> bool {
        self.bypass
    }

    /// Whether two contexts share the same matrix, metadata and bypass flag.
    pub fn is_same_as(&self, other: &GuardContext) -> bool {
        Arc::ptr_eq(&self.permissions, &other.permissions)
            && Arc::ptr_eq(&self.internal, &other.internal)
            && self.bypass == other.bypass
    }

    /// Wrap a select builder so every terminal call is validated against this context.
    pub fn guard<B>(&self, builder: B) -> GuardedSelectQueryBuilder<B>
    where
        B: crate::builder::SelectQueryBuilder,
    {
        GuardedSelectQueryBuilder::new(builder, self.clone())
    }

    /// Validate a query shape against this context.
    pub fn validate(&self, shape: &QueryShape) -> Result<(), PermissionsError> {
        validate_query_is_permitted(
            shape,
            &self.permissions,
            &self.internal.object_metadata_maps,
            self.internal.join_policy,
            self.bypass,
        )
    }
}
