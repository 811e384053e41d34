//! Error types for query builders.

use tessera_policy::{PermissionsError, PermissionsErrorKind};
use thiserror::Error;

/// Errors returned by the terminal methods of a query builder.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The query was refused before reaching storage.
    #[error(transparent)]
    Permission(#[from] PermissionsError),

    /// A `*_or_fail` method found no row.
    #[error("could not find any {object} matching the query")]
    EntityNotFound { object: String },

    /// The storage layer failed.
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl QueryError {
    /// The permission violation, if this is one.
    pub fn permission(&self) -> Option<&PermissionsError> {
        match self {
            QueryError::Permission(e) => Some(e),
            _ => None,
        }
    }

    /// Authorization failures are final; retrying cannot succeed.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, QueryError::Permission(_))
    }

    /// Whether this is a `MethodNotAllowed` refusal.
    pub fn is_method_not_allowed(&self) -> bool {
        self.permission()
            .is_some_and(|e| e.kind() == PermissionsErrorKind::MethodNotAllowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let denied: QueryError = PermissionsError::permissions_not_found("company").into();
        assert!(denied.is_authorization_failure());
        assert!(!denied.is_method_not_allowed());

        let blocked: QueryError = PermissionsError::method_not_allowed("get_exists").into();
        assert!(blocked.is_method_not_allowed());

        let storage: QueryError = anyhow::anyhow!("connection reset").into();
        assert!(!storage.is_authorization_failure());
        assert_eq!(storage.to_string(), "storage error: connection reset");
    }
}
