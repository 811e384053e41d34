//! Tessera Permission Validation
//!
//! Checks the structural description of a query (a [`QueryShape`]) against an actor's
//! permission matrix and the object metadata before the query reaches storage.
//!
//! | Operation     | Main object needs | Joined objects need          |
//! |---------------|-------------------|------------------------------|
//! | `select`      | `read`            | per [`JoinPolicy`]           |
//! | `insert`      | `create`          | per [`JoinPolicy`]           |
//! | `update`      | `update`          | per [`JoinPolicy`]           |
//! | `delete`      | `destroy`         | per [`JoinPolicy`]           |
//! | `soft-delete` | `soft_delete`     | per [`JoinPolicy`]           |
//! | `restore`     | `soft_delete`     | per [`JoinPolicy`]           |
//!
//! Objects missing from the metadata or the matrix are always denied.

pub mod error;
pub mod raw;
pub mod shape;
pub mod validator;

pub use error::{PermissionsError, PermissionsErrorCode, PermissionsErrorKind};
pub use raw::{ALLOWED_FUNCTIONS, SqlAnalyzer, TableReference};
pub use shape::{
    AliasTarget, Condition, FieldRef, Join, JoinKind, JoinTarget, Order, OrderBy,
    QueryOperation, QueryShape, Selection,
};
pub use tessera_core::JoinPolicy;
pub use validator::{PermissionValidator, validate_query_is_permitted};
