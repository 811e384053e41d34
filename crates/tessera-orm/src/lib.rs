//! # tessera-orm
//!
//! Permission-guarded query builders.
//!
//! A guarded builder wraps an underlying query builder and checks the caller's permission
//! matrix before any terminal method reaches storage:
//!
//! | Variant                          | Terminal methods                    | Capability     |
//! |----------------------------------|-------------------------------------|----------------|
//! | [`GuardedSelectQueryBuilder`]    | `execute`, `get_*`                  | `read`         |
//! | [`GuardedInsertQueryBuilder`]    | `execute`                           | `create`       |
//! | [`GuardedUpdateQueryBuilder`]    | `execute`                           | `update`       |
//! | [`GuardedDeleteQueryBuilder`]    | `execute`                           | `destroy`      |
//! | [`GuardedSoftDeleteQueryBuilder`]| `execute` (soft-delete and restore) | `soft_delete`  |
//!
//! `get_exists` and `execute_exists_query` are always refused with `METHOD_NOT_ALLOWED`.
//!
//! Guarded builders implement the same [`builder`] traits as the builders they wrap, so
//! they can be substituted anywhere an unguarded builder is accepted.

pub mod builder;
pub mod context;
pub mod delete;
pub mod error;
pub mod insert;
pub mod select;
pub mod soft_delete;
pub mod update;

pub use builder::{
    DeleteQueryBuilder, InsertQueryBuilder, QueryBuilder, SelectQueryBuilder,
    SoftDeleteQueryBuilder, UpdateQueryBuilder, WriteResult,
};
pub use context::{GuardContext, InternalContext};
pub use delete::GuardedDeleteQueryBuilder;
pub use error::QueryError;
pub use insert::GuardedInsertQueryBuilder;
pub use select::GuardedSelectQueryBuilder;
pub use soft_delete::GuardedSoftDeleteQueryBuilder;
pub use update::GuardedUpdateQueryBuilder;

/// Traits and types needed to build and run queries.
pub mod prelude {
    pub use crate::builder::{
        DeleteQueryBuilder, InsertQueryBuilder, QueryBuilder, SelectQueryBuilder,
        SoftDeleteQueryBuilder, UpdateQueryBuilder, WriteResult,
    };
    pub use crate::context::{GuardContext, InternalContext};
    pub use crate::error::QueryError;
    pub use tessera_core::ObjectRecord;
    pub use tessera_policy::{Condition, Join, Order, Selection};
}
