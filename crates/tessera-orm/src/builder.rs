//! Query builder traits.
//!
//! These traits describe the surface of an underlying SQL query builder: methods that
//! grow the query shape, terminal methods that hit storage, and transitions from a
//! select into a write builder. Storage adapters implement them; the guarded builders in
//! this crate implement them too, so code written against `B: SelectQueryBuilder` works
//! unchanged whether `B` is guarded or not.
//!
//! Shape-building methods and transitions consume `self` and return the next builder.
//! Terminal methods borrow, so a builder can be executed more than once.

use async_trait::async_trait;
use tessera_core::ObjectRecord;
use tessera_policy::{Condition, Join, Order, QueryShape, Selection};

use crate::error::QueryError;

/// Outcome of a write operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteResult {
    /// Rows affected, when the driver reports it.
    pub affected: Option<u64>,
    /// Rows produced by `returning`.
    pub records: Vec<ObjectRecord>,
}

/// Behaviour shared by every builder variant.
pub trait QueryBuilder: Clone + Send + Sync + Sized {
    /// The accumulated query shape.
    fn shape(&self) -> &QueryShape;
}

/// A select query builder.
#[async_trait]
pub trait SelectQueryBuilder: QueryBuilder {
    type Insert: InsertQueryBuilder;
    type Update: UpdateQueryBuilder;
    type Delete: DeleteQueryBuilder;
    type SoftDelete: SoftDeleteQueryBuilder;

    // -- shape --------------------------------------------------------------

    /// Replace the selection.
    fn select(self, selection: Vec<Selection>) -> Self;
    fn add_select(self, selection: Selection) -> Self;
    fn join(self, join: Join) -> Self;
    fn and_where(self, condition: Condition) -> Self;
    fn or_where(self, condition: Condition) -> Self;
    fn order_by(self, field: &str, order: Order) -> Self;
    fn take(self, limit: u64) -> Self;
    fn skip(self, offset: u64) -> Self;
    /// Include soft-deleted rows.
    fn with_deleted(self) -> Self;

    // -- terminal -----------------------------------------------------------

    /// Run the query and return raw rows.
    async fn execute(&self) -> Result<Vec<ObjectRecord>, QueryError>;
    async fn get_one(&self) -> Result<Option<ObjectRecord>, QueryError>;
    async fn get_one_or_fail(&self) -> Result<ObjectRecord, QueryError>;
    async fn get_many(&self) -> Result<Vec<ObjectRecord>, QueryError>;
    /// One page of records plus the total count ignoring `take`/`skip`.
    async fn get_many_and_count(&self) -> Result<(Vec<ObjectRecord>, u64), QueryError>;
    async fn get_raw_one(&self) -> Result<Option<ObjectRecord>, QueryError>;
    async fn get_raw_many(&self) -> Result<Vec<ObjectRecord>, QueryError>;
    async fn get_count(&self) -> Result<u64, QueryError>;
    async fn get_exists(&self) -> Result<bool, QueryError>;
    async fn execute_exists_query(&self) -> Result<bool, QueryError>;

    // -- transitions --------------------------------------------------------

    fn insert(self) -> Self::Insert;
    fn update(self) -> Self::Update;
    /// Switch to an update with its value set.
    fn update_set(self, values: ObjectRecord) -> Self::Update;
    fn delete(self) -> Self::Delete;
    fn soft_delete(self) -> Self::SoftDelete;
    /// Clear the soft-delete marker of matching rows.
    fn restore(self) -> Self::SoftDelete;
}

/// An insert query builder.
#[async_trait]
pub trait InsertQueryBuilder: QueryBuilder {
    fn values(self, rows: Vec<ObjectRecord>) -> Self;
    fn returning(self, fields: Vec<String>) -> Self;

    async fn execute(&self) -> Result<WriteResult, QueryError>;
}

/// An update query builder.
#[async_trait]
pub trait UpdateQueryBuilder: QueryBuilder {
    fn set(self, values: ObjectRecord) -> Self;
    fn and_where(self, condition: Condition) -> Self;
    fn or_where(self, condition: Condition) -> Self;
    fn returning(self, fields: Vec<String>) -> Self;

    async fn execute(&self) -> Result<WriteResult, QueryError>;
}

/// A hard-delete query builder.
#[async_trait]
pub trait DeleteQueryBuilder: QueryBuilder {
    fn and_where(self, condition: Condition) -> Self;
    fn or_where(self, condition: Condition) -> Self;
    fn returning(self, fields: Vec<String>) -> Self;

    async fn execute(&self) -> Result<WriteResult, QueryError>;
}

/// A soft-delete or restore query builder. Only the soft-delete marker is written.
#[async_trait]
pub trait SoftDeleteQueryBuilder: QueryBuilder {
    fn and_where(self, condition: Condition) -> Self;
    fn or_where(self, condition: Condition) -> Self;
    fn returning(self, fields: Vec<String>) -> Self;

    async fn execute(&self) -> Result<WriteResult, QueryError>;
}
