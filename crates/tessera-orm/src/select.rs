//! Guarded select builder.

use async_trait::async_trait;
use tessera_core::ObjectRecord;
use tessera_policy::{Condition, Join, Order, PermissionsError, QueryShape, Selection};

use crate::builder::{QueryBuilder, SelectQueryBuilder};
use crate::context::GuardContext;
use crate::delete::GuardedDeleteQueryBuilder;
use crate::error::QueryError;
use crate::insert::GuardedInsertQueryBuilder;
use crate::soft_delete::GuardedSoftDeleteQueryBuilder;
use crate::update::GuardedUpdateQueryBuilder;

/// A select builder whose terminal methods are validated against a [`GuardContext`].
///
/// Transitions (`insert`, `update`, `delete`, `soft_delete`, `restore`) return the
/// guarded builder of the new operation carrying the same context. Nothing is validated
/// until a terminal method runs.
///
/// # Example
/// ```ignore
/// use tessera_orm::prelude::*;
///
/// let internal = context.internal_context().clone();
/// let companies = context
///     .guard(PgSelectQueryBuilder::new(pool, internal, "company", "company"))
///     .and_where(Condition::eq("company.name", "Acme"))
///     .get_many()
///     .await?;
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct GuardedSelectQueryBuilder<B> {
    inner: B,
    context: GuardContext,
}

impl<B: SelectQueryBuilder> GuardedSelectQueryBuilder<B> {
    pub fn new(inner: B, context: GuardContext) -> Self {
        Self { inner, context }
    }

    pub fn context(&self) -> &GuardContext {
        &self.context
    }

    fn map(self, f: impl FnOnce(B) -> B) -> Self {
        Self {
            inner: f(self.inner),
            context: self.context,
        }
    }

    fn validate_permissions(&self) -> Result<(), QueryError> {
        self.context.validate(self.inner.shape())?;
        Ok(())
    }

    fn method_not_allowed(method: &str) -> QueryError {
        tracing::warn!(method, "Blocked unguardable query builder method");
        PermissionsError::method_not_allowed(method).into()
    }
}

impl<B: SelectQueryBuilder> QueryBuilder for GuardedSelectQueryBuilder<B> {
    fn shape(&self) -> &QueryShape {
        self.inner.shape()
    }
}

#[async_trait]
impl<B: SelectQueryBuilder> SelectQueryBuilder for GuardedSelectQueryBuilder<B> {
    type Insert = GuardedInsertQueryBuilder<B::Insert>;
    type Update = GuardedUpdateQueryBuilder<B::Update>;
    type Delete = GuardedDeleteQueryBuilder<B::Delete>;
    type SoftDelete = GuardedSoftDeleteQueryBuilder<B::SoftDelete>;

    fn select(self, selection: Vec<Selection>) -> Self {
        self.map(|b| b.select(selection))
    }

    fn add_select(self, selection: Selection) -> Self {
        self.map(|b| b.add_select(selection))
    }

    fn join(self, join: Join) -> Self {
        self.map(|b| b.join(join))
    }

    fn and_where(self, condition: Condition) -> Self {
        self.map(|b| b.and_where(condition))
    }

    fn or_where(self, condition: Condition) -> Self {
        self.map(|b| b.or_where(condition))
    }

    fn order_by(self, field: &str, order: Order) -> Self {
        self.map(|b| b.order_by(field, order))
    }

    fn take(self, limit: u64) -> Self {
        self.map(|b| b.take(limit))
    }

    fn skip(self, offset: u64) -> Self {
        self.map(|b| b.skip(offset))
    }

    fn with_deleted(self) -> Self {
        self.map(|b| b.with_deleted())
    }

    async fn execute(&self) -> Result<Vec<ObjectRecord>, QueryError> {
        self.validate_permissions()?;
        self.inner.execute().await
    }

    async fn get_one(&self) -> Result<Option<ObjectRecord>, QueryError> {
        self.validate_permissions()?;
        self.inner.get_one().await
    }

    async fn get_one_or_fail(&self) -> Result<ObjectRecord, QueryError> {
        self.validate_permissions()?;
        self.inner.get_one_or_fail().await
    }

    async fn get_many(&self) -> Result<Vec<ObjectRecord>, QueryError> {
        self.validate_permissions()?;
        self.inner.get_many().await
    }

    async fn get_many_and_count(&self) -> Result<(Vec<ObjectRecord>, u64), QueryError> {
        self.validate_permissions()?;
        self.inner.get_many_and_count().await
    }

    async fn get_raw_one(&self) -> Result<Option<ObjectRecord>, QueryError> {
        self.validate_permissions()?;
        self.inner.get_raw_one().await
    }

    async fn get_raw_many(&self) -> Result<Vec<ObjectRecord>, QueryError> {
        self.validate_permissions()?;
        self.inner.get_raw_many().await
    }

    async fn get_count(&self) -> Result<u64, QueryError> {
        self.validate_permissions()?;
        self.inner.get_count().await
    }

    // Existence checks build a fresh, unguarded query internally; refused even in bypass.
    async fn get_exists(&self) -> Result<bool, QueryError> {
        Err(Self::method_not_allowed("get_exists"))
    }

    async fn execute_exists_query(&self) -> Result<bool, QueryError> {
        Err(Self::method_not_allowed("execute_exists_query"))
    }

    fn insert(self) -> Self::Insert {
        GuardedInsertQueryBuilder::new(self.inner.insert(), self.context)
    }

    fn update(self) -> Self::Update {
        GuardedUpdateQueryBuilder::new(self.inner.update(), self.context)
    }

    fn update_set(self, values: ObjectRecord) -> Self::Update {
        GuardedUpdateQueryBuilder::new(self.inner.update_set(values), self.context)
    }

    fn delete(self) -> Self::Delete {
        GuardedDeleteQueryBuilder::new(self.inner.delete(), self.context)
    }

    fn soft_delete(self) -> Self::SoftDelete {
        GuardedSoftDeleteQueryBuilder::new(self.inner.soft_delete(), self.context)
    }

    fn restore(self) -> Self::SoftDelete {
        GuardedSoftDeleteQueryBuilder::new(self.inner.restore(), self.context)
    }
}
