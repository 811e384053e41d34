//! Postgres implementations of the query builder traits.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tessera_core::{ObjectMetadataMaps, ObjectRecord};
use tessera_orm::{
    DeleteQueryBuilder, GuardContext, GuardedSelectQueryBuilder, InsertQueryBuilder,
    InternalContext, QueryBuilder, QueryError, SelectQueryBuilder, SoftDeleteQueryBuilder,
    UpdateQueryBuilder, WriteResult,
};
use tessera_policy::{
    Condition, FieldRef, Join, Order, OrderBy, QueryOperation, QueryShape, Selection,
};

use crate::bind::{bind_params, row_to_record};
use crate::render::{
    ColumnLabels, RenderedQuery, render_count, render_exists, render_select, render_write,
};

/// Pool and metadata shared by a builder chain.
///
/// The metadata is read from the same `InternalContext` a guard validates against, so
/// the objects a guard checked are the tables the rendered SQL touches.
#[derive(Debug, Clone)]
struct PgSession {
    pool: PgPool,
    internal: Arc<InternalContext>,
}

impl PgSession {
    fn metadata(&self) -> &ObjectMetadataMaps {
        &self.internal.object_metadata_maps
    }

    async fn fetch_all(&self, query: RenderedQuery) -> anyhow::Result<Vec<ObjectRecord>> {
        tracing::debug!(sql = %query.sql, params = query.params.len(), "Executing query");
        let args = bind_params(&query.params)?;
        let rows = sqlx::query_with(&query.sql, args)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn fetch_count(&self, query: RenderedQuery) -> anyhow::Result<u64> {
        tracing::debug!(sql = %query.sql, params = query.params.len(), "Executing count");
        let args = bind_params(&query.params)?;
        let row = sqlx::query_with(&query.sql, args)
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get(0)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn fetch_exists(&self, query: RenderedQuery) -> anyhow::Result<bool> {
        tracing::debug!(sql = %query.sql, params = query.params.len(), "Executing exists");
        let args = bind_params(&query.params)?;
        let row = sqlx::query_with(&query.sql, args)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get(0)?)
    }

    async fn execute(&self, query: RenderedQuery) -> anyhow::Result<u64> {
        tracing::debug!(sql = %query.sql, params = query.params.len(), "Executing write");
        let args = bind_params(&query.params)?;
        let result = sqlx::query_with(&query.sql, args)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn push_or(shape: &mut QueryShape, condition: Condition) {
    let previous = std::mem::take(&mut shape.conditions);
    shape.conditions = if previous.is_empty() {
        vec![condition]
    } else {
        vec![Condition::Or(vec![Condition::And(previous), condition])]
    };
}

// =============================================================================
// SELECT
// =============================================================================

/// Select builder over a Postgres pool.
///
/// ```ignore
/// let pool = tessera_adapter_pg::connect(&database_url, 5).await?;
/// let people = PgSelectQueryBuilder::guarded(pool, &context, "person", "person")
///     .and_where(Condition::eq("person.name", "Ada"))
///     .get_many()
///     .await?;
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct PgSelectQueryBuilder {
    session: PgSession,
    shape: QueryShape,
}

impl PgSelectQueryBuilder {
    /// An unguarded select over `object` aliased as `alias`.
    ///
    /// When the builder is later wrapped with `GuardContext::guard`, pass that context's
    /// `internal_context()` here; [`PgSelectQueryBuilder::guarded`] does both.
    pub fn new(
        pool: PgPool,
        internal: Arc<InternalContext>,
        object: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            session: PgSession { pool, internal },
            shape: QueryShape::select_from(object, alias),
        }
    }

    /// A guarded select that renders SQL from the metadata `context` validates against.
    pub fn guarded(
        pool: PgPool,
        context: &GuardContext,
        object: impl Into<String>,
        alias: impl Into<String>,
    ) -> GuardedSelectQueryBuilder<Self> {
        let builder = Self::new(pool, context.internal_context().clone(), object, alias);
        context.guard(builder)
    }

    pub fn internal_context(&self) -> &Arc<InternalContext> {
        &self.session.internal
    }

    fn edit(mut self, f: impl FnOnce(&mut QueryShape)) -> Self {
        f(&mut self.shape);
        self
    }

    fn into_write(self, operation: QueryOperation) -> PgWrite {
        PgWrite {
            session: self.session,
            shape: self.shape.with_operation(operation),
        }
    }

    async fn fetch(
        &self,
        shape: &QueryShape,
        labels: ColumnLabels,
    ) -> Result<Vec<ObjectRecord>, QueryError> {
        let query = render_select(shape, self.session.metadata(), labels)?;
        Ok(self.session.fetch_all(query).await?)
    }

    async fn fetch_first(&self, labels: ColumnLabels) -> Result<Option<ObjectRecord>, QueryError> {
        let mut shape = self.shape.clone();
        shape.take = Some(1);
        Ok(self.fetch(&shape, labels).await?.into_iter().next())
    }
}

impl QueryBuilder for PgSelectQueryBuilder {
    fn shape(&self) -> &QueryShape {
        &self.shape
    }
}

#[async_trait]
impl SelectQueryBuilder for PgSelectQueryBuilder {
    type Insert = PgInsertQueryBuilder;
    type Update = PgUpdateQueryBuilder;
    type Delete = PgDeleteQueryBuilder;
    type SoftDelete = PgSoftDeleteQueryBuilder;

    fn select(self, selection: Vec<Selection>) -> Self {
        self.edit(|s| s.selects = selection)
    }

    fn add_select(self, selection: Selection) -> Self {
        self.edit(|s| s.selects.push(selection))
    }

    fn join(self, join: Join) -> Self {
        self.edit(|s| s.joins.push(join))
    }

    fn and_where(self, condition: Condition) -> Self {
        self.edit(|s| s.conditions.push(condition))
    }

    fn or_where(self, condition: Condition) -> Self {
        self.edit(|s| push_or(s, condition))
    }

    fn order_by(self, field: &str, order: Order) -> Self {
        let field = FieldRef::from(field);
        self.edit(|s| s.order_by.push(OrderBy { field, order }))
    }

    fn take(self, limit: u64) -> Self {
        self.edit(|s| s.take = Some(limit))
    }

    fn skip(self, offset: u64) -> Self {
        self.edit(|s| s.skip = Some(offset))
    }

    fn with_deleted(self) -> Self {
        self.edit(|s| s.with_deleted = true)
    }

    async fn execute(&self) -> Result<Vec<ObjectRecord>, QueryError> {
        self.fetch(&self.shape, ColumnLabels::Fields).await
    }

    async fn get_one(&self) -> Result<Option<ObjectRecord>, QueryError> {
        self.fetch_first(ColumnLabels::Fields).await
    }

    async fn get_one_or_fail(&self) -> Result<ObjectRecord, QueryError> {
        self.get_one().await?.ok_or_else(|| QueryError::EntityNotFound {
            object: self
                .shape
                .main
                .as_ref()
                .map(|m| m.object.clone())
                .unwrap_or_default(),
        })
    }

    async fn get_many(&self) -> Result<Vec<ObjectRecord>, QueryError> {
        self.fetch(&self.shape, ColumnLabels::Fields).await
    }

    async fn get_many_and_count(&self) -> Result<(Vec<ObjectRecord>, u64), QueryError> {
        let records = self.get_many().await?;
        let count = self.get_count().await?;
        Ok((records, count))
    }

    async fn get_raw_one(&self) -> Result<Option<ObjectRecord>, QueryError> {
        self.fetch_first(ColumnLabels::Raw).await
    }

    async fn get_raw_many(&self) -> Result<Vec<ObjectRecord>, QueryError> {
        self.fetch(&self.shape, ColumnLabels::Raw).await
    }

    async fn get_count(&self) -> Result<u64, QueryError> {
        let query = render_count(&self.shape, self.session.metadata())?;
        Ok(self.session.fetch_count(query).await?)
    }

    async fn get_exists(&self) -> Result<bool, QueryError> {
        let query = render_exists(&self.shape, self.session.metadata())?;
        Ok(self.session.fetch_exists(query).await?)
    }

    async fn execute_exists_query(&self) -> Result<bool, QueryError> {
        self.get_exists().await
    }

    fn insert(self) -> PgInsertQueryBuilder {
        PgInsertQueryBuilder(self.into_write(QueryOperation::Insert))
    }

    fn update(self) -> PgUpdateQueryBuilder {
        PgUpdateQueryBuilder(self.into_write(QueryOperation::Update))
    }

    fn update_set(self, values: ObjectRecord) -> PgUpdateQueryBuilder {
        self.update().set(values)
    }

    fn delete(self) -> PgDeleteQueryBuilder {
        PgDeleteQueryBuilder(self.into_write(QueryOperation::Delete))
    }

    fn soft_delete(self) -> PgSoftDeleteQueryBuilder {
        PgSoftDeleteQueryBuilder(self.into_write(QueryOperation::SoftDelete))
    }

    fn restore(self) -> PgSoftDeleteQueryBuilder {
        PgSoftDeleteQueryBuilder(self.into_write(QueryOperation::Restore))
    }
}

// =============================================================================
// WRITES
// =============================================================================

#[derive(Debug, Clone)]
struct PgWrite {
    session: PgSession,
    shape: QueryShape,
}

impl PgWrite {
    fn edit(mut self, f: impl FnOnce(&mut QueryShape)) -> Self {
        f(&mut self.shape);
        self
    }

    async fn execute(&self) -> Result<WriteResult, QueryError> {
        let query = render_write(&self.shape, self.session.metadata())?;
        if self.shape.returning.is_empty() {
            let affected = self.session.execute(query).await?;
            return Ok(WriteResult {
                affected: Some(affected),
                records: Vec::new(),
            });
        }
        let records = self.session.fetch_all(query).await?;
        Ok(WriteResult {
            affected: Some(records.len() as u64),
            records,
        })
    }
}

#[must_use]
#[derive(Debug, Clone)]
pub struct PgInsertQueryBuilder(PgWrite);

#[must_use]
#[derive(Debug, Clone)]
pub struct PgUpdateQueryBuilder(PgWrite);

#[must_use]
#[derive(Debug, Clone)]
pub struct PgDeleteQueryBuilder(PgWrite);

/// Soft-delete or restore, depending on the transition that produced it.
#[must_use]
#[derive(Debug, Clone)]
pub struct PgSoftDeleteQueryBuilder(PgWrite);

impl QueryBuilder for PgInsertQueryBuilder {
    fn shape(&self) -> &QueryShape {
        &self.0.shape
    }
}

impl QueryBuilder for PgUpdateQueryBuilder {
    fn shape(&self) -> &QueryShape {
        &self.0.shape
    }
}

impl QueryBuilder for PgDeleteQueryBuilder {
    fn shape(&self) -> &QueryShape {
        &self.0.shape
    }
}

impl QueryBuilder for PgSoftDeleteQueryBuilder {
    fn shape(&self) -> &QueryShape {
        &self.0.shape
    }
}

#[async_trait]
impl InsertQueryBuilder for PgInsertQueryBuilder {
    fn values(self, rows: Vec<ObjectRecord>) -> Self {
        Self(self.0.edit(|s| s.values = rows))
    }

    fn returning(self, fields: Vec<String>) -> Self {
        Self(self.0.edit(|s| s.returning = fields))
    }

    async fn execute(&self) -> Result<WriteResult, QueryError> {
        self.0.execute().await
    }
}

#[async_trait]
impl UpdateQueryBuilder for PgUpdateQueryBuilder {
    fn set(self, values: ObjectRecord) -> Self {
        Self(self.0.edit(|s| s.values = vec![values]))
    }

    fn and_where(self, condition: Condition) -> Self {
        Self(self.0.edit(|s| s.conditions.push(condition)))
    }

    fn or_where(self, condition: Condition) -> Self {
        Self(self.0.edit(|s| push_or(s, condition)))
    }

    fn returning(self, fields: Vec<String>) -> Self {
        Self(self.0.edit(|s| s.returning = fields))
    }

    async fn execute(&self) -> Result<WriteResult, QueryError> {
        self.0.execute().await
    }
}

#[async_trait]
impl DeleteQueryBuilder for PgDeleteQueryBuilder {
    fn and_where(self, condition: Condition) -> Self {
        Self(self.0.edit(|s| s.conditions.push(condition)))
    }

    fn or_where(self, condition: Condition) -> Self {
        Self(self.0.edit(|s| push_or(s, condition)))
    }

    fn returning(self, fields: Vec<String>) -> Self {
        Self(self.0.edit(|s| s.returning = fields))
    }

    async fn execute(&self) -> Result<WriteResult, QueryError> {
        self.0.execute().await
    }
}

#[async_trait]
impl SoftDeleteQueryBuilder for PgSoftDeleteQueryBuilder {
    fn and_where(self, condition: Condition) -> Self {
        Self(self.0.edit(|s| s.conditions.push(condition)))
    }

    fn or_where(self, condition: Condition) -> Self {
        Self(self.0.edit(|s| push_or(s, condition)))
    }

    fn returning(self, fields: Vec<String>) -> Self {
        Self(self.0.edit(|s| s.returning = fields))
    }

    async fn execute(&self) -> Result<WriteResult, QueryError> {
        self.0.execute().await
    }
}
