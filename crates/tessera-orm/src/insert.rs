//! Guarded insert builder.

use async_trait::async_trait;
use tessera_core::ObjectRecord;
use tessera_policy::QueryShape;

use crate::builder::{InsertQueryBuilder, QueryBuilder, WriteResult};
use crate::context::GuardContext;
use crate::error::QueryError;

/// An insert builder validated against the `create` capability before execution.
#[must_use]
#[derive(Debug, Clone)]
pub struct GuardedInsertQueryBuilder<B> {
    inner: B,
    context: GuardContext,
}

impl<B: InsertQueryBuilder> GuardedInsertQueryBuilder<B> {
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
}

impl<B: InsertQueryBuilder> QueryBuilder for GuardedInsertQueryBuilder<B> {
    fn shape(&self) -> &QueryShape {
        self.inner.shape()
    }
}

#[async_trait]
impl<B: InsertQueryBuilder> InsertQueryBuilder for GuardedInsertQueryBuilder<B> {
    fn values(self, rows: Vec<ObjectRecord>) -> Self {
        self.map(|b| b.values(rows))
    }

    fn returning(self, fields: Vec<String>) -> Self {
        self.map(|b| b.returning(fields))
    }

    async fn execute(&self) -> Result<WriteResult, QueryError> {
        self.context.validate(self.inner.shape())?;
        self.inner.execute().await
    }
}
