//! Guarded update builder.

use async_trait::async_trait;
use tessera_core::ObjectRecord;
use tessera_policy::{Condition, QueryShape};

use crate::builder::{QueryBuilder, UpdateQueryBuilder, WriteResult};
use crate::context::GuardContext;
use crate::error::QueryError;

/// An update builder validated against the `update` capability and the field
/// restrictions of its value set before execution.
#[must_use]
#[derive(Debug, Clone)]
pub struct GuardedUpdateQueryBuilder<B> {
    inner: B,
    context: GuardContext,
}

impl<B: UpdateQueryBuilder> GuardedUpdateQueryBuilder<B> {
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

impl<B: UpdateQueryBuilder> QueryBuilder for GuardedUpdateQueryBuilder<B> {
    fn shape(&self) -> &QueryShape {
        self.inner.shape()
    }
}

#[async_trait]
impl<B: UpdateQueryBuilder> UpdateQueryBuilder for GuardedUpdateQueryBuilder<B> {
    fn set(self, values: ObjectRecord) -> Self {
        self.map(|b| b.set(values))
    }

    fn and_where(self, condition: Condition) -> Self {
        self.map(|b| b.and_where(condition))
    }

    fn or_where(self, condition: Condition) -> Self {
        self.map(|b| b.or_where(condition))
    }

    fn returning(self, fields: Vec<String>) -> Self {
        self.map(|b| b.returning(fields))
    }

    async fn execute(&self) -> Result<WriteResult, QueryError> {
        self.context.validate(self.inner.shape())?;
        self.inner.execute().await
    }
}
