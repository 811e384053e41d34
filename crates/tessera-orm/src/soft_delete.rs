//! Guarded soft-delete / restore builder.
//!
//! Soft-delete and restore share one variant: both only flip the soft-delete marker of
//! matching rows, and both require the `soft_delete` capability. The operation recorded
//! in the query shape tells them apart.

use async_trait::async_trait;
use tessera_policy::{Condition, QueryShape};

use crate::builder::{QueryBuilder, SoftDeleteQueryBuilder, WriteResult};
use crate::context::GuardContext;
use crate::error::QueryError;

#[must_use]
#[derive(Debug, Clone)]
pub struct GuardedSoftDeleteQueryBuilder<B> {
    inner: B,
    context: GuardContext,
}

impl<B: SoftDeleteQueryBuilder> GuardedSoftDeleteQueryBuilder<B> {
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

impl<B: SoftDeleteQueryBuilder> QueryBuilder for GuardedSoftDeleteQueryBuilder<B> {
    fn shape(&self) -> &QueryShape {
        self.inner.shape()
    }
}

#[async_trait]
impl<B: SoftDeleteQueryBuilder> SoftDeleteQueryBuilder for GuardedSoftDeleteQueryBuilder<B> {
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
