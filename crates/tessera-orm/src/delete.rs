//! Guarded hard-delete builder.

use async_trait::async_trait;
use tessera_policy::{Condition, QueryShape};

use crate::builder::{DeleteQueryBuilder, QueryBuilder, WriteResult};
use crate::context::GuardContext;
use crate::error::QueryError;

/// A hard-delete builder validated against the `destroy` capability before execution.
#[must_use]
#[derive(Debug, Clone)]
pub struct GuardedDeleteQueryBuilder<B> {
    inner: B,
    context: GuardContext,
}

impl<B: DeleteQueryBuilder> GuardedDeleteQueryBuilder<B> {
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

impl<B: DeleteQueryBuilder> QueryBuilder for GuardedDeleteQueryBuilder<B> {
    fn shape(&self) -> &QueryShape {
        self.inner.shape()
    }
}

#[async_trait]
impl<B: DeleteQueryBuilder> DeleteQueryBuilder for GuardedDeleteQueryBuilder<B> {
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
