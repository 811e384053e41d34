//! Postgres query builders for Tessera.
//!
//! [`PgSelectQueryBuilder`] and its write variants implement the `tessera-orm` builder
//! traits over a `sqlx` pool. They perform no permission checks of their own; wrap them
//! with `GuardContext::guard` before handing them to untrusted callers.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

mod bind;
pub mod builder;
pub mod render;

pub use builder::{
    PgDeleteQueryBuilder, PgInsertQueryBuilder, PgSelectQueryBuilder, PgSoftDeleteQueryBuilder,
    PgUpdateQueryBuilder,
};
pub use render::{ColumnLabels, RenderedQuery};

/// Open a connection pool.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    tracing::info!(max_connections, "Connected to Postgres");
    Ok(pool)
}
