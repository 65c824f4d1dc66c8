use async_trait::async_trait;
use sqlx::PgPool;

use rowforge_core::Database;

use crate::error::Result;
use crate::options::IntrospectOptions;
use crate::provider::MetadataProvider;

mod executor;
mod mapper;
mod queries;

pub use executor::PgFillExecutor;

/// Metadata provider for PostgreSQL (and wire-compatible backends).
#[derive(Debug, Clone)]
pub struct PostgresProvider {
    pool: PgPool,
}

impl PostgresProvider {
    /// Create a provider using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataProvider for PostgresProvider {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn schema(&self, opts: &IntrospectOptions) -> Result<Database> {
        introspect(&self.pool, opts).await
    }
}

/// Introspect with default options.
pub async fn introspect_postgres(pool: &PgPool) -> Result<Database> {
    introspect(pool, &IntrospectOptions::default()).await
}

async fn introspect(pool: &PgPool, opts: &IntrospectOptions) -> Result<Database> {
    let catalog = match &opts.catalog {
        Some(catalog) => catalog.clone(),
        None => queries::fetch_database_name(pool).await?,
    };

    let mut raw_tables = Vec::new();
    for table in queries::list_tables(pool, &opts.schema).await? {
        let columns = queries::list_columns(pool, &opts.schema, &table).await?;
        let primary_key = queries::primary_key_columns(pool, &opts.schema, &table).await?;
        let foreign_keys = queries::foreign_key_columns(pool, &opts.schema, &table).await?;
        raw_tables.push(mapper::RawTable {
            name: table,
            columns,
            primary_key,
            foreign_keys,
        });
    }

    mapper::assemble(&catalog, &opts.schema, raw_tables)
}
