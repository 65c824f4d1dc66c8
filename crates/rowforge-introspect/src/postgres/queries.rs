//! Raw catalog reads. Plain runtime queries so no live database is needed
//! at build time.

use sqlx::{FromRow, PgPool};

use crate::error::Result;

pub async fn fetch_database_name(pool: &PgPool) -> Result<String> {
    let name = sqlx::query_scalar::<_, String>("select current_database()")
        .fetch_one(pool)
        .await?;
    Ok(name)
}

pub async fn list_tables(pool: &PgPool, schema: &str) -> Result<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>(
        r#"
        select table_name
        from information_schema.tables
        where table_schema = $1
          and table_type = 'BASE TABLE'
        order by table_name
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await?;
    Ok(names)
}

#[derive(Debug, FromRow)]
pub struct RawColumn {
    pub ordinal_position: i32,
    pub column_name: String,
    pub data_type: String,
    pub udt_name: String,
    pub character_maximum_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
    pub is_nullable: String,
    pub column_default: Option<String>,
    pub is_identity: String,
}

pub async fn list_columns(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<RawColumn>> {
    let rows = sqlx::query_as::<_, RawColumn>(
        r#"
        select ordinal_position::int4 as ordinal_position,
               column_name,
               data_type,
               udt_name,
               character_maximum_length::int4 as character_maximum_length,
               numeric_precision::int4 as numeric_precision,
               numeric_scale::int4 as numeric_scale,
               is_nullable,
               column_default,
               is_identity
        from information_schema.columns
        where table_schema = $1
          and table_name = $2
        order by ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[derive(Debug, FromRow)]
pub struct RawKeyColumn {
    pub column_name: String,
    pub ordinal_position: i32,
}

pub async fn primary_key_columns(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<Vec<RawKeyColumn>> {
    let rows = sqlx::query_as::<_, RawKeyColumn>(
        r#"
        select kcu.column_name,
               kcu.ordinal_position::int4 as ordinal_position
        from information_schema.table_constraints tc
        join information_schema.key_column_usage kcu
          on kcu.constraint_name = tc.constraint_name
         and kcu.constraint_schema = tc.constraint_schema
        where tc.table_schema = $1
          and tc.table_name = $2
          and tc.constraint_type = 'PRIMARY KEY'
        order by kcu.ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[derive(Debug, FromRow)]
pub struct RawForeignKeyColumn {
    pub constraint_name: String,
    pub column_name: String,
    pub ordinal_position: i32,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Referencing and referenced columns paired positionally via
/// `position_in_unique_constraint`, ordered so composite keys come back in
/// sequence.
pub async fn foreign_key_columns(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<Vec<RawForeignKeyColumn>> {
    let rows = sqlx::query_as::<_, RawForeignKeyColumn>(
        r#"
        select rc.constraint_name,
               kcu.column_name,
               kcu.ordinal_position::int4 as ordinal_position,
               rkcu.table_name as referenced_table,
               rkcu.column_name as referenced_column
        from information_schema.referential_constraints rc
        join information_schema.key_column_usage kcu
          on kcu.constraint_name = rc.constraint_name
         and kcu.constraint_schema = rc.constraint_schema
        join information_schema.key_column_usage rkcu
          on rkcu.constraint_name = rc.unique_constraint_name
         and rkcu.constraint_schema = rc.unique_constraint_schema
         and rkcu.ordinal_position = kcu.position_in_unique_constraint
        where kcu.table_schema = $1
          and kcu.table_name = $2
        order by rc.constraint_name, kcu.ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
