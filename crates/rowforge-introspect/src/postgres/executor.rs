//! Batched INSERT execution against a live PostgreSQL connection.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use tracing::debug;

use rowforge_core::TypeTag;
use rowforge_fill::{ExecutorError, InsertStatement, SqlExecutor, StatementHandle, Value};

/// `SqlExecutor` backed by a sqlx pool.
///
/// Each flush becomes one multi-row INSERT; with the default batch size
/// and typical column counts this stays well under the backend's 65535
/// parameter ceiling.
pub struct PgFillExecutor {
    pool: PgPool,
    statements: HashMap<StatementHandle, InsertStatement>,
    next_handle: u64,
}

impl PgFillExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            statements: HashMap::new(),
            next_handle: 0,
        }
    }
}

#[async_trait]
impl SqlExecutor for PgFillExecutor {
    async fn prepare(
        &mut self,
        statement: &InsertStatement,
    ) -> Result<StatementHandle, ExecutorError> {
        let handle = StatementHandle(self.next_handle);
        self.next_handle += 1;
        self.statements.insert(handle, statement.clone());
        debug!(table = %statement.table, sql = %statement.sql, "statement prepared");
        Ok(handle)
    }

    async fn execute_batch(
        &mut self,
        handle: StatementHandle,
        rows: &[Vec<Value>],
    ) -> Result<u64, ExecutorError> {
        let statement = self
            .statements
            .get(&handle)
            .ok_or_else(|| ExecutorError("unknown statement handle".to_string()))?;
        if rows.is_empty() {
            return Ok(0);
        }

        let sql = multi_row_sql(statement, rows.len());
        let mut query = sqlx::query(&sql);
        for row in rows {
            for (value, column) in row.iter().zip(&statement.columns) {
                query = bind_value(query, value, column.type_tag);
            }
        }

        let outcome = query
            .execute(&self.pool)
            .await
            .map_err(|err| ExecutorError(err.to_string()))?;
        Ok(outcome.rows_affected())
    }
}

fn multi_row_sql(statement: &InsertStatement, row_count: usize) -> String {
    let names: Vec<&str> = statement
        .columns
        .iter()
        .map(|column| column.name.as_str())
        .collect();
    let mut parameter = 0;
    let tuples: Vec<String> = (0..row_count)
        .map(|_| {
            let slots: Vec<String> = (0..statement.columns.len())
                .map(|_| {
                    parameter += 1;
                    format!("${parameter}")
                })
                .collect();
            format!("({})", slots.join(", "))
        })
        .collect();
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        statement.table,
        names.join(", "),
        tuples.join(", ")
    )
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
    tag: TypeTag,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        // NULL still carries the parameter's type, so pick one that fits
        // the target column.
        Value::Null => match tag {
            TypeTag::SmallInt | TypeTag::Integer | TypeTag::BigInt => query.bind(None::<i64>),
            TypeTag::Real | TypeTag::Double | TypeTag::Decimal => query.bind(None::<f64>),
            TypeTag::Boolean => query.bind(None::<bool>),
            TypeTag::Date => query.bind(None::<NaiveDate>),
            TypeTag::Time => query.bind(None::<NaiveTime>),
            TypeTag::Timestamp => query.bind(None::<NaiveDateTime>),
            TypeTag::TimestampTz => query.bind(None::<DateTime<Utc>>),
            TypeTag::Binary | TypeTag::VarBinary | TypeTag::Blob => query.bind(None::<Vec<u8>>),
            _ => query.bind(None::<String>),
        },
        Value::Bool(value) => query.bind(*value),
        Value::Int(value) => query.bind(*value),
        Value::Float(value) => query.bind(*value),
        Value::Decimal(text) => query.bind(text.parse::<f64>().unwrap_or_default()),
        Value::Text(text) => query.bind(text.clone()),
        Value::Uuid(text) => {
            query.bind(uuid::Uuid::parse_str(text).unwrap_or_else(|_| uuid::Uuid::nil()))
        }
        Value::Bytes(bytes) => query.bind(bytes.clone()),
        Value::Date(value) => query.bind(*value),
        Value::Time(value) => query.bind(*value),
        Value::Timestamp(value) => query.bind(*value),
        Value::TimestampTz(value) => query.bind(*value),
        Value::Json(value) => query.bind(value.clone()),
        Value::TextArray(items) => query.bind(items.clone()),
        Value::IntArray(items) => query.bind(items.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowforge_fill::InsertColumn;

    #[test]
    fn multi_row_sql_numbers_parameters_across_rows() {
        let statement = InsertStatement {
            table: "orders".to_string(),
            sql: "INSERT INTO orders (id, customer_id) VALUES ($1, $2)".to_string(),
            columns: vec![
                InsertColumn {
                    name: "id".to_string(),
                    type_tag: TypeTag::Integer,
                },
                InsertColumn {
                    name: "customer_id".to_string(),
                    type_tag: TypeTag::Integer,
                },
            ],
        };
        let sql = multi_row_sql(&statement, 3);
        assert_eq!(
            sql,
            "INSERT INTO orders (id, customer_id) VALUES ($1, $2), ($3, $4), ($5, $6)"
        );
    }

    #[test]
    fn single_row_matches_the_prepared_shape() {
        let statement = InsertStatement {
            table: "items".to_string(),
            sql: "INSERT INTO items (id) VALUES ($1)".to_string(),
            columns: vec![InsertColumn {
                name: "id".to_string(),
                type_tag: TypeTag::Integer,
            }],
        };
        assert_eq!(multi_row_sql(&statement, 1), statement.sql);
    }
}
