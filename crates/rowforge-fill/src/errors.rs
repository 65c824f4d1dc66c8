use thiserror::Error;

/// Failure reported by an external SQL executor on flush.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ExecutorError(pub String);

/// Errors emitted by the fill engine.
///
/// Every variant is fatal for at least the current table's fill; nothing in
/// the engine retries. Already-flushed batches are never undone here, that
/// belongs to the caller's transaction boundary.
#[derive(Debug, Error)]
pub enum FillError {
    /// No generator is mapped for an abstract type, or a dialect-specific
    /// type name under the `ARRAY`/`OTHER` buckets is unrecognized.
    #[error("unsupported type '{type_name}' for column '{column}'")]
    UnsupportedType { column: String, type_name: String },
    /// Foreign keys form a reference cycle across tables.
    #[error("cyclic foreign key reference: {path}")]
    CyclicReference { path: String },
    /// A configured override or key reference names a column the schema
    /// graph does not contain.
    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },
    /// A configured generator id is not registered.
    #[error("unknown generator id '{id}'")]
    UnknownGenerator { id: String },
    #[error("invalid fill configuration: {0}")]
    InvalidConfig(String),
    /// The external executor rejected a flush. Carries the row range of the
    /// failed batch; earlier batches of the same table stay flushed.
    #[error("batch execution failed for table '{table}' rows {first_row}..={last_row}: {source}")]
    BatchExecution {
        table: String,
        first_row: u64,
        last_row: u64,
        #[source]
        source: ExecutorError,
    },
    #[error("schema error: {0}")]
    Schema(#[from] rowforge_core::SchemaError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
