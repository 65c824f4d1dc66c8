use thiserror::Error;

/// Errors raised while assembling or validating a schema graph.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Two tables share a name (compared case-insensitively).
    #[error("duplicate table name '{0}'")]
    DuplicateTable(String),
    /// A key references a column absent from its table's column list.
    #[error("key column '{column}' not found in table '{table}'")]
    UnknownKeyColumn { table: String, column: String },
    /// A foreign key pairs an unequal number of referencing and referenced columns.
    #[error(
        "foreign key on '{table}' pairs {referencing} referencing column(s) with {referenced} referenced column(s)"
    )]
    KeyArityMismatch {
        table: String,
        referencing: usize,
        referenced: usize,
    },
}

/// Convenience alias for results returned by Rowforge crates.
pub type Result<T> = std::result::Result<T, SchemaError>;
