use thiserror::Error;

/// Errors raised while introspecting a live catalog.
#[derive(Debug, Error)]
pub enum IntrospectError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("schema error: {0}")]
    Schema(#[from] rowforge_core::SchemaError),
}

pub type Result<T> = std::result::Result<T, IntrospectError>;
