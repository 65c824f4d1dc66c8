//! Database adapters for Rowforge: catalog introspection into the core
//! schema graph, and the live SQL execution seam for batched inserts.

pub mod error;
pub mod options;
pub mod postgres;
pub mod provider;

pub use error::{IntrospectError, Result};
pub use options::IntrospectOptions;
pub use postgres::{PgFillExecutor, PostgresProvider, introspect_postgres};
pub use provider::MetadataProvider;

pub use rowforge_core::Database;
