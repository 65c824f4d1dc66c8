use async_trait::async_trait;

use rowforge_core::Database;

use crate::error::Result;
use crate::options::IntrospectOptions;

/// Trait implemented by backends that can read a catalog into the schema
/// graph.
///
/// Implementations must return columns ordered by ordinal position and key
/// columns ordered by sequence; the fill engine depends on both.
#[async_trait]
pub trait MetadataProvider {
    /// Backend identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Read the catalog and build the schema graph.
    async fn schema(&self, opts: &IntrospectOptions) -> Result<Database>;
}
