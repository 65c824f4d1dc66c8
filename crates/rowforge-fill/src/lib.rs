//! Referential-integrity-preserving fill engine for Rowforge.
//!
//! Fills a schema graph with deterministic synthetic rows. Foreign-key
//! columns replay the seeded stream of the primary key they (transitively)
//! reference, so every generated reference lands on a row the parent table
//! contains, without ever querying inserted data back.

pub mod batch;
pub mod config;
pub mod engine;
pub mod errors;
pub mod filler;
pub mod fixtures;
pub mod generators;
pub mod output;
pub mod planner;
pub mod registry;
pub mod resolver;
pub mod testing;
pub mod value;

pub use batch::{
    BatchExecutor, BatchStats, InsertColumn, InsertStatement, SqlExecutor, StatementHandle,
};
pub use config::{DEFAULT_BATCH_SIZE, FillConfig, GeneratorSpec, TableFillConfig};
pub use engine::{FillEngine, FillReport, TableFillReport};
pub use errors::{ExecutorError, FillError};
pub use filler::{TableFillParams, TableFiller};
pub use generators::{BoxedGenerator, ValueGenerator};
pub use output::{FileFormat, FlatFileWriter};
pub use planner::{FillTask, plan};
pub use registry::{Dialect, GeneratorFactory, GeneratorRegistry, PlaceholderStyle};
pub use resolver::{KeyReplay, RootColumn, resolve_root};
pub use value::Value;
