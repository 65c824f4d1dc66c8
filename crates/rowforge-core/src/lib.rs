//! Core contracts and helpers for Rowforge.
//!
//! This crate defines the canonical schema graph consumed by the fill
//! engine: tables, columns, keys, the deterministic key streams attached to
//! key columns, and the foreign-key dependency graph.

pub mod error;
pub mod graph;
pub mod keys;
pub mod schema;

pub use error::{Result, SchemaError};
pub use graph::{FkGraphReport, FkGraphSummary, build_fk_graph_report};
pub use keys::{ForeignKey, KeyColumn, KeyStream, PrimaryKey};
pub use schema::{Column, ColumnId, Database, Table, TypeTag};
