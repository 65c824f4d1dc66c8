use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::FillError;
use crate::fixtures;
use crate::generators::{
    BoxedGenerator, FixedGenerator, IntGenerator, IntRange, Sequence, SequentialGenerator,
};
use crate::value::Value;

/// Default rows per flush when a table does not set its own batch size.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Declarative generator override for one column.
///
/// Declarative rather than a boxed generator so the same override can be
/// instantiated again when a key stream rewinds during replay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorSpec {
    /// The same string literal for every row.
    FixedText { text: String },
    /// The same integer for every row.
    FixedInt { value: i64 },
    /// Uniform integer in `min..=max`.
    IntRange { min: i64, max: i64 },
    /// Monotonic counter from `start`, wrapping after `max`.
    Sequential { start: i64, max: i64 },
    /// A named generator from the fixture registry, e.g. `tpcc.last_name`.
    Fixture { id: String },
}

impl GeneratorSpec {
    pub fn instantiate(&self) -> Result<BoxedGenerator, FillError> {
        match self {
            GeneratorSpec::FixedText { text } => {
                Ok(Box::new(FixedGenerator::new(Value::Text(text.clone()))))
            }
            GeneratorSpec::FixedInt { value } => {
                Ok(Box::new(FixedGenerator::new(Value::Int(*value))))
            }
            GeneratorSpec::IntRange { min, max } => {
                if min > max {
                    return Err(FillError::InvalidConfig(format!(
                        "int_range min {min} exceeds max {max}"
                    )));
                }
                Ok(Box::new(IntGenerator::new(IntRange {
                    min: *min,
                    max: *max,
                })))
            }
            GeneratorSpec::Sequential { start, max } => {
                if start > max {
                    return Err(FillError::InvalidConfig(format!(
                        "sequential start {start} exceeds max {max}"
                    )));
                }
                Ok(Box::new(SequentialGenerator::new(Sequence {
                    start: *start,
                    max: *max,
                })))
            }
            GeneratorSpec::Fixture { id } => fixtures::generator(id),
        }
    }
}

/// Per-table fill settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFillConfig {
    pub rows: u64,
    /// Overrides the global batch size for this table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    /// Column-name → generator override. Always wins over type dispatch.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub columns: BTreeMap<String, GeneratorSpec>,
    /// Fill auto-increment columns instead of leaving them to the database.
    #[serde(default)]
    pub include_auto_increment: bool,
}

/// Fill configuration for a whole run, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillConfig {
    #[serde(default = "default_dialect")]
    pub dialect: String,
    /// Mixed into every column's stream seed. Zero keeps identity-only
    /// seeding.
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub tables: BTreeMap<String, TableFillConfig>,
}

fn default_dialect() -> String {
    "postgres".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            dialect: default_dialect(),
            seed: 0,
            batch_size: default_batch_size(),
            tables: BTreeMap::new(),
        }
    }
}

impl FillConfig {
    pub fn table(&self, name: &str) -> Option<&TableFillConfig> {
        self.tables
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, table)| table)
    }

    pub fn rows_for(&self, name: &str) -> Option<u64> {
        self.table(name).map(|table| table.rows)
    }

    pub fn batch_size_for(&self, name: &str) -> usize {
        self.table(name)
            .and_then(|table| table.batch_size)
            .unwrap_or(self.batch_size)
    }

    pub fn override_for(&self, table: &str, column: &str) -> Option<&GeneratorSpec> {
        self.table(table).and_then(|table| {
            table
                .columns
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(column))
                .map(|(_, spec)| spec)
        })
    }

    pub fn include_auto_increment(&self, table: &str) -> bool {
        self.table(table)
            .map(|table| table.include_auto_increment)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_toml_document() {
        let text = r#"
dialect = "postgres"
seed = 7
batch_size = 128

[tables.customer]
rows = 3000

[tables.customer.columns.c_last]
kind = "fixture"
id = "tpcc.last_name"

[tables.orders]
rows = 300
batch_size = 64
"#;
        let config: FillConfig = toml::from_str(text).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.rows_for("customer"), Some(3000));
        assert_eq!(config.batch_size_for("customer"), 128);
        assert_eq!(config.batch_size_for("orders"), 64);
        assert_eq!(
            config.override_for("customer", "C_LAST"),
            Some(&GeneratorSpec::Fixture {
                id: "tpcc.last_name".to_string()
            })
        );
    }

    #[test]
    fn invalid_ranges_are_rejected_at_instantiation() {
        let spec = GeneratorSpec::IntRange { min: 9, max: 1 };
        assert!(matches!(
            spec.instantiate(),
            Err(FillError::InvalidConfig(_))
        ));
    }
}
