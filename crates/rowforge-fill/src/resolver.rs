//! Root-key resolution and seeded-stream replay.
//!
//! A foreign-key column never owns a generator. Its values replay the
//! stream of the root primary-key column at the end of the reference
//! chain: same seed, same generator algorithm, indexed modulo the parent's
//! row count. The i-th child value is therefore bit-for-bit the value the
//! parent draws (or will draw) at index `i mod parent_rows`, without ever
//! reading inserted data back.

use std::collections::HashSet;

use rowforge_core::{Column, Database, KeyStream, Table, TypeTag};

use crate::config::{FillConfig, GeneratorSpec};
use crate::errors::FillError;
use crate::generators::BoxedGenerator;
use crate::registry::{Dialect, GeneratorFactory, GeneratorRegistry};
use crate::value::Value;

/// The primary-key column a foreign-key chain terminates at.
#[derive(Debug, Clone, Copy)]
pub struct RootColumn<'a> {
    pub table: &'a Table,
    pub column: &'a Column,
}

/// Walk a column's foreign-key chain to its root primary-key column.
///
/// Returns `None` when the column participates in no foreign key. The walk
/// recurses while the referenced column is itself a foreign key in its own
/// table and stops at the first one that is not. Revisiting a column means
/// the graph is cyclic and resolution fails before any insert happens.
pub fn resolve_root<'a>(
    database: &'a Database,
    table: &'a Table,
    column_name: &str,
) -> Result<Option<RootColumn<'a>>, FillError> {
    if table.foreign_key_for(column_name).is_none() {
        return Ok(None);
    }

    let mut current_table = table;
    let mut current_column = column_name.to_lowercase();
    let mut seen = HashSet::new();
    let mut path = Vec::new();

    loop {
        let column = current_table.column(&current_column).ok_or_else(|| {
            FillError::ColumnNotFound {
                table: current_table.name().to_string(),
                column: current_column.clone(),
            }
        })?;

        path.push(column.id().to_string());
        if !seen.insert(column.id().clone()) {
            return Err(FillError::CyclicReference {
                path: path.join(" -> "),
            });
        }

        let Some(fk) = current_table.foreign_key_for(&current_column) else {
            return Ok(Some(RootColumn {
                table: current_table,
                column,
            }));
        };

        let referenced = fk.referenced_for(&current_column).ok_or_else(|| {
            FillError::ColumnNotFound {
                table: fk.references().table().to_string(),
                column: current_column.clone(),
            }
        })?;
        let parent = database.table(fk.references().table()).ok_or_else(|| {
            FillError::ColumnNotFound {
                table: fk.references().table().to_string(),
                column: referenced.column().name().to_string(),
            }
        })?;

        current_table = parent;
        current_column = referenced.column().name().to_string();
    }
}

/// How a replay rebuilds its generator after a rewind. Factories are plain
/// function pointers and specs are declarative, so a fresh generator with
/// pristine state is always available.
#[derive(Debug)]
pub(crate) enum ReplaySource {
    Factory {
        factory: GeneratorFactory,
        column: Column,
    },
    Spec(GeneratorSpec),
}

impl ReplaySource {
    pub(crate) fn instantiate(&self) -> Result<BoxedGenerator, FillError> {
        match self {
            ReplaySource::Factory { factory, column } => factory(column),
            ReplaySource::Spec(spec) => spec.instantiate(),
        }
    }
}

/// Pick the generator source for a key column so that the owning table's
/// fill and every replaying child agree on the algorithm: a configured
/// override first, a sequential surrogate for auto-increment keys, the
/// type-dispatched generator otherwise.
pub(crate) fn key_source(
    column: &Column,
    config: &FillConfig,
    registry: &GeneratorRegistry,
    dialect: &Dialect,
) -> Result<ReplaySource, FillError> {
    if let Some(spec) = config.override_for(column.id().table(), column.name()) {
        return Ok(ReplaySource::Spec(spec.clone()));
    }
    if column.auto_increment {
        let max = match column.type_tag {
            TypeTag::SmallInt => i64::from(i16::MAX),
            TypeTag::Integer => i64::from(i32::MAX),
            _ => i64::MAX,
        };
        return Ok(ReplaySource::Spec(GeneratorSpec::Sequential {
            start: 1,
            max,
        }));
    }
    Ok(ReplaySource::Factory {
        factory: registry.factory_for(column, dialect)?,
        column: column.clone(),
    })
}

/// A cursor over a root column's value stream.
///
/// `value_at(i)` yields the value at `i mod modulus`. Indices are expected
/// mostly in order; when the target falls behind the cursor the stream
/// rewinds to its initial state and the generator is rebuilt, replaying
/// the identical sequence.
#[derive(Debug)]
pub struct KeyReplay {
    stream: KeyStream,
    generator: BoxedGenerator,
    source: ReplaySource,
    modulus: u64,
    last: Option<Value>,
}

impl KeyReplay {
    pub(crate) fn new(seed: u64, source: ReplaySource, modulus: u64) -> Result<Self, FillError> {
        if modulus == 0 {
            return Err(FillError::InvalidConfig(
                "referenced table has a row count of zero".to_string(),
            ));
        }
        let generator = source.instantiate()?;
        Ok(Self {
            stream: KeyStream::new(seed),
            generator,
            source,
            modulus,
            last: None,
        })
    }

    /// Build a replay for a resolved root column, honoring the root
    /// table's own overrides so parent and child draw the same values.
    pub fn for_root(
        root: RootColumn<'_>,
        parent_rows: u64,
        config: &FillConfig,
        registry: &GeneratorRegistry,
        dialect: &Dialect,
    ) -> Result<Self, FillError> {
        let source = key_source(root.column, config, registry, dialect)?;
        Self::new(root.column.id().seed() ^ config.seed, source, parent_rows)
    }

    fn rewind(&mut self) -> Result<(), FillError> {
        self.stream.reset();
        self.generator = self.source.instantiate()?;
        self.last = None;
        Ok(())
    }

    pub fn value_at(&mut self, index: u64) -> Result<Value, FillError> {
        let target = index % self.modulus;
        if self.stream.cursor() > target + 1 {
            self.rewind()?;
        }
        if self.stream.cursor() == target + 1 {
            if let Some(value) = &self.last {
                return Ok(value.clone());
            }
            self.rewind()?;
        }
        let mut value = Value::Null;
        while self.stream.cursor() <= target {
            let stream = &mut self.stream;
            let generator = &mut self.generator;
            value = stream.draw(|rng| generator.generate(rng));
        }
        self.last = Some(value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowforge_core::{ColumnId, ForeignKey, KeyColumn, PrimaryKey};

    fn column(table: &str, name: &str, ordinal: i16) -> Column {
        Column::new(
            ColumnId::new("bench", "public", table, name),
            TypeTag::Integer,
            "int4",
            ordinal,
        )
    }

    fn pk(table: &str, name: &str) -> PrimaryKey {
        PrimaryKey::new(table, vec![KeyColumn::new(column(table, name, 1), 1)])
    }

    /// C <- B <- A: `a.b_id` references `b.id`, which references `c.id`.
    fn chained_database() -> Database {
        let c = Table::new("c", vec![column("c", "id", 1)], Some(pk("c", "id")), Vec::new())
            .unwrap();

        let b_fk = ForeignKey::new(
            vec![KeyColumn::new(column("b", "id", 1), 1)],
            pk("c", "id"),
        );
        let b = Table::new("b", vec![column("b", "id", 1)], Some(pk("b", "id")), vec![b_fk])
            .unwrap();

        let a_fk = ForeignKey::new(
            vec![KeyColumn::new(column("a", "b_id", 2), 1)],
            pk("b", "id"),
        );
        let a = Table::new(
            "a",
            vec![column("a", "id", 1), column("a", "b_id", 2)],
            Some(pk("a", "id")),
            vec![a_fk],
        )
        .unwrap();

        Database::new("bench", "public", vec![a, b, c]).unwrap()
    }

    #[test]
    fn non_key_columns_resolve_to_none() {
        let database = chained_database();
        let table = database.table("c").unwrap();
        assert!(resolve_root(&database, table, "id").unwrap().is_none());
    }

    #[test]
    fn chains_resolve_to_the_final_root() {
        let database = chained_database();
        let table = database.table("a").unwrap();
        let root = resolve_root(&database, table, "b_id").unwrap().unwrap();
        assert_eq!(root.table.name(), "c");
        assert_eq!(root.column.name(), "id");
    }

    #[test]
    fn mutual_references_fail_with_a_cycle() {
        let x_fk = ForeignKey::new(
            vec![KeyColumn::new(column("x", "id", 1), 1)],
            pk("y", "id"),
        );
        let x = Table::new("x", vec![column("x", "id", 1)], Some(pk("x", "id")), vec![x_fk])
            .unwrap();
        let y_fk = ForeignKey::new(
            vec![KeyColumn::new(column("y", "id", 1), 1)],
            pk("x", "id"),
        );
        let y = Table::new("y", vec![column("y", "id", 1)], Some(pk("y", "id")), vec![y_fk])
            .unwrap();
        let database = Database::new("bench", "public", vec![x, y]).unwrap();

        let table = database.table("x").unwrap();
        let err = resolve_root(&database, table, "id").unwrap_err();
        assert!(matches!(err, FillError::CyclicReference { .. }));
    }

    #[test]
    fn replay_wraps_modulo_the_parent_rows() {
        let config = FillConfig::default();
        let registry = GeneratorRegistry::new();
        let dialect = Dialect::postgres();
        let database = chained_database();
        let table = database.table("c").unwrap();
        let root = RootColumn {
            table,
            column: table.column("id").unwrap(),
        };

        let mut parent =
            KeyReplay::for_root(root, 5, &config, &registry, &dialect).unwrap();
        let parent_values: Vec<Value> = (0..5).map(|i| parent.value_at(i).unwrap()).collect();

        let mut child = KeyReplay::for_root(root, 5, &config, &registry, &dialect).unwrap();
        for i in 0..20_u64 {
            let value = child.value_at(i).unwrap();
            assert_eq!(value, parent_values[(i % 5) as usize], "row {i}");
        }
    }

    #[test]
    fn repeated_index_returns_the_cached_value() {
        let config = FillConfig::default();
        let registry = GeneratorRegistry::new();
        let dialect = Dialect::postgres();
        let database = chained_database();
        let table = database.table("c").unwrap();
        let root = RootColumn {
            table,
            column: table.column("id").unwrap(),
        };

        let mut replay = KeyReplay::for_root(root, 3, &config, &registry, &dialect).unwrap();
        let first = replay.value_at(0).unwrap();
        assert_eq!(replay.value_at(0).unwrap(), first);
        assert_eq!(replay.value_at(3).unwrap(), first);
    }
}
