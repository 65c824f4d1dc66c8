//! Row-by-row value production for one table.
//!
//! Per column, highest precedence first: a configured override, then
//! foreign-key replay against the resolved root stream, then the column's
//! own seeded stream with the type-dispatched generator. Auto-increment
//! columns drop out of the insert entirely unless configured in or
//! referenced by a foreign key (a skipped parent key would leave children
//! pointing at values the database invents on its own).

use std::collections::BTreeMap;

use rowforge_core::{Column, Database, KeyStream, Table};

use crate::batch::{InsertColumn, InsertStatement};
use crate::config::FillConfig;
use crate::errors::FillError;
use crate::generators::BoxedGenerator;
use crate::registry::{Dialect, GeneratorRegistry};
use crate::resolver::{KeyReplay, key_source, resolve_root};
use crate::value::Value;

/// Everything a table fill needs from its surroundings.
pub struct TableFillParams<'a> {
    pub database: &'a Database,
    pub table: &'a Table,
    pub rows: u64,
    /// Effective row counts for every planned table, used as foreign-key
    /// moduli.
    pub row_counts: &'a BTreeMap<String, u64>,
    pub config: &'a FillConfig,
    pub registry: &'a GeneratorRegistry,
    pub dialect: &'a Dialect,
}

#[derive(Debug)]
enum ColumnSource {
    /// Configured override; wins over everything.
    Override {
        generator: BoxedGenerator,
        stream: KeyStream,
    },
    /// Foreign key into another table's root stream.
    Foreign { replay: KeyReplay },
    /// Foreign key into this table's own key stream. Row 0 takes NULL when
    /// the column allows it (the row-0 value otherwise, a reference to the
    /// row itself); row i takes the value at index i-1, which is always
    /// already materialized.
    SelfReferencing { replay: KeyReplay, nullable: bool },
    /// Type-dispatched generator on the column's own stream.
    Typed {
        generator: BoxedGenerator,
        stream: KeyStream,
    },
}

impl ColumnSource {
    fn value(&mut self, row: u64) -> Result<Value, FillError> {
        match self {
            ColumnSource::Override { generator, stream }
            | ColumnSource::Typed { generator, stream } => {
                let generator = &mut *generator;
                Ok(stream.draw(|rng| generator.generate(rng)))
            }
            ColumnSource::Foreign { replay } => replay.value_at(row),
            ColumnSource::SelfReferencing { replay, nullable } => {
                if row == 0 {
                    if *nullable {
                        return Ok(Value::Null);
                    }
                    return replay.value_at(0);
                }
                replay.value_at(row - 1)
            }
        }
    }
}

/// Drives generation for one table, producing rows strictly in index order.
#[derive(Debug)]
pub struct TableFiller {
    statement: InsertStatement,
    sources: Vec<ColumnSource>,
    rows: u64,
    next_row: u64,
}

impl TableFiller {
    pub fn new(params: TableFillParams<'_>) -> Result<Self, FillError> {
        let TableFillParams {
            database,
            table,
            rows,
            row_counts,
            config,
            registry,
            dialect,
        } = params;

        // Overrides must name real columns before anything is generated.
        if let Some(table_config) = config.table(table.name()) {
            for name in table_config.columns.keys() {
                if table.column(name).is_none() {
                    return Err(FillError::ColumnNotFound {
                        table: table.name().to_string(),
                        column: name.clone(),
                    });
                }
            }
        }

        let mut sources = Vec::new();
        let mut insert_columns = Vec::new();

        for column in table.columns() {
            let source = column_source(database, table, column, row_counts, config, registry, dialect)?;
            let Some(source) = source else {
                continue;
            };
            insert_columns.push(InsertColumn {
                name: column.name().to_string(),
                type_tag: column.type_tag,
            });
            sources.push(source);
        }

        let statement = insert_statement(table.name(), &insert_columns, dialect);
        Ok(Self {
            statement,
            sources,
            rows,
            next_row: 0,
        })
    }

    pub fn statement(&self) -> &InsertStatement {
        &self.statement
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Produce the next row, or `None` once the target count is reached.
    pub fn next_row(&mut self) -> Result<Option<Vec<Value>>, FillError> {
        if self.next_row >= self.rows {
            return Ok(None);
        }
        let row = self.next_row;
        let mut values = Vec::with_capacity(self.sources.len());
        for source in &mut self.sources {
            values.push(source.value(row)?);
        }
        self.next_row += 1;
        Ok(Some(values))
    }
}

fn column_source(
    database: &Database,
    table: &Table,
    column: &Column,
    row_counts: &BTreeMap<String, u64>,
    config: &FillConfig,
    registry: &GeneratorRegistry,
    dialect: &Dialect,
) -> Result<Option<ColumnSource>, FillError> {
    let seed = column.id().seed() ^ config.seed;

    if let Some(spec) = config.override_for(table.name(), column.name()) {
        return Ok(Some(ColumnSource::Override {
            generator: spec.instantiate()?,
            stream: KeyStream::new(seed),
        }));
    }

    if let Some(root) = resolve_root(database, table, column.name())? {
        let parent = root.table.name().to_lowercase();
        let parent_rows = row_counts.get(&parent).copied().ok_or_else(|| {
            FillError::InvalidConfig(format!(
                "table '{}' references '{parent}', which is not planned for filling",
                table.name()
            ))
        })?;
        let replay = KeyReplay::for_root(root, parent_rows, config, registry, dialect)?;
        if parent == table.name().to_lowercase() {
            return Ok(Some(ColumnSource::SelfReferencing {
                replay,
                nullable: column.nullable,
            }));
        }
        return Ok(Some(ColumnSource::Foreign { replay }));
    }

    if column.auto_increment
        && !config.include_auto_increment(table.name())
        && !is_referenced(database, table, column)
    {
        return Ok(None);
    }

    // Key columns and plain columns both draw from the column's own stream;
    // key_source keeps the choice of algorithm identical to what replaying
    // children assume.
    let source = if table.is_primary_key_column(column.name()) || column.auto_increment {
        key_source(column, config, registry, dialect)?.instantiate()?
    } else {
        registry.resolve(column, dialect)?
    };
    Ok(Some(ColumnSource::Typed {
        generator: source,
        stream: KeyStream::new(seed),
    }))
}

/// Whether any foreign key in the schema points at this column.
fn is_referenced(database: &Database, table: &Table, column: &Column) -> bool {
    let table_name = table.name().to_lowercase();
    database.tables().iter().any(|child| {
        child.foreign_keys().iter().any(|fk| {
            fk.references().table() == table_name
                && fk
                    .references()
                    .columns()
                    .iter()
                    .any(|key_column| key_column.column().name() == column.name())
        })
    })
}

fn insert_statement(table: &str, columns: &[InsertColumn], dialect: &Dialect) -> InsertStatement {
    let names: Vec<&str> = columns.iter().map(|column| column.name.as_str()).collect();
    let placeholders: Vec<String> = (1..=columns.len())
        .map(|index| dialect.placeholder(index))
        .collect();
    InsertStatement {
        table: table.to_string(),
        sql: format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            names.join(", "),
            placeholders.join(", ")
        ),
        columns: columns.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeneratorSpec, TableFillConfig};
    use rowforge_core::{ColumnId, ForeignKey, KeyColumn, PrimaryKey, TypeTag};

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

    fn params<'a>(
        database: &'a Database,
        table: &'a Table,
        rows: u64,
        row_counts: &'a BTreeMap<String, u64>,
        config: &'a FillConfig,
        registry: &'a GeneratorRegistry,
        dialect: &'a Dialect,
    ) -> TableFillParams<'a> {
        TableFillParams {
            database,
            table,
            rows,
            row_counts,
            config,
            registry,
            dialect,
        }
    }

    fn single_table_database() -> Database {
        let table = Table::new(
            "items",
            vec![
                column("items", "id", 1),
                column("items", "price", 2),
                column("items", "name", 3),
            ],
            Some(pk("items", "id")),
            Vec::new(),
        )
        .unwrap();
        Database::new("bench", "public", vec![table]).unwrap()
    }

    #[test]
    fn statement_covers_columns_in_declaration_order() {
        let database = single_table_database();
        let table = database.table("items").unwrap();
        let config = FillConfig::default();
        let registry = GeneratorRegistry::new();
        let dialect = Dialect::postgres();
        let row_counts = BTreeMap::from([("items".to_string(), 5_u64)]);

        let filler = TableFiller::new(params(
            &database, table, 5, &row_counts, &config, &registry, &dialect,
        ))
        .unwrap();
        assert_eq!(
            filler.statement().sql,
            "INSERT INTO items (id, price, name) VALUES ($1, $2, $3)"
        );
    }

    #[test]
    fn fills_are_deterministic() {
        let database = single_table_database();
        let table = database.table("items").unwrap();
        let config = FillConfig::default();
        let registry = GeneratorRegistry::new();
        let dialect = Dialect::postgres();
        let row_counts = BTreeMap::from([("items".to_string(), 10_u64)]);

        let mut collect = || -> Vec<Vec<Value>> {
            let mut filler = TableFiller::new(params(
                &database, table, 10, &row_counts, &config, &registry, &dialect,
            ))
            .unwrap();
            let mut rows = Vec::new();
            while let Some(row) = filler.next_row().unwrap() {
                rows.push(row);
            }
            rows
        };

        assert_eq!(collect(), collect());
    }

    #[test]
    fn override_wins_over_type_dispatch() {
        let database = single_table_database();
        let table = database.table("items").unwrap();
        let registry = GeneratorRegistry::new();
        let dialect = Dialect::postgres();
        let row_counts = BTreeMap::from([("items".to_string(), 3_u64)]);

        let mut config = FillConfig::default();
        config.tables.insert(
            "items".to_string(),
            TableFillConfig {
                rows: 3,
                batch_size: None,
                columns: BTreeMap::from([(
                    "price".to_string(),
                    GeneratorSpec::FixedInt { value: 42 },
                )]),
                include_auto_increment: false,
            },
        );

        let mut filler = TableFiller::new(params(
            &database, table, 3, &row_counts, &config, &registry, &dialect,
        ))
        .unwrap();
        while let Some(row) = filler.next_row().unwrap() {
            assert_eq!(row[1], Value::Int(42));
        }
    }

    #[test]
    fn override_on_missing_column_is_rejected() {
        let database = single_table_database();
        let table = database.table("items").unwrap();
        let registry = GeneratorRegistry::new();
        let dialect = Dialect::postgres();
        let row_counts = BTreeMap::from([("items".to_string(), 3_u64)]);

        let mut config = FillConfig::default();
        config.tables.insert(
            "items".to_string(),
            TableFillConfig {
                rows: 3,
                batch_size: None,
                columns: BTreeMap::from([(
                    "ghost".to_string(),
                    GeneratorSpec::FixedInt { value: 1 },
                )]),
                include_auto_increment: false,
            },
        );

        let err = TableFiller::new(params(
            &database, table, 3, &row_counts, &config, &registry, &dialect,
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            FillError::ColumnNotFound { ref column, .. } if column == "ghost"
        ));
    }

    #[test]
    fn auto_increment_columns_are_skipped_by_default() {
        let id = column("events", "id", 1).auto_increment().not_null();
        let table = Table::new(
            "events",
            vec![id, column("events", "kind", 2)],
            Some(PrimaryKey::new(
                "events",
                vec![KeyColumn::new(column("events", "id", 1), 1)],
            )),
            Vec::new(),
        )
        .unwrap();
        let database = Database::new("bench", "public", vec![table]).unwrap();
        let table = database.table("events").unwrap();
        let config = FillConfig::default();
        let registry = GeneratorRegistry::new();
        let dialect = Dialect::postgres();
        let row_counts = BTreeMap::from([("events".to_string(), 2_u64)]);

        let filler = TableFiller::new(params(
            &database, table, 2, &row_counts, &config, &registry, &dialect,
        ))
        .unwrap();
        assert_eq!(filler.statement().sql, "INSERT INTO events (kind) VALUES ($1)");
    }

    #[test]
    fn referenced_auto_increment_keys_are_filled_sequentially() {
        let id = column("accounts", "id", 1).auto_increment().not_null();
        let accounts = Table::new(
            "accounts",
            vec![id, column("accounts", "label", 2)],
            Some(PrimaryKey::new(
                "accounts",
                vec![KeyColumn::new(
                    column("accounts", "id", 1).auto_increment(),
                    1,
                )],
            )),
            Vec::new(),
        )
        .unwrap();
        let moves_fk = ForeignKey::new(
            vec![KeyColumn::new(column("moves", "account_id", 2), 1)],
            PrimaryKey::new(
                "accounts",
                vec![KeyColumn::new(
                    column("accounts", "id", 1).auto_increment(),
                    1,
                )],
            ),
        );
        let moves = Table::new(
            "moves",
            vec![column("moves", "id", 1), column("moves", "account_id", 2)],
            Some(pk("moves", "id")),
            vec![moves_fk],
        )
        .unwrap();
        let database = Database::new("bench", "public", vec![accounts, moves]).unwrap();

        let config = FillConfig::default();
        let registry = GeneratorRegistry::new();
        let dialect = Dialect::postgres();
        let row_counts = BTreeMap::from([
            ("accounts".to_string(), 3_u64),
            ("moves".to_string(), 6_u64),
        ]);

        let accounts_table = database.table("accounts").unwrap();
        let mut filler = TableFiller::new(params(
            &database,
            accounts_table,
            3,
            &row_counts,
            &config,
            &registry,
            &dialect,
        ))
        .unwrap();
        // Referenced, so the key stays in the insert and counts up.
        assert!(filler.statement().sql.starts_with("INSERT INTO accounts (id, label)"));
        let mut ids = Vec::new();
        while let Some(row) = filler.next_row().unwrap() {
            ids.push(row[0].clone());
        }
        assert_eq!(ids, [Value::Int(1), Value::Int(2), Value::Int(3)]);

        let moves_table = database.table("moves").unwrap();
        let mut filler = TableFiller::new(params(
            &database,
            moves_table,
            6,
            &row_counts,
            &config,
            &registry,
            &dialect,
        ))
        .unwrap();
        let mut refs = Vec::new();
        while let Some(row) = filler.next_row().unwrap() {
            refs.push(row[1].clone());
        }
        assert_eq!(
            refs,
            [
                Value::Int(1),
                Value::Int(2),
                Value::Int(3),
                Value::Int(1),
                Value::Int(2),
                Value::Int(3)
            ]
        );
    }

    #[test]
    fn self_reference_null_first_then_prior_rows() {
        let manager = column("employee", "manager_id", 2);
        let self_fk = ForeignKey::new(
            vec![KeyColumn::new(manager.clone(), 1)],
            pk("employee", "id"),
        );
        let table = Table::new(
            "employee",
            vec![column("employee", "id", 1), manager],
            Some(pk("employee", "id")),
            vec![self_fk],
        )
        .unwrap();
        let database = Database::new("bench", "public", vec![table]).unwrap();
        let table = database.table("employee").unwrap();
        let config = FillConfig::default();
        let registry = GeneratorRegistry::new();
        let dialect = Dialect::postgres();
        let row_counts = BTreeMap::from([("employee".to_string(), 4_u64)]);

        let mut filler = TableFiller::new(params(
            &database, table, 4, &row_counts, &config, &registry, &dialect,
        ))
        .unwrap();
        let mut rows = Vec::new();
        while let Some(row) = filler.next_row().unwrap() {
            rows.push(row);
        }

        assert_eq!(rows[0][1], Value::Null);
        // Row i references the id generated at row i-1.
        for i in 1..4 {
            assert_eq!(rows[i][1], rows[i - 1][0], "row {i}");
        }
    }
}
